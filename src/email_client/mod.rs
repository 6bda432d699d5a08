//! Outbound delivery of contact emails.
//!
//! The handler only sees [`MailDelivery`]; which provider sits behind it is
//! decided once at startup by [`build_mail_delivery`].

mod brevo;
mod smtp;

pub use brevo::BrevoClient;
pub use smtp::SmtpRelay;

use async_trait::async_trait;
use lettre::message::Mailbox;

use crate::configuration::{EmailClientSettings, Transport};

/// A rendered contact email, ready to hand to a provider.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub submitter_name: String,
    pub submitter_email: String,
    pub subject: String,
    pub html_body: String,
}

/// What the provider told us about an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderReceipt {
    pub message_id: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("couldn't reach the email provider, reqwest error {0}")]
    Request(#[from] reqwest::Error),
    #[error("the email provider rejected the message with status {status}")]
    Rejected {
        status: u16,
        body: serde_json::Value,
    },
    #[error("invalid mailbox, {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("couldn't build the email message, {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp relay error {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl ProviderError {
    /// Diagnostic payload that is safe to hand back to a caller.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ProviderError::Rejected { status, body } => Some(serde_json::json!({
                "status": status,
                "body": body,
            })),
            _ => None,
        }
    }
}

#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<ProviderReceipt, ProviderError>;
}

/// SMTP relays get a connection check here; an unreachable relay is logged
/// and does not stop startup.
pub async fn build_mail_delivery(
    settings: EmailClientSettings,
) -> anyhow::Result<Box<dyn MailDelivery>> {
    let timeout = settings.timeout();
    match settings.transport {
        Transport::Brevo => {
            let client = BrevoClient::new(
                settings.brevo.base_url,
                settings.sender_email,
                settings.sender_name,
                settings.recipient,
                settings.brevo.api_key,
                timeout,
            )?;
            Ok(Box::new(client))
        }
        Transport::Smtp => {
            let sender = Mailbox::new(Some(settings.sender_name), settings.sender_email.parse()?);
            let recipient: Mailbox = settings.recipient.parse()?;
            let relay = SmtpRelay::new(&settings.smtp, sender, recipient, timeout)?;
            relay.verify_connection().await;
            Ok(Box::new(relay))
        }
    }
}
