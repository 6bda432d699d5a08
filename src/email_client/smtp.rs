use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;

use super::{MailDelivery, OutgoingEmail, ProviderError, ProviderReceipt};
use crate::configuration::SmtpSettings;

const MESSAGE_ID: &str = "Message-ID";

/// Relays contact emails through an authenticated SMTPS server.
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl SmtpRelay {
    pub fn new(
        settings: &SmtpSettings,
        sender: Mailbox,
        recipient: Mailbox,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let credentials = Credentials::new(
            settings.username.clone(),
            settings.password.expose_secret().to_owned(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .port(settings.port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        tracing::info!(
            smtp_host = %settings.host,
            smtp_port = settings.port,
            recipient = %recipient,
            "SMTP relay initialized"
        );

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    /// Checks that the relay accepts connections. A failure is logged and the
    /// relay stays usable, so the server keeps running without it.
    pub async fn verify_connection(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(true) => {
                tracing::info!("Server is ready to take messages");
                true
            }
            Ok(false) => {
                tracing::error!("SMTP relay did not answer the connection check");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "SMTP relay connection check failed");
                false
            }
        }
    }

    /// The message is sent from the submitter when their address is a valid
    /// mailbox, otherwise from the configured sender.
    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, ProviderError> {
        let from = match email.submitter_email.parse::<Address>() {
            Ok(address) => Mailbox::new(Some(email.submitter_name.clone()), address),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Submitter address is not a valid mailbox, sending as the configured sender"
                );
                self.sender.clone()
            }
        };

        Ok(Message::builder()
            .from(from)
            .to(self.recipient.clone())
            .subject(email.subject.as_str())
            .message_id(None)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())?)
    }
}

#[async_trait]
impl MailDelivery for SmtpRelay {
    #[tracing::instrument(
        name = "Sending an email through the SMTP relay",
        skip(self, email),
        fields(subject = %email.subject)
    )]
    async fn send(&self, email: &OutgoingEmail) -> Result<ProviderReceipt, ProviderError> {
        let message = self.build_message(email)?;
        let message_id = message.headers().get_raw(MESSAGE_ID).map(str::to_owned);
        self.transport.send(message).await?;

        Ok(ProviderReceipt { message_id })
    }
}
