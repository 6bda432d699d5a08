use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{MailDelivery, OutgoingEmail, ProviderError, ProviderReceipt};

/// Brevo transactional email API client.
pub struct BrevoClient {
    http_client: Client,
    base_url: String,
    sender_email: String,
    sender_name: String,
    recipient: String,
    api_key: SecretString,
}

impl BrevoClient {
    pub fn new(
        base_url: String,
        sender_email: String,
        sender_name: String,
        recipient: String,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender_email,
            sender_name,
            recipient,
            api_key,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Serialize)]
struct Contact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    message_id: Option<String>,
}

#[async_trait]
impl MailDelivery for BrevoClient {
    #[tracing::instrument(
        name = "Sending an email through the Brevo API",
        skip(self, email),
        fields(subject = %email.subject)
    )]
    async fn send(&self, email: &OutgoingEmail) -> Result<ProviderReceipt, ProviderError> {
        let url = format!("{}/v3/smtp/email", self.base_url);
        // the account's verified sender, labelled with who filled in the form
        let sender_name = format!("{} via {}", email.submitter_name, self.sender_name);
        let request_body = SendEmailRequest {
            sender: Contact {
                email: &self.sender_email,
                name: Some(&sender_name),
            },
            to: vec![Contact {
                email: &self.recipient,
                name: None,
            }],
            subject: &email.subject,
            html_content: &email.html_body,
        };

        let response = self
            .http_client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::Value::Null);
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent = response
            .json::<SendEmailResponse>()
            .await
            .unwrap_or_default();
        Ok(ProviderReceipt {
            message_id: sent.message_id,
        })
    }
}
