//! Client side of the contact form.
//!
//! Mirrors what `frontend/scripts/main.js` does in the browser: check the
//! required fields, mark the submit button busy while the request is in
//! flight, restore it however the request ends, and only clear the form once
//! the message went out.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

pub const BUSY_LABEL: &str = "Sending...";
pub const SENT: &str = "Message sent successfully!";
const LOCAL_BACKEND: &str = "http://localhost:3000";
const REJECTED_FALLBACK: &str = "Failed to send message. Please try again.";

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn has_required_fields(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty() && !self.message.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub label: String,
    pub disabled: bool,
}

impl SubmitButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
        }
    }
}

/// Holds the button in its busy state until dropped.
struct BusyGuard<'a> {
    button: &'a mut SubmitButton,
    original_label: String,
}

impl<'a> BusyGuard<'a> {
    fn engage(button: &'a mut SubmitButton) -> Self {
        let original_label = std::mem::replace(&mut button.label, BUSY_LABEL.into());
        button.disabled = true;
        Self {
            button,
            original_label,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.button.label = std::mem::take(&mut self.original_label);
        self.button.disabled = false;
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("Please fill in all required fields.")]
    MissingFields,
    #[error("{0}")]
    Rejected(String),
    #[error("Network error. Please check your connection and try again.")]
    Network(#[source] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorReply {
    error: Option<String>,
}

pub struct FormClient {
    http_client: Client,
    base_url: String,
}

impl FormClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }

    /// Pages served from `localhost` talk to the local backend, everything
    /// else posts back to the origin it was loaded from.
    pub fn for_page(page_url: &Url) -> Self {
        let base_url = if page_url.host_str() == Some("localhost") {
            LOCAL_BACKEND.to_string()
        } else {
            page_url.origin().ascii_serialization()
        };
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(name = "Submitting the contact form", skip(self, form, button))]
    pub async fn submit(
        &self,
        form: &mut ContactForm,
        button: &mut SubmitButton,
    ) -> Result<&'static str, FormError> {
        if !form.has_required_fields() {
            return Err(FormError::MissingFields);
        }

        let _busy = BusyGuard::engage(button);

        let response = self
            .http_client
            .post(format!("{}/api/contact", self.base_url))
            .json(&*form)
            .send()
            .await
            .map_err(FormError::Network)?;

        if response.status().is_success() {
            form.clear();
            return Ok(SENT);
        }

        let error = response
            .json::<ErrorReply>()
            .await
            .ok()
            .and_then(|reply| reply.error)
            .unwrap_or_else(|| REJECTED_FALLBACK.to_string());
        tracing::warn!(%error, "Contact form submission was rejected");
        Err(FormError::Rejected(error))
    }
}
