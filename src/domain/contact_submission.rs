use std::borrow::Cow;

use super::ReceivedAt;

/// A contact form submission whose required fields are all present.
#[derive(Debug)]
pub struct ContactSubmission {
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Name, email, and message are required fields")]
pub struct MissingRequiredFields;

impl ContactSubmission {
    /// Empty strings count as missing. Whitespace-only values are kept and
    /// the email address is not checked for format.
    pub fn parse(
        name: Option<String>,
        email: Option<String>,
        subject: Option<String>,
        message: Option<String>,
    ) -> Result<Self, MissingRequiredFields> {
        let (Some(name), Some(email), Some(message)) =
            (non_empty(name), non_empty(email), non_empty(message))
        else {
            return Err(MissingRequiredFields);
        };

        Ok(Self {
            name,
            email,
            subject: non_empty(subject),
            message,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn subject_or_default(&self) -> Cow<'_, str> {
        match &self.subject {
            Some(subject) => Cow::Borrowed(subject),
            None => Cow::Owned(format!("Message from {}", self.name)),
        }
    }

    pub fn compose_subject(&self, received_at: &ReceivedAt) -> String {
        format!(
            "Portfolio Contact - {} [{}]",
            self.subject_or_default(),
            received_at
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
