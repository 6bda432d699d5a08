use rinja_axum::Template;

use super::{ContactSubmission, ReceivedAt};

#[derive(Template)]
#[template(path = "contact_email.html")]
struct ContactEmailTemplate<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message_lines: Vec<&'a str>,
    received_at: String,
}

/// The subject line and HTML body relayed to the site owner.
#[derive(Debug)]
pub struct ContactEmail {
    pub subject: String,
    pub html_body: String,
}

impl ContactEmail {
    pub fn render(
        submission: &ContactSubmission,
        received_at: &ReceivedAt,
    ) -> anyhow::Result<Self> {
        let html_body = ContactEmailTemplate {
            name: submission.name(),
            email: submission.email(),
            subject: submission.subject().unwrap_or("Not specified"),
            // joined with <br> in the template so every line is still escaped
            message_lines: submission.message().split('\n').collect(),
            received_at: received_at.to_string(),
        }
        .render()?;

        Ok(Self {
            subject: submission.compose_subject(received_at),
            html_body,
        })
    }
}
