use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ContactEmail, ContactSubmission, MissingRequiredFields, ReceivedAt},
    email_client::{OutgoingEmail, ProviderError},
    startup::AppState,
};

const MALFORMED_BODY: &str = "The request body could not be read as a contact form";
const DELIVERY_FAILED: &str =
    "An error occurred while sending the message. Please try again later.";

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ContactFormData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Accepts JSON and urlencoded bodies. A body in any other encoding is
/// read as an empty form so it fails presence validation.
impl<S> FromRequest<S> for ContactFormData
where
    S: Send + Sync,
{
    type Rejection = ContactError;

    #[allow(clippy::manual_async_fn)]
    fn from_request(
        req: Request,
        state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let content_type = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();

            if content_type.starts_with("application/json") {
                let Json(form) = Json::<Self>::from_request(req, state)
                    .await
                    .map_err(|rejection| ContactError::MalformedBody(rejection.body_text()))?;
                Ok(form)
            } else if content_type.starts_with("application/x-www-form-urlencoded") {
                let Form(form) = Form::<Self>::from_request(req, state)
                    .await
                    .map_err(|rejection| ContactError::MalformedBody(rejection.body_text()))?;
                Ok(form)
            } else {
                Ok(Self::default())
            }
        }
    }
}

impl TryFrom<ContactFormData> for ContactSubmission {
    type Error = MissingRequiredFields;

    fn try_from(value: ContactFormData) -> Result<Self, Self::Error> {
        ContactSubmission::parse(value.name, value.email, value.subject, value.message)
    }
}

#[derive(Serialize)]
pub struct ContactSent {
    pub message: &'static str,
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[tracing::instrument(
    name = "Relaying a contact form submission",
    skip(form, app_state),
    fields(
        sender_name = ?form.name,
        sender_email = ?form.email
    )
)]
pub async fn contact(
    State(app_state): State<Arc<AppState>>,
    form: ContactFormData,
) -> Result<Json<ContactSent>, ContactError> {
    tracing::info!("Contact form submission received");
    let submission: ContactSubmission = form.try_into()?;

    let received_at = ReceivedAt::now();
    let email = ContactEmail::render(&submission, &received_at)
        .map_err(|e| ContactError::Render(e.to_string()))?;
    tracing::info!(subject = %email.subject, "Generated email subject");

    let outgoing = OutgoingEmail {
        submitter_name: submission.name().to_owned(),
        submitter_email: submission.email().to_owned(),
        subject: email.subject,
        html_body: email.html_body,
    };

    let receipt = app_state.mailer.send(&outgoing).await.map_err(|source| {
        let details = if app_state.expose_error_details {
            source.details()
        } else {
            None
        };
        ContactError::Delivery { source, details }
    })?;
    tracing::info!(message_id = ?receipt.message_id, "Email sent successfully");

    Ok(Json(ContactSent {
        message: "Message sent successfully!",
        message_id: receipt.message_id,
    }))
}

#[derive(thiserror::Error, Debug)]
pub enum ContactError {
    #[error(transparent)]
    MissingFields(#[from] MissingRequiredFields),
    #[error("malformed contact form body, {0}")]
    MalformedBody(String),
    #[error("couldn't render the contact email, {0}")]
    Render(String),
    #[error("couldn't deliver the contact email, {source}")]
    Delivery {
        source: ProviderError,
        details: Option<serde_json::Value>,
    },
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ContactError::MissingFields(e) => {
                tracing::warn!("Validation failed, {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: e.to_string(),
                        details: None,
                    },
                )
            }
            ContactError::MalformedBody(e) => {
                tracing::warn!("Rejected a malformed body, {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: MALFORMED_BODY.into(),
                        details: None,
                    },
                )
            }
            ContactError::Render(e) => {
                tracing::error!("{}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: DELIVERY_FAILED.into(),
                        details: None,
                    },
                )
            }
            ContactError::Delivery { source, details } => {
                tracing::error!(error = %source, "Error sending email");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: DELIVERY_FAILED.into(),
                        details,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
