use std::time::Duration;

use portfolio_contact::routes::ContactFormData;
use reqwest::StatusCode;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{any, method, path},
};

use crate::helpers::{RecordingMailer, spawn_app, spawn_app_with, spawn_app_with_mailer};

fn form(name: &str, email: &str, subject: Option<&str>, message: &str) -> ContactFormData {
    ContactFormData {
        name: Some(name.into()),
        email: Some(email.into()),
        subject: subject.map(String::from),
        message: Some(message.into()),
    }
}

#[tokio::test]
async fn contact_returns_a_200_for_valid_form_data() {
    // Arrange
    let app = spawn_app().await;
    let body = form("Ada", "ada@example.com", Some("Engines"), "Hello");

    Mock::given(path("/v3/smtp/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reply["message"], "Message sent successfully!");
}

#[tokio::test]
async fn contact_relays_a_submission_without_subject_under_a_default_subject() {
    // Arrange
    let app = spawn_app().await;
    let body = serde_json::json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "Hello\nWorld",
    });

    Mock::given(path("/v3/smtp/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reply["message"], "Message sent successfully!");

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let sent = app.sent_email(email_request);
    assert!(
        sent.subject
            .starts_with("Portfolio Contact - Message from Ada ["),
        "unexpected subject {}",
        sent.subject
    );
    assert!(sent.subject.ends_with(']'));
    assert!(sent.html_content.contains("Hello<br>World"));
    assert!(sent.html_content.contains("Not specified"));
    assert_eq!(sent.sender_name, "Ada via Portfolio Contact");
}

#[tokio::test]
async fn contact_uses_the_supplied_subject() {
    // Arrange
    let app = spawn_app().await;
    let body = form("Ada", "ada@example.com", Some("Analytical engines"), "Hello");

    Mock::given(path("/v3/smtp/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&app.email_server)
        .await;

    // Act
    app.post_contact(&body).await;

    // Assert
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let sent = app.sent_email(email_request);
    assert!(
        sent.subject
            .starts_with("Portfolio Contact - Analytical engines [")
    );
}

#[tokio::test]
async fn contact_returns_the_provider_message_id() {
    // Arrange
    let app = spawn_app().await;
    let body = form("Ada", "ada@example.com", None, "Hello");

    Mock::given(path("/v3/smtp/email"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "messageId": "<42@brevo>" })),
        )
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reply["messageId"], "<42@brevo>");
}

#[tokio::test]
async fn contact_returns_a_400_when_required_fields_are_missing() {
    // Arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({ "email": "ada@example.com", "message": "Hello" }),
            "missing name",
        ),
        (
            serde_json::json!({ "name": "Ada", "message": "Hello" }),
            "missing email",
        ),
        (
            serde_json::json!({ "name": "Ada", "email": "ada@example.com", "subject": "Hi" }),
            "missing message",
        ),
        (
            serde_json::json!({ "name": "", "email": "ada@example.com", "message": "Hello" }),
            "empty name",
        ),
        (
            serde_json::json!({ "name": "Ada", "email": "", "message": "Hello" }),
            "empty email",
        ),
        (
            serde_json::json!({ "name": "Ada", "email": "ada@example.com", "message": "" }),
            "empty message",
        ),
        (
            serde_json::json!({ "name": null, "email": "ada@example.com", "message": "Hello" }),
            "null name",
        ),
        (serde_json::json!({}), "no fields at all"),
    ];

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.email_server)
        .await;

    for (invalid_body, description) in test_cases {
        // Act
        let response = app.post_contact(&invalid_body).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had {}.",
            description
        );
        let reply: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            reply["error"], "Name, email, and message are required fields",
            "Unexpected error body when the payload had {}.",
            description
        );
    }
}

#[tokio::test]
async fn contact_accepts_an_email_that_is_not_well_formed() {
    // Arrange
    let app = spawn_app().await;
    let body = form("Ada", "not-an-email-address", None, "Hello");

    Mock::given(path("/v3/smtp/email"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn contact_rejects_a_body_that_is_not_json_with_a_json_error() {
    // Arrange
    let app = spawn_app().await;
    let test_cases = vec![
        ("{ definitely not json", "a syntax error"),
        (r#"{"name": 42, "email": "ada@example.com", "message": "Hello"}"#, "a number for a name"),
    ];

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.email_server)
        .await;

    for (invalid_body, description) in test_cases {
        // Act
        let response = app
            .post_contact_raw(Some("application/json"), invalid_body)
            .await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the body had {}.",
            description
        );
        let reply: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            reply["error"], "The request body could not be read as a contact form",
            "Unexpected error body when the body had {}.",
            description
        );
    }
}

#[tokio::test]
async fn contact_accepts_a_urlencoded_form() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(path("/v3/smtp/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app
        .post_contact_raw(
            Some("application/x-www-form-urlencoded"),
            "name=Ada&email=ada%40example.com&subject=Engines&message=Hello%0AWorld",
        )
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let sent = app.sent_email(email_request);
    assert!(sent.subject.starts_with("Portfolio Contact - Engines ["));
    assert!(sent.html_content.contains("Hello<br>World"));
}

#[tokio::test]
async fn contact_without_a_content_type_is_missing_required_fields() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app
        .post_contact_raw(None, "name=Ada&email=ada%40example.com&message=Hello")
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reply["error"], "Name, email, and message are required fields");
}

#[tokio::test]
async fn contact_returns_a_500_when_the_provider_fails() {
    // Arrange
    let app = spawn_app().await;
    let body = form("Ada", "ada@example.com", None, "Hello");

    Mock::given(path("/v3/smtp/email"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let reply = response.text().await.unwrap();
    assert!(reply.contains("An error occurred while sending the message. Please try again later."));
    assert!(!reply.contains("my-secret-api-key"));
}

#[tokio::test]
async fn delivery_failure_details_are_exposed_only_when_enabled() {
    for expose_error_details in [true, false] {
        // Arrange
        let app = spawn_app_with(|c| c.application.expose_error_details = expose_error_details).await;
        let body = form("Ada", "ada@example.com", None, "Hello");

        Mock::given(path("/v3/smtp/email"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "invalid_parameter",
                "message": "sender is invalid",
            })))
            .mount(&app.email_server)
            .await;

        // Act
        let response = app.post_contact(&body).await;

        // Assert
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let reply: serde_json::Value = response.json().await.unwrap();
        if expose_error_details {
            assert_eq!(reply["details"]["status"], 400);
            assert_eq!(reply["details"]["body"]["code"], "invalid_parameter");
        } else {
            assert!(reply.get("details").is_none());
        }
    }
}

#[tokio::test]
async fn contact_returns_a_500_when_the_provider_does_not_answer_in_time() {
    // Arrange
    let app = spawn_app_with(|c| c.email_client.timeout_milliseconds = 200).await;
    let body = form("Ada", "ada@example.com", None, "Hello");

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(10)))
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        reply["error"],
        "An error occurred while sending the message. Please try again later."
    );
}

#[tokio::test]
async fn submissions_reach_an_injected_mail_client() {
    // Arrange
    let mailer = RecordingMailer::default();
    let app = spawn_app_with_mailer(Box::new(mailer.clone())).await;
    let body = form("Ada", "ada@example.com", None, "Hello\nWorld");

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].submitter_name, "Ada");
    assert_eq!(sent[0].submitter_email, "ada@example.com");
    assert!(sent[0].subject.starts_with("Portfolio Contact - Message from Ada ["));
    assert!(sent[0].html_body.contains("Hello<br>World"));
}

#[tokio::test]
async fn invalid_submissions_never_reach_the_mail_client() {
    // Arrange
    let mailer = RecordingMailer::default();
    let app = spawn_app_with_mailer(Box::new(mailer.clone())).await;
    let body = serde_json::json!({ "name": "Ada", "message": "Hello" });

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn a_failing_mail_client_yields_a_500() {
    // Arrange
    let mailer = RecordingMailer::failing();
    let app = spawn_app_with_mailer(Box::new(mailer.clone())).await;
    let body = form("Ada", "ada@example.com", None, "Hello");

    // Act
    let response = app.post_contact(&body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(mailer.sent().len(), 1);
}
