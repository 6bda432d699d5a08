use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    response::Response,
    routing::{get, post},
    serve::Serve,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{Span, field, info, info_span};
use uuid::Uuid;

use crate::{
    configuration::{ApplicationSettings, Settings},
    email_client::{MailDelivery, build_mail_delivery},
    routes::{contact, health_check},
};

pub struct AppState {
    pub mailer: Box<dyn MailDelivery>,
    pub expose_error_details: bool,
}

/// Wire the routes around an already constructed mail client.
///
/// The frontend and CORS setup are decided here, once, from `application`.
pub fn run(
    listener: TcpListener,
    mailer: Box<dyn MailDelivery>,
    application: &ApplicationSettings,
) -> anyhow::Result<Serve<TcpListener, Router, Router>> {
    // Arc so handlers share one mail client instead of cloning it per request.
    let app_state = Arc::new(AppState {
        mailer,
        expose_error_details: application.expose_error_details,
    });

    let mut app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/contact", post(contact))
        .with_state(app_state);

    if application.serve_frontend {
        let frontend_dir = Path::new(&application.frontend_dir);
        // unknown paths get the single page so client-side links keep working
        app = app.fallback_service(
            ServeDir::new(frontend_dir).fallback(ServeFile::new(frontend_dir.join("index.html"))),
        );
    }

    let app = app
        .layer(cors_layer(&application.allowed_origins)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = Uuid::new_v4();
                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        request_id = ?request_id,
                        status = field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    let status = response.status();
                    span.record("status", status.as_u16());
                    info!(parent: span, ?status, ?latency, "Response sent");
                }),
        );

    Ok(axum::serve(listener, app))
}

fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let mailer = build_mail_delivery(configuration.email_client).await?;

        let listener = TcpListener::bind(format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        ))
        .await?;
        let port = listener.local_addr()?.port();

        let server = run(listener, mailer, &configuration.application)?;

        Ok(Self { server, port })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        Ok(self.server.await?)
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
