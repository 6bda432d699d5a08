use axum::{Json, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthStatus {
    pub message: &'static str,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthStatus {
        message: "Server is running!",
    })
}
