// src/handlers/health.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Lightweight liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
