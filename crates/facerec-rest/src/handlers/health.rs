//! Liveness probe.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// `GET /health`: 200 while the process is serving.
///
/// Also reports the size of the last gallery export, which is `null`
/// until this process has exported once.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "gallery_records": state.service.exporter().published_records(),
    }))
}
