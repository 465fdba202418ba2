//! Health check endpoint

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let active_sessions = state.sessions.read().await.len();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "signstream",
            "version": env!("CARGO_PKG_VERSION"),
            "labels": state.classifier.labels().len(),
            "active_sessions": active_sessions,
            "metrics": state.metrics.snapshot(),
        })),
    )
}
