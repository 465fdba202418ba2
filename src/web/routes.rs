use crate::state::AppState;
use axum::{routing::get, Router};

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Streaming endpoint
        .route("/ws", get(super::handlers::ws::ws_handler))

        // Health check
        .route("/health", get(super::handlers::health::health_check))

        .with_state(state)
}
