//! Shared request middleware.

use tower_http::cors::{Any, CorsLayer};

/// Browser webcam clients connect from arbitrary origins.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
