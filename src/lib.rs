// Core modules
pub mod config;
pub mod services;
pub mod state;
pub mod types;
pub mod vision;
pub mod web;

// Re-exports
pub use config::Config;
pub use services::ml::SignClassifier;
pub use services::session::SessionManager;
pub use state::AppState;
