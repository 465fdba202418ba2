use anyhow::Result;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod services;
mod state;
mod types;
mod vision;
mod web;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signstream=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting signstream server");

    // Load configuration
    let config = config::Config::from_env()?;

    // Build application state; the classifier loads here, with a stub
    // fallback when the model is missing
    let app_state = state::AppState::new(config);

    // Reap idle sessions in the background
    spawn_session_reaper(app_state.clone());

    // Start web server
    web::start_server(app_state).await?;

    Ok(())
}

/// Periodically drop sessions idle past the configured timeout. A timeout
/// of zero keeps every session for the process lifetime.
fn spawn_session_reaper(state: state::AppState) {
    let idle_secs = state.config.session_idle_secs;
    if idle_secs == 0 {
        tracing::info!("session reaping disabled; sessions live for the process lifetime");
        return;
    }
    let max_idle = chrono::Duration::seconds(idle_secs as i64);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            let evicted = state.sessions.write().await.evict_idle(max_idle);
            if evicted > 0 {
                tracing::info!("evicted {evicted} idle session(s)");
            }
        }
    });
}
