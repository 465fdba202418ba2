use crate::config::Config;
use crate::services::ml::{self, SignClassifier};
use crate::services::{MetricsService, SessionManager};
use crate::vision::{HandTracker, StubTracker};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub classifier: Arc<dyn SignClassifier>,
    pub tracker: Arc<dyn HandTracker>,
    pub sessions: Arc<RwLock<SessionManager>>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        tracing::info!("[STATE] model path: {}", config.model_path);
        tracing::info!("[STATE] labels path: {}", config.labels_path);
        tracing::info!("[STATE] device: {:?}", config.device);

        // Classifier load failure is not fatal; the stub keeps the
        // streaming pipeline exercisable.
        let classifier = ml::load_classifier(&config);

        let sessions = SessionManager::new(
            config.window_size,
            config.history_size,
            config.min_history,
        );

        Self {
            config: Arc::new(config),
            classifier,
            tracker: Arc::new(StubTracker),
            sessions: Arc::new(RwLock::new(sessions)),
            metrics: Arc::new(MetricsService::new()),
        }
    }

    /// Swap in a real landmark detector behind the tracker seam.
    pub fn with_tracker(mut self, tracker: Arc<dyn HandTracker>) -> Self {
        self.tracker = tracker;
        self
    }
}
