//! Classifier boundary and startup loading.

use super::lstm::LstmClassifier;
use super::stub::StubClassifier;
use crate::config::Config;
use crate::types::FeatureVector;
use anyhow::Result;
use std::sync::Arc;

/// Sequence classifier over a full feature window.
///
/// `classify` receives the window in chronological order, must not mutate
/// it, and is deterministic for a given window (inference only, no
/// sampling). The vocabulary is closed and fixed at load time.
pub trait SignClassifier: Send + Sync {
    fn labels(&self) -> &[String];

    fn classify(&self, window: &[FeatureVector]) -> Result<String>;
}

/// Load the trained model, falling back to the stub classifier when the
/// model is unavailable so the server still comes up.
pub fn load_classifier(config: &Config) -> Arc<dyn SignClassifier> {
    match LstmClassifier::load(
        &config.model_path,
        &config.labels_path,
        config.to_candle_device(),
    ) {
        Ok(classifier) => {
            tracing::info!(
                "✅ model loaded: {} labels from {}",
                classifier.labels().len(),
                config.model_path
            );
            Arc::new(classifier)
        }
        Err(e) => {
            tracing::error!("⚠️ model loading failed: {e:#}");
            tracing::info!("serving with stub classifier; predictions are placeholders");
            Arc::new(StubClassifier::new())
        }
    }
}
