//! Failure taxonomy for single-frame processing.
//!
//! Every variant is scoped to one inbound unit: the dispatcher logs it,
//! counts it, and moves on to the next unit. None of these close the
//! connection or touch the session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("undecodable image payload: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("hand tracking failed: {0}")]
    Tracking(anyhow::Error),

    #[error("classifier failed: {0}")]
    ClassifierFailed(anyhow::Error),

    #[error("classifier timed out after {0}ms")]
    ClassifierTimeout(u64),
}

impl PipelineError {
    /// Whether the failure happened at the classifier step (as opposed to
    /// payload decode or tracking).
    pub fn is_classifier_failure(&self) -> bool {
        matches!(
            self,
            Self::ClassifierFailed(_) | Self::ClassifierTimeout(_)
        )
    }
}
