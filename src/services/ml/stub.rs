//! Deterministic classifier used when no trained model is available.

use super::service::SignClassifier;
use crate::types::FeatureVector;
use anyhow::Result;

const STUB_LABELS: &[&str] = &["hello", "thanks", "yes", "no", "please"];

/// Buckets the window's total activation into a fixed vocabulary. Purely a
/// function of the window, so windowing, smoothing, and emission behave
/// exactly as they would with a trained model.
pub struct StubClassifier {
    labels: Vec<String>,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self {
            labels: STUB_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignClassifier for StubClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, window: &[FeatureVector]) -> Result<String> {
        let sum: f32 = window
            .iter()
            .flat_map(|features| features.as_slice())
            .map(|v| v.abs())
            .sum();
        let bucket = (sum * 1000.0) as usize % self.labels.len();
        Ok(self.labels[bucket].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_a_given_window() {
        let classifier = StubClassifier::new();
        let mut features = FeatureVector::zeroed();
        features.0[5] = 0.123;
        let window = vec![features; 80];
        assert_eq!(
            classifier.classify(&window).unwrap(),
            classifier.classify(&window).unwrap()
        );
    }

    #[test]
    fn blank_window_maps_to_first_label() {
        let classifier = StubClassifier::new();
        let window = vec![FeatureVector::zeroed(); 80];
        assert_eq!(classifier.classify(&window).unwrap(), "hello");
    }

    #[test]
    fn vocabulary_is_closed_and_nonempty() {
        let classifier = StubClassifier::new();
        assert!(!classifier.labels().is_empty());
    }
}
