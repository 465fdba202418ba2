//! Counters for stream-processing health, surfaced by the health endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

pub struct MetricsService {
    frames_ingested: AtomicUsize,
    decode_failures: AtomicUsize,
    classifier_failures: AtomicUsize,
    inferences_run: AtomicUsize,
    predictions_emitted: AtomicUsize,
    start_time: Instant,
}

impl MetricsService {
    pub fn new() -> Self {
        Self {
            frames_ingested: AtomicUsize::new(0),
            decode_failures: AtomicUsize::new(0),
            classifier_failures: AtomicUsize::new(0),
            inferences_run: AtomicUsize::new(0),
            predictions_emitted: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_frame(&self) {
        self.frames_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classifier_failure(&self) {
        self.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference(&self) {
        self.inferences_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction(&self) {
        self.predictions_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_ingested: self.frames_ingested.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            classifier_failures: self.classifier_failures.load(Ordering::Relaxed),
            inferences_run: self.inferences_run.load(Ordering::Relaxed),
            predictions_emitted: self.predictions_emitted.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub frames_ingested: usize,
    pub decode_failures: usize,
    pub classifier_failures: usize,
    pub inferences_run: usize,
    pub predictions_emitted: usize,
    pub uptime_seconds: u64,
}
