//! Per-client session state: the sliding feature window and the label
//! smoothing history.
//!
//! Sessions are keyed by the client-declared name, not by connection, so
//! several connections (tabs, devices) under one name feed one stream. The
//! registry lock is held only for lookup and insert; every window/history
//! mutation happens under that session's own mutex, which the ingest path
//! holds for the whole append/classify/record step. That per-session mutex
//! is the consistency contract for shared names.

use crate::types::FeatureVector;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Sliding window capacity, in frames.
pub const WINDOW_SIZE: usize = 80;
/// Raw-label history capacity.
pub const HISTORY_SIZE: usize = 10;
/// Raw labels required before a stable label is defined.
pub const MIN_HISTORY: usize = 3;

pub type SharedSession = Arc<Mutex<Session>>;

/// Where a session sits on its one-way path to steady-state emission.
/// The window never drains once full, so there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Window below capacity; the classifier has not run yet.
    Filling,
    /// Window full, but the smoothing history is still too shallow.
    Primed,
    /// Window full and history deep enough: every frame emits.
    Emitting,
}

pub struct Session {
    pub name: String,
    window: VecDeque<FeatureVector>,
    history: VecDeque<String>,
    window_size: usize,
    history_size: usize,
    min_history: usize,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new(name: &str, window_size: usize, history_size: usize, min_history: usize) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            window: VecDeque::with_capacity(window_size + 1),
            history: VecDeque::with_capacity(history_size + 1),
            window_size,
            history_size,
            min_history,
            created_at: now,
            last_seen: now,
        }
    }

    /// Append one feature vector, evicting the oldest past capacity.
    ///
    /// Returns the evicted vector so a failed classification can undo the
    /// whole append with [`Session::rollback_feature`].
    pub fn push_feature(&mut self, features: FeatureVector) -> Option<FeatureVector> {
        self.last_seen = Utc::now();
        self.window.push_back(features);
        if self.window.len() > self.window_size {
            self.window.pop_front()
        } else {
            None
        }
    }

    /// Undo the most recent `push_feature`, restoring the evicted front
    /// element if there was one. Leaves the window exactly as it was before
    /// the append.
    pub fn rollback_feature(&mut self, evicted: Option<FeatureVector>) {
        self.window.pop_back();
        if let Some(front) = evicted {
            self.window.push_front(front);
        }
    }

    pub fn window_full(&self) -> bool {
        self.window.len() == self.window_size
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Chronological copy of the window for classification. The window is
    /// read, not drained: it keeps sliding one-in-one-out afterwards, so a
    /// primed session classifies on every frame.
    pub fn snapshot_window(&self) -> Vec<FeatureVector> {
        self.window.iter().copied().collect()
    }

    /// Record one raw classifier label, evicting the oldest past capacity.
    pub fn record_label(&mut self, label: String) {
        self.history.push_back(label);
        if self.history.len() > self.history_size {
            self.history.pop_front();
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Majority vote over the raw-label history.
    ///
    /// `None` until at least `min_history` labels have accumulated. On a
    /// tied count the label whose latest occurrence is most recent wins.
    pub fn stable_label(&self) -> Option<String> {
        if self.history.len() < self.min_history {
            return None;
        }
        let mut best: Option<(&str, usize, usize)> = None;
        for (idx, label) in self.history.iter().enumerate() {
            let count = self.history.iter().filter(|other| *other == label).count();
            let better = match best {
                None => true,
                Some((_, best_count, best_idx)) => {
                    count > best_count || (count == best_count && idx > best_idx)
                }
            };
            if better {
                best = Some((label.as_str(), count, idx));
            }
        }
        best.map(|(label, _, _)| label.to_string())
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.window_full() {
            SessionPhase::Filling
        } else if self.history.len() < self.min_history {
            SessionPhase::Primed
        } else {
            SessionPhase::Emitting
        }
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_seen
    }
}

/// Registry of live sessions keyed by client-declared name.
pub struct SessionManager {
    sessions: HashMap<String, SharedSession>,
    window_size: usize,
    history_size: usize,
    min_history: usize,
}

impl SessionManager {
    pub fn new(window_size: usize, history_size: usize, min_history: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            window_size,
            history_size,
            min_history,
        }
    }

    /// Idempotent lookup-or-create. Callers get a handle they can keep
    /// using after the registry lock is released.
    pub fn get_or_create(&mut self, name: &str) -> SharedSession {
        if !self.sessions.contains_key(name) {
            tracing::info!("creating session for {name}");
        }
        self.sessions
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Session::new(
                    name,
                    self.window_size,
                    self.history_size,
                    self.min_history,
                )))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<SharedSession> {
        self.sessions.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than `max_idle`. A connection still
    /// holding a handle keeps using the detached session; the next
    /// `get_or_create` for that name starts fresh.
    pub fn evict_idle(&mut self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => session.idle_for(now) <= max_idle,
            // Locked means a connection is mid-append: not idle.
            Err(_) => true,
        });
        before - self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(value: f32) -> FeatureVector {
        let mut features = FeatureVector::zeroed();
        features.0[0] = value;
        features
    }

    fn manager() -> SessionManager {
        SessionManager::new(WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY)
    }

    #[test]
    fn window_holds_most_recent_in_order() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        for i in 0..100 {
            session.push_feature(marked(i as f32));
            assert_eq!(session.window_len(), (i + 1).min(WINDOW_SIZE));
        }
        let snapshot = session.snapshot_window();
        assert_eq!(snapshot.len(), WINDOW_SIZE);
        for (offset, features) in snapshot.iter().enumerate() {
            assert_eq!(features.as_slice()[0], (20 + offset) as f32);
        }
    }

    #[test]
    fn history_is_bounded() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        for i in 0..25 {
            session.record_label(format!("label-{i}"));
            assert!(session.history_len() <= HISTORY_SIZE);
        }
        assert_eq!(session.history_len(), HISTORY_SIZE);
        // Oldest labels were evicted.
        assert_eq!(session.stable_label().unwrap(), "label-24");
    }

    #[test]
    fn stable_label_needs_min_history() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        session.record_label("hello".to_string());
        session.record_label("hello".to_string());
        assert_eq!(session.stable_label(), None);
        session.record_label("thanks".to_string());
        assert_eq!(session.stable_label().unwrap(), "hello");
    }

    #[test]
    fn majority_wins() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        for label in ["yes", "no", "yes", "yes", "no"] {
            session.record_label(label.to_string());
        }
        assert_eq!(session.stable_label().unwrap(), "yes");
    }

    #[test]
    fn tie_goes_to_most_recent() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        for label in ["yes", "no", "yes", "no"] {
            session.record_label(label.to_string());
        }
        assert_eq!(session.stable_label().unwrap(), "no");

        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        for label in ["no", "yes", "no", "yes"] {
            session.record_label(label.to_string());
        }
        assert_eq!(session.stable_label().unwrap(), "yes");
    }

    #[test]
    fn rollback_restores_pre_append_state() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        for i in 0..WINDOW_SIZE {
            session.push_feature(marked(i as f32));
        }
        let evicted = session.push_feature(marked(999.0));
        assert_eq!(evicted.unwrap().as_slice()[0], 0.0);

        session.rollback_feature(evicted);
        let snapshot = session.snapshot_window();
        assert_eq!(snapshot.len(), WINDOW_SIZE);
        assert_eq!(snapshot[0].as_slice()[0], 0.0);
        assert_eq!(snapshot[WINDOW_SIZE - 1].as_slice()[0], (WINDOW_SIZE - 1) as f32);
    }

    #[test]
    fn rollback_before_capacity() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        let evicted = session.push_feature(marked(1.0));
        assert!(evicted.is_none());
        session.rollback_feature(evicted);
        assert_eq!(session.window_len(), 0);
    }

    #[test]
    fn phase_latches_forward() {
        let mut session = Session::new("alice", WINDOW_SIZE, HISTORY_SIZE, MIN_HISTORY);
        assert_eq!(session.phase(), SessionPhase::Filling);
        for i in 0..WINDOW_SIZE {
            session.push_feature(marked(i as f32));
        }
        assert_eq!(session.phase(), SessionPhase::Primed);
        for _ in 0..MIN_HISTORY {
            session.record_label("hello".to_string());
        }
        assert_eq!(session.phase(), SessionPhase::Emitting);

        // Still emitting as the window keeps sliding.
        session.push_feature(marked(0.0));
        assert_eq!(session.phase(), SessionPhase::Emitting);
        assert_eq!(session.window_len(), WINDOW_SIZE);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut manager = manager();
        let first = manager.get_or_create("alice");
        let second = manager.get_or_create("alice");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn evict_idle_drops_stale_sessions() {
        let mut manager = manager();
        let session = manager.get_or_create("alice");
        manager.get_or_create("bob");
        session.try_lock().unwrap().last_seen = Utc::now() - Duration::hours(2);

        let evicted = manager.evict_idle(Duration::hours(1));
        assert_eq!(evicted, 1);
        assert!(manager.get("alice").is_none());
        assert!(manager.get("bob").is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn interleaved_connections_share_one_window() {
        let manager = Arc::new(Mutex::new(manager()));
        let mut tasks = Vec::new();
        for task_idx in 0..2 {
            let manager = manager.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..60 {
                    let session = manager.lock().await.get_or_create("bob");
                    let mut session = session.lock().await;
                    session.push_feature(marked((task_idx * 1000 + i) as f32));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let session = manager.lock().await.get_or_create("bob");
        let session = session.lock().await;
        assert_eq!(session.window_len(), WINDOW_SIZE);

        // 120 appends, capacity 80: exactly the most recent 80 survive,
        // nothing duplicated.
        let mut markers: Vec<f32> = session
            .snapshot_window()
            .iter()
            .map(|f| f.as_slice()[0])
            .collect();
        markers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        markers.dedup();
        assert_eq!(markers.len(), WINDOW_SIZE);
        for marker in markers {
            let marker = marker as usize;
            assert!(marker % 1000 < 60, "unexpected marker {marker}");
        }
    }
}
