//! Per-path quiet windows for events fed into the pipeline directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Tracks which paths are inside their debounce window.
///
/// Pure bookkeeping with the clock passed in, so the timing rules can be
/// tested without sleeping.
#[derive(Debug)]
pub struct QuietWindow {
    window: Duration,
    deadlines: HashMap<PathBuf, Instant>,
}

impl QuietWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Note an event for `path` at `at`, restarting its window.
    pub fn record(&mut self, path: &Path, at: Instant) {
        self.deadlines.insert(path.to_path_buf(), at + self.window);
    }

    /// Remove and return every path whose window has elapsed by `now`,
    /// sorted for a stable dispatch order.
    pub fn due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready: Vec<PathBuf> = self
            .deadlines
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.deadlines.remove(path);
        }
        ready.sort();
        ready
    }

    /// The earliest pending deadline, if any path is debouncing.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }
}
