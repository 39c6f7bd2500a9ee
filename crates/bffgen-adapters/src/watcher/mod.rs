//! Config file watching.
//!
//! ```text
//! notify-debouncer-mini ──try_send──▶ bounded queue ──▶ dispatch thread ──▶ worker per path
//!                                          ▲
//! ConfigWatcher::submit ───────────────────┘ (quiet window applied here)
//! ```
//!
//! OS events are coalesced by `notify-debouncer-mini` and arrive settled;
//! the callback never blocks and drops events with a warning when the queue
//! is full. Events fed in through [`ConfigWatcher::submit`] are raw and wait
//! out a per-path quiet window in the dispatch thread first. A worker runs
//! the callback for one path at a time and folds any triggers that arrive
//! meanwhile into a single follow-up run.

mod config_watcher;
mod debounce;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub use config_watcher::ConfigWatcher;
pub use debounce::QuietWindow;

/// Default quiet period before a burst of events counts as one change.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
/// Default capacity of the queue between the OS callback and the debouncer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
    /// Activity that kept going past the debounce window, or a path that
    /// neither existed before nor exists now.
    Other,
}

/// One filesystem notification for a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub timestamp: Instant,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path: path.into(),
            timestamp: Instant::now(),
            kind,
        }
    }

    pub fn modified(path: impl AsRef<Path>) -> Self {
        Self::new(path.as_ref(), WatchEventKind::Modified)
    }
}

/// Tunables for [`ConfigWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSettings {
    pub debounce: Duration,
    pub queue_capacity: usize,
}

impl WatchSettings {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
