//! notify-backed config watcher with debounced events and per-path dispatch.

use std::collections::{BTreeSet, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};
use tracing::{debug, error, info, trace, warn};

use bffgen_core::{
    application::ApplicationError,
    error::{BffgenError, BffgenResult},
};

use super::{QuietWindow, WatchEvent, WatchEventKind, WatchSettings};

type ChangeCallback = Arc<dyn Fn(&Path) + Send + Sync>;

enum Signal {
    /// Raw event; waits out the quiet window.
    Event(WatchEvent),
    /// Already debounced by the OS layer; dispatched immediately.
    Settled(WatchEvent),
    Shutdown,
}

impl Signal {
    fn path(&self) -> Option<&Path> {
        match self {
            Self::Event(event) | Self::Settled(event) => Some(&event.path),
            Self::Shutdown => None,
        }
    }
}

struct Running {
    os_watcher: Option<Debouncer<RecommendedWatcher>>,
    sender: SyncSender<Signal>,
    dispatch: JoinHandle<()>,
}

/// Watches config files and calls `on_change` once per settled change.
///
/// Paths are matched after normalization (absolute, parent directory
/// canonicalized), so `./bff.config.yaml` and the absolute path the OS
/// reports compare equal.
pub struct ConfigWatcher {
    paths: Vec<PathBuf>,
    settings: WatchSettings,
    on_change: ChangeCallback,
    running: Option<Running>,
}

impl ConfigWatcher {
    pub fn new<P, F>(
        paths: impl IntoIterator<Item = P>,
        settings: WatchSettings,
        on_change: F,
    ) -> BffgenResult<Self>
    where
        P: AsRef<Path>,
        F: Fn(&Path) + Send + Sync + 'static,
    {
        let mut paths: Vec<PathBuf> = paths.into_iter().map(|p| normalize(p.as_ref())).collect();
        paths.sort();
        paths.dedup();

        if paths.is_empty() {
            return Err(init_error("no paths to watch"));
        }
        if settings.queue_capacity == 0 {
            return Err(init_error("event queue capacity must be at least 1"));
        }

        Ok(Self {
            paths,
            settings,
            on_change: Arc::new(on_change),
            running: None,
        })
    }

    /// The normalized paths being watched.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Subscribe to OS notifications and start the pipeline. Calling it on a
    /// running watcher does nothing.
    pub fn start(&mut self) -> BffgenResult<()> {
        if self.running.is_some() {
            return Ok(());
        }

        let (sender, dispatch) = self.spawn_pipeline()?;
        match self.subscribe(sender.clone()) {
            Ok(os_watcher) => {
                info!(
                    paths = self.paths.len(),
                    debounce_ms = self.settings.debounce.as_millis() as u64,
                    "Watching config files"
                );
                self.running = Some(Running {
                    os_watcher: Some(os_watcher),
                    sender,
                    dispatch,
                });
                Ok(())
            }
            Err(e) => {
                let _ = sender.send(Signal::Shutdown);
                let _ = dispatch.join();
                Err(e)
            }
        }
    }

    /// Start the quiet-window and dispatch stages without an OS subscription.
    /// Events then only arrive through [`ConfigWatcher::submit`].
    pub fn start_pipeline(&mut self) -> BffgenResult<()> {
        if self.running.is_some() {
            return Ok(());
        }
        let (sender, dispatch) = self.spawn_pipeline()?;
        self.running = Some(Running {
            os_watcher: None,
            sender,
            dispatch,
        });
        Ok(())
    }

    /// Feed an event into the pipeline as if the OS had reported it.
    ///
    /// Returns false when the watcher is stopped or the queue is full.
    pub fn submit(&self, mut event: WatchEvent) -> bool {
        match &self.running {
            Some(running) => {
                event.path = normalize(&event.path);
                enqueue(&running.sender, Signal::Event(event))
            }
            None => false,
        }
    }

    /// Stop watching. In-flight callbacks finish first; triggers that have
    /// not started yet are dropped. Safe to call more than once.
    pub fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };
        drop(running.os_watcher.take());
        let _ = running.sender.send(Signal::Shutdown);
        if running.dispatch.join().is_err() {
            error!("Dispatch thread panicked");
        }
        debug!("Config watcher stopped");
    }

    fn spawn_pipeline(&self) -> BffgenResult<(SyncSender<Signal>, JoinHandle<()>)> {
        let (sender, receiver) = mpsc::sync_channel(self.settings.queue_capacity);
        let window = QuietWindow::new(self.settings.debounce);
        let on_change = Arc::clone(&self.on_change);

        let handle = thread::Builder::new()
            .name("bffgen-dispatch".into())
            .spawn(move || run_dispatch(receiver, window, on_change))
            .map_err(|e| init_error(format!("failed to spawn dispatch thread: {e}")))?;
        Ok((sender, handle))
    }

    fn subscribe(&self, sender: SyncSender<Signal>) -> BffgenResult<Debouncer<RecommendedWatcher>> {
        // last known existence of each watched path, to tell creation from removal
        let mut present: HashMap<PathBuf, bool> =
            self.paths.iter().map(|p| (p.clone(), p.exists())).collect();
        let dirs: BTreeSet<PathBuf> = self
            .paths
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();

        let handler = move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    let path = normalize(&event.path);
                    let Some(existed) = present.get_mut(&path) else {
                        continue;
                    };
                    let exists = path.exists();
                    let kind = settled_kind(event.kind, *existed, exists);
                    *existed = exists;
                    enqueue(&sender, Signal::Settled(WatchEvent::new(path, kind)));
                }
            }
            Err(e) => warn!(error = %e, "File watcher error"),
        };
        let mut debouncer = new_debouncer(self.settings.debounce, handler).map_err(init_error)?;

        // Watching the directory rather than the file survives editors that
        // save by writing a temp file and renaming it over the original.
        for dir in &dirs {
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| init_error(format!("{}: {e}", dir.display())))?;
        }
        Ok(debouncer)
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_dispatch(receiver: Receiver<Signal>, mut window: QuietWindow, on_change: ChangeCallback) {
    let mut workers: HashMap<PathBuf, Worker> = HashMap::new();

    loop {
        let signal = match window.next_deadline() {
            Some(deadline) => {
                match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(signal) => Some(signal),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match receiver.recv() {
                Ok(signal) => Some(signal),
                Err(_) => break,
            },
        };

        match signal {
            Some(Signal::Event(event)) => {
                trace!(path = %event.path.display(), kind = ?event.kind, "Event");
                window.record(&event.path, event.timestamp);
            }
            Some(Signal::Settled(event)) => {
                trace!(path = %event.path.display(), kind = ?event.kind, "Settled event");
                dispatch(&mut workers, event.path, &on_change);
            }
            Some(Signal::Shutdown) => break,
            None => {}
        }

        for path in window.due(Instant::now()) {
            dispatch(&mut workers, path, &on_change);
        }
    }

    for worker in workers.into_values() {
        worker.shutdown();
    }
}

/// Hand `path` to its worker, starting one on first use.
fn dispatch(workers: &mut HashMap<PathBuf, Worker>, path: PathBuf, on_change: &ChangeCallback) {
    if !workers.contains_key(&path) {
        match Worker::spawn(path.clone(), Arc::clone(on_change)) {
            Ok(worker) => {
                workers.insert(path.clone(), worker);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to spawn worker");
                return;
            }
        }
    }
    if let Some(worker) = workers.get(&path) {
        worker.trigger();
    }
}

#[derive(Default)]
struct SlotState {
    pending: bool,
    shutdown: bool,
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    wake: Condvar,
}

/// Serializes callbacks for one path.
struct Worker {
    slot: Arc<Slot>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn(path: PathBuf, on_change: ChangeCallback) -> std::io::Result<Self> {
        let slot = Arc::new(Slot::default());
        let worker_slot = Arc::clone(&slot);
        let handle = thread::Builder::new()
            .name("bffgen-worker".into())
            .spawn(move || run_worker(&path, &worker_slot, on_change.as_ref()))?;
        Ok(Self { slot, handle })
    }

    /// Request a run. Any number of triggers during a run collapse into one.
    fn trigger(&self) {
        if let Ok(mut state) = self.slot.state.lock() {
            state.pending = true;
        }
        self.slot.wake.notify_one();
    }

    fn shutdown(self) {
        if let Ok(mut state) = self.slot.state.lock() {
            state.shutdown = true;
        }
        self.slot.wake.notify_one();
        if self.handle.join().is_err() {
            error!("Watch worker panicked");
        }
    }
}

fn run_worker(path: &Path, slot: &Slot, on_change: &(dyn Fn(&Path) + Send + Sync)) {
    loop {
        {
            let Ok(mut state) = slot.state.lock() else {
                return;
            };
            while !state.pending && !state.shutdown {
                state = match slot.wake.wait(state) {
                    Ok(state) => state,
                    Err(_) => return,
                };
            }
            if state.shutdown {
                return;
            }
            state.pending = false;
        }

        debug!(path = %path.display(), "Config change settled");
        if catch_unwind(AssertUnwindSafe(|| on_change(path))).is_err() {
            error!(path = %path.display(), "Change handler panicked");
        }
    }
}

fn enqueue(sender: &SyncSender<Signal>, signal: Signal) -> bool {
    match sender.try_send(signal) {
        Ok(()) => true,
        Err(TrySendError::Full(signal)) => {
            if let Some(path) = signal.path() {
                warn!(path = %path.display(), "Watch queue full, dropping event");
            }
            false
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

fn settled_kind(kind: DebouncedEventKind, existed: bool, exists: bool) -> WatchEventKind {
    if !matches!(kind, DebouncedEventKind::Any) {
        return WatchEventKind::Other;
    }
    match (existed, exists) {
        (true, true) => WatchEventKind::Modified,
        (false, true) => WatchEventKind::Created,
        (true, false) => WatchEventKind::Removed,
        (false, false) => WatchEventKind::Other,
    }
}

/// Absolute path with the parent directory canonicalized when it exists.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}

fn init_error(reason: impl ToString) -> BffgenError {
    ApplicationError::WatcherInit {
        reason: reason.to_string(),
    }
    .into()
}
