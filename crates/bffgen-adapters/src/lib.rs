//! Infrastructure adapters for bffgen.
//!
//! This crate implements the ports defined in `bffgen-core::application::ports`
//! and owns everything that touches the OS: files, the ledger on disk, and
//! config file notifications.

pub mod filesystem;
pub mod renderer;
pub mod state_store;
pub mod watcher;

// Re-export commonly used adapters
pub use filesystem::LocalFilesystem;
pub use renderer::BuiltinRenderer;
pub use state_store::JsonStateStore;
pub use watcher::{ConfigWatcher, WatchEvent, WatchEventKind, WatchSettings};
