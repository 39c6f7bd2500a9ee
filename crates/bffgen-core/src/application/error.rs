//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not config or
//! marker rules. Those are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while loading, generating, persisting, or watching.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The config file does not exist.
    #[error("config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// A file exists but could not be read.
    #[error("failed to read {path}: {reason}")]
    FileRead { path: PathBuf, reason: String },

    /// Writing a generated file failed. The file on disk is unchanged.
    #[error("failed to write {path}: {reason}")]
    FileWrite { path: PathBuf, reason: String },

    /// Copying a file into the backup directory failed.
    #[error("failed to back up {path}: {reason}")]
    Backup { path: PathBuf, reason: String },

    /// The ledger exists but could not be read or decoded.
    #[error("failed to load generation state from {path}: {reason}")]
    StateLoad { path: PathBuf, reason: String },

    /// The ledger could not be written. Generated files are already on disk.
    #[error("failed to persist generation state to {path}: {reason}")]
    StatePersist { path: PathBuf, reason: String },

    /// The OS file-watching facility could not be set up.
    #[error("failed to start file watcher: {reason}")]
    WatcherInit { reason: String },

    /// A lock guarding shared state was poisoned by a panicking thread.
    #[error("internal lock poisoned: {what}")]
    LockPoisoned { what: &'static str },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConfigNotFound { path } => vec![
                format!("No config at {}", path.display()),
                "Create bff.config.yaml (Go) or bffgen.config.json (Node.js)".into(),
                "Or point at another file with --config <path>".into(),
            ],
            Self::FileRead { path, .. } | Self::FileWrite { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have read and write permissions".into(),
            ],
            Self::Backup { path, .. } => vec![
                format!("Could not back up {}", path.display()),
                "Check the backup directory permissions, or run with --no-backup".into(),
            ],
            Self::StateLoad { path, .. } => vec![
                format!("The ledger at {} is unreadable", path.display()),
                "Run 'bffgen state reset' to start a fresh ledger".into(),
            ],
            Self::StatePersist { path, .. } => vec![
                "Generated files were written; only the ledger update failed".into(),
                format!("Check write permissions for {}", path.display()),
            ],
            Self::WatcherInit { .. } => vec![
                "File watching is unavailable on this system".into(),
                "Run 'bffgen generate' after each config change instead".into(),
            ],
            Self::LockPoisoned { .. } => vec!["Restart bffgen and try again".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigNotFound { .. } => ErrorCategory::NotFound,
            Self::StateLoad { .. } => ErrorCategory::Configuration,
            Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::Backup { .. }
            | Self::StatePersist { .. }
            | Self::WatcherInit { .. }
            | Self::LockPoisoned { .. } => ErrorCategory::Internal,
        }
    }
}
