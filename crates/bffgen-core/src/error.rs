//! Unified error handling for bffgen core.
//!
//! [`BffgenError`] wraps domain and application errors so callers match on
//! one type, and classifies them by how a batch run should react.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for bffgen core operations.
#[derive(Debug, Error, Clone)]
pub enum BffgenError {
    /// Config or marker rule violations.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O and orchestration failures.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl BffgenError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in bffgen".into(),
                "Please report this issue at: https://github.com/cosecruz/bffgen/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Conflict => ErrorCategory::Conflict,
            },
            Self::Application(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Errors that abort the attempt before any file is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Domain(DomainError::ConfigParse { .. } | DomainError::DuplicateRoute { .. })
                | Self::Application(
                    ApplicationError::ConfigNotFound { .. } | ApplicationError::StateLoad { .. }
                )
                | Self::Internal { .. }
        )
    }

    /// Errors scoped to a single output file; the rest of a batch continues.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Domain(DomainError::MarkerCorruption { .. })
                | Self::Application(
                    ApplicationError::FileRead { .. }
                        | ApplicationError::FileWrite { .. }
                        | ApplicationError::Backup { .. }
                )
        )
    }

    /// Ledger persistence failed after files were written.
    pub fn is_state_persist(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::StatePersist { .. }))
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type BffgenResult<T> = Result<T, BffgenError>;
