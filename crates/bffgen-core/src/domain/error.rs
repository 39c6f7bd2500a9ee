// ============================================================================
// domain/error.rs - config and marker invariants
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Domain errors are pure: they carry no I/O handles and can be cloned
/// into reports and compared in tests.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Config errors
    // ========================================================================
    /// The config document is syntactically invalid or a required field is
    /// missing or malformed. `field` is a dotted path into the document when
    /// the failure can be pinned to one.
    #[error("invalid config{}: {message}", .field.as_ref().map(|f| format!(" at '{f}'")).unwrap_or_default())]
    ConfigParse {
        field: Option<String>,
        message: String,
    },

    /// Two endpoints of one service resolve to the same route identity.
    #[error("duplicate route in service '{service}': {method} {expose_as}")]
    DuplicateRoute {
        service: String,
        method: String,
        expose_as: String,
    },

    // ========================================================================
    // Marker errors
    // ========================================================================
    /// A managed file has missing, repeated, or misordered markers.
    #[error("marker corruption{}: {reason}", .path.as_ref().map(|p| format!(" in {p}")).unwrap_or_default())]
    MarkerCorruption {
        path: Option<String>,
        reason: String,
    },
}

impl DomainError {
    /// Shorthand for a parse error pinned to a field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Shorthand for a document-level parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            field: None,
            message: message.into(),
        }
    }

    /// Attach the offending file to a marker error.
    pub fn with_path(self, file: impl Into<String>) -> Self {
        match self {
            Self::MarkerCorruption { reason, .. } => Self::MarkerCorruption {
                path: Some(file.into()),
                reason,
            },
            other => other,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConfigParse { field, .. } => {
                let mut out = vec!["Fix the config file and run the command again".into()];
                if let Some(field) = field {
                    out.push(format!("Check the value of '{field}'"));
                }
                out
            }
            Self::DuplicateRoute {
                service,
                method,
                expose_as,
            } => vec![
                format!("Service '{service}' declares {method} {expose_as} more than once"),
                "Remove one endpoint or give it a different exposeAs path".into(),
            ],
            Self::MarkerCorruption { path, .. } => vec![
                format!(
                    "Restore exactly one 'bffgen:begin' and one 'bffgen:end' line{}",
                    path.as_ref()
                        .map(|p| format!(" in {p}"))
                        .unwrap_or_default()
                ),
                "Or move the file aside so it can be regenerated from scratch".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigParse { .. } | Self::DuplicateRoute { .. } => ErrorCategory::Validation,
            Self::MarkerCorruption { .. } => ErrorCategory::Conflict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
}
