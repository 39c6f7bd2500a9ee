//! Core domain layer for bffgen.
//!
//! Pure logic only: no filesystem, no clock reads, no threads. I/O happens
//! behind the ports in `crate::application::ports`.
//!
//! - [`config_model`] / [`config_document`]: parse and validate configs
//! - [`state`]: the generation ledger
//! - [`markers`]: locate and replace generator-owned regions
//! - [`diff`]: unified diffs for previews

pub mod config_document;
pub mod config_model;
pub mod diff;
pub mod error;
pub mod markers;
pub mod state;

pub use config_document::ConfigDocument;
pub use config_model::{
    ConfigFormat, ConfigModel, Endpoint, HttpMethod, ProjectType, RouteKey, ServiceConfig,
    Settings,
};
pub use diff::{DiffSummary, FileDiff};
pub use error::{DomainError, ErrorCategory};
pub use markers::{CommentStyle, MarkerScan, MarkerSplicer, Markers, Scaffold};
pub use state::{GeneratedFile, GenerationState, content_hash};
