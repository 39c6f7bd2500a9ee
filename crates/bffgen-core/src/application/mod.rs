//! Application layer for bffgen.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ConfigLoader, Generator, Regenerator)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer; config and marker
//! rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    ConfigLoader, FileFailure, FileOutcome, FileStatus, GenerationMode, Generator,
    GeneratorOptions, RegenerationOptions, RegenerationReport, Regenerator,
};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, GenerationTarget, RouteRenderer, StateStore};

pub use error::ApplicationError;
