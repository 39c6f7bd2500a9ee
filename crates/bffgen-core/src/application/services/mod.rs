//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the
//! high-level use cases: load a config, generate a file, run a full
//! regeneration cycle.

pub mod config_loader;
pub mod generator;
pub mod regenerator;

#[cfg(test)]
pub(crate) mod fakes;

pub use config_loader::ConfigLoader;
pub use generator::{FileOutcome, FileStatus, GenerationMode, Generator, GeneratorOptions};
pub use regenerator::{FileFailure, RegenerationOptions, RegenerationReport, Regenerator};
