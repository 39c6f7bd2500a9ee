//! Application ports (traits) for external dependencies.
//!
//! Ports define what the application needs from the outside world.
//! Adapters in `bffgen-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: reads and atomic writes of generated files
//!   - `StateStore`: loading and persisting the generation ledger
//!   - `RouteRenderer`: turning a config model into file regions

pub mod output;

pub use output::{Filesystem, GenerationTarget, RouteRenderer, StateStore};
