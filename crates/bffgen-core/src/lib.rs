//! bffgen Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of the bffgen
//! regeneration engine: it turns a declarative service config into
//! generated route code, keeping hand-written code outside the
//! generator-owned marker regions intact across runs.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            bffgen-cli (CLI)             │
//! │   generate / watch / state / settings   │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (ConfigLoader, Generator, Regenerator) │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Filesystem, StateStore, RouteRenderer) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    bffgen-adapters (Infrastructure)     │
//! │ (LocalFilesystem, JsonStateStore, ...)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (ConfigModel, GenerationState, markers) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::{path::Path, sync::Arc};
//! use bffgen_core::prelude::*;
//!
//! let fs: Arc<dyn Filesystem> = Arc::new(filesystem);
//! let regenerator = Regenerator::new(
//!     ConfigLoader::new(fs.clone()),
//!     Generator::new(fs, ".", GeneratorOptions::default()),
//!     Box::new(renderer),
//!     Box::new(state_store),
//!     RegenerationOptions::default(),
//! );
//! let mut state = regenerator.load_state()?;
//! let report = regenerator.regenerate(Path::new("bff.config.yaml"), &mut state)?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ConfigLoader, FileOutcome, FileStatus, GenerationMode, Generator, GeneratorOptions,
        RegenerationOptions, RegenerationReport, Regenerator,
        ports::{Filesystem, GenerationTarget, RouteRenderer, StateStore},
    };
    pub use crate::domain::{
        CommentStyle, ConfigFormat, ConfigModel, GenerationState, HttpMethod, MarkerSplicer,
        ProjectType, RouteKey, Scaffold,
    };
    pub use crate::error::{BffgenError, BffgenResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
