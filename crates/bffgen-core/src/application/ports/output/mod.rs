//! Driven (output) ports - implemented by infrastructure.
//!
//! The `bffgen-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::domain::{CommentStyle, ConfigModel, GenerationState, RouteKey, Scaffold};
use crate::error::BffgenResult;

/// Port for filesystem operations.
///
/// Implemented by `bffgen_adapters::filesystem::LocalFilesystem`.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Read a file. `Ok(None)` when it does not exist.
    fn read_to_string(&self, path: &Path) -> BffgenResult<Option<String>>;

    /// Replace a file's content so readers see either the old or the new
    /// content, never a partial write. Parent directories are created.
    fn write_atomic(&self, path: &Path, content: &str) -> BffgenResult<()>;

    /// Copy a file, creating the destination's parent directories.
    fn copy_file(&self, from: &Path, to: &Path) -> BffgenResult<()>;

    /// Files directly inside a directory. Empty when it does not exist.
    fn list_files(&self, dir: &Path) -> BffgenResult<Vec<PathBuf>>;

    fn remove_file(&self, path: &Path) -> BffgenResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Port for the persisted generation ledger.
///
/// Implemented by `bffgen_adapters::state_store::JsonStateStore`.
#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    /// Load the ledger; a missing ledger is an empty one.
    fn load(&self) -> BffgenResult<GenerationState>;

    /// Write the full ledger atomically.
    fn persist(&self, state: &GenerationState) -> BffgenResult<()>;

    /// Where the ledger lives, for messages.
    fn location(&self) -> PathBuf;
}

/// One output file the renderer wants materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTarget {
    /// Relative to the project root.
    pub path: PathBuf,
    /// Content of the generator-owned region.
    pub region: String,
    /// Text around the region when the file is first created.
    pub scaffold: Scaffold,
    pub comment_style: CommentStyle,
    /// Routes whose code lives in `region`.
    pub routes: Vec<RouteKey>,
}

/// Port for turning a config into generated regions.
///
/// Implemented by `bffgen_adapters::renderer::BuiltinRenderer`.
#[cfg_attr(test, mockall::automock)]
pub trait RouteRenderer: Send + Sync {
    /// Every file the model needs, in a stable order.
    fn render(&self, model: &ConfigModel) -> Vec<GenerationTarget>;
}
