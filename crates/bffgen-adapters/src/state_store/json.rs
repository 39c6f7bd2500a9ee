//! JSON file ledger store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use bffgen_core::{
    application::{
        ApplicationError,
        ports::{Filesystem, StateStore},
    },
    domain::GenerationState,
    error::{BffgenError, BffgenResult},
};

/// Directory under the project root holding bffgen's bookkeeping.
pub const DEFAULT_STATE_DIR: &str = ".bffgen";
/// Ledger file name inside [`DEFAULT_STATE_DIR`].
pub const STATE_FILE: &str = "state.json";

/// Stores the ledger as pretty-printed JSON at `<root>/.bffgen/state.json`.
///
/// Writes go through [`Filesystem::write_atomic`], so an interrupted persist
/// leaves the previous ledger in place.
pub struct JsonStateStore {
    filesystem: Arc<dyn Filesystem>,
    path: PathBuf,
}

impl JsonStateStore {
    /// Ledger under the default location for `project_root`.
    pub fn new(filesystem: Arc<dyn Filesystem>, project_root: impl AsRef<Path>) -> Self {
        let path = project_root
            .as_ref()
            .join(DEFAULT_STATE_DIR)
            .join(STATE_FILE);
        Self::at(filesystem, path)
    }

    /// Ledger at an explicit file path.
    pub fn at(filesystem: Arc<dyn Filesystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            path: path.into(),
        }
    }

    /// Remove the ledger file if present.
    pub fn delete(&self) -> BffgenResult<bool> {
        if !self.filesystem.exists(&self.path) {
            return Ok(false);
        }
        self.filesystem.remove_file(&self.path)?;
        Ok(true)
    }

    fn load_error(&self, reason: impl ToString) -> BffgenError {
        ApplicationError::StateLoad {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
        .into()
    }
}

impl StateStore for JsonStateStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> BffgenResult<GenerationState> {
        let text = match self.filesystem.read_to_string(&self.path) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("No ledger yet, starting empty");
                return Ok(GenerationState::new());
            }
            Err(e) => return Err(self.load_error(e)),
        };

        if text.trim().is_empty() {
            return Ok(GenerationState::new());
        }

        let state: GenerationState =
            serde_json::from_str(&text).map_err(|e| self.load_error(e))?;
        debug!(
            routes = state.route_count(),
            files = state.files().count(),
            "Ledger loaded"
        );
        Ok(state)
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn persist(&self, state: &GenerationState) -> BffgenResult<()> {
        let persist_error = |reason: String| -> BffgenError {
            ApplicationError::StatePersist {
                path: self.path.clone(),
                reason,
            }
            .into()
        };

        let mut text =
            serde_json::to_string_pretty(state).map_err(|e| persist_error(e.to_string()))?;
        text.push('\n');
        self.filesystem
            .write_atomic(&self.path, &text)
            .map_err(|e| persist_error(e.to_string()))?;
        debug!(routes = state.route_count(), "Ledger persisted");
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}
