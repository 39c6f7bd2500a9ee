//! Loading a [`ConfigModel`] from disk.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{ConfigFormat, ConfigModel},
    error::BffgenResult,
};

/// Reads config files through the [`Filesystem`] port.
#[derive(Clone)]
pub struct ConfigLoader {
    filesystem: Arc<dyn Filesystem>,
}

impl ConfigLoader {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Load and validate a config. The format follows the file extension.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> BffgenResult<ConfigModel> {
        let text = self
            .filesystem
            .read_to_string(path)?
            .ok_or_else(|| ApplicationError::ConfigNotFound {
                path: path.to_path_buf(),
            })?;

        let model = ConfigModel::parse(&text, ConfigFormat::from_path(path))?;

        if model.is_empty() {
            warn!("Config declares no services; nothing will be generated");
        }
        debug!(
            project_type = %model.project_type,
            services = model.services.len(),
            routes = model.route_count(),
            "Config loaded"
        );
        Ok(model)
    }
}
