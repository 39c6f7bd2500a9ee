//! Local filesystem adapter using std::fs.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use bffgen_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{BffgenError, BffgenResult},
};

/// Production filesystem implementation using `std::fs`.
///
/// Writes land in a temporary file next to the destination and are then
/// renamed over it, so a crash mid-write never leaves a truncated file.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn read_to_string(&self, path: &Path) -> BffgenResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApplicationError::FileRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn write_atomic(&self, path: &Path, content: &str) -> BffgenResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| write_error(path, e, "create parent directory"))?;
        }

        let tmp = temp_path(path);
        let result = (|| -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(write_error(path, e, "write file"));
        }
        debug!(path = %path.display(), bytes = content.len(), "File replaced");
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> BffgenResult<()> {
        let copy = || -> io::Result<()> {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(from, to).map(|_| ())
        };
        copy().map_err(|e| {
            ApplicationError::Backup {
                path: from.to_path_buf(),
                reason: format!("copy to {}: {e}", to.display()),
            }
            .into()
        })
    }

    fn list_files(&self, dir: &Path) -> BffgenResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(dir, e)),
        };
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| read_error(dir, e))?;
            if entry.file_type().map_err(|e| read_error(dir, e))?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn remove_file(&self, path: &Path) -> BffgenResult<()> {
        fs::remove_file(path).map_err(|e| write_error(path, e, "remove file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// `dir/.name.<uuid>.tmp`, in the destination's directory so the final
/// rename never crosses filesystems.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}

fn write_error(path: &Path, e: io::Error, operation: &str) -> BffgenError {
    ApplicationError::FileWrite {
        path: path.to_path_buf(),
        reason: format!("failed to {operation}: {e}"),
    }
    .into()
}

fn read_error(path: &Path, e: io::Error) -> BffgenError {
    ApplicationError::FileRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}
