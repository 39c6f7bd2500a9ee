//! Test doubles shared by the service tests.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::{ApplicationError, ports::Filesystem};
use crate::error::BffgenResult;

#[derive(Debug, Default)]
pub(crate) struct FakeFilesystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    read_only: Mutex<HashSet<PathBuf>>,
    writes: Mutex<usize>,
}

impl FakeFilesystem {
    pub(crate) fn put(&self, path: impl AsRef<Path>, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content.to_string());
    }

    pub(crate) fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub(crate) fn deny_writes(&self, path: impl AsRef<Path>) {
        self.read_only
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    pub(crate) fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

impl Filesystem for FakeFilesystem {
    fn read_to_string(&self, path: &Path) -> BffgenResult<Option<String>> {
        Ok(self.get(path))
    }

    fn write_atomic(&self, path: &Path, content: &str) -> BffgenResult<()> {
        if self.read_only.lock().unwrap().contains(path) {
            return Err(ApplicationError::FileWrite {
                path: path.to_path_buf(),
                reason: "permission denied".into(),
            }
            .into());
        }
        *self.writes.lock().unwrap() += 1;
        self.put(path, content);
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> BffgenResult<()> {
        let content = self.get(from).ok_or_else(|| ApplicationError::Backup {
            path: from.to_path_buf(),
            reason: "no such file".into(),
        })?;
        self.put(to, &content);
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> BffgenResult<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn remove_file(&self, path: &Path) -> BffgenResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}
