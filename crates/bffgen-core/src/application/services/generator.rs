//! Generator - materializes one target file at a time.
//!
//! For each [`GenerationTarget`] the generator reads the current file,
//! splices the new region into it, and then, depending on the
//! [`GenerationMode`], writes the result, reports what would change, or
//! reports it together with a diff.
//!
//! Writes go through [`Filesystem::write_atomic`]; a file whose content
//! would not change is never rewritten.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, GenerationTarget},
    },
    domain::{FileDiff, MarkerSplicer, content_hash, diff::DEFAULT_CONTEXT},
    error::{BffgenError, BffgenResult},
};

/// How a run treats the filesystem. Set once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// Write changed files.
    #[default]
    Write,
    /// Report what would change; write nothing.
    Check,
    /// Like `Check`, with a diff for every changed file.
    DryRun,
}

impl GenerationMode {
    pub fn writes(self) -> bool {
        self == Self::Write
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Check => "check",
            Self::DryRun => "dry-run",
        })
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub mode: GenerationMode,
    /// Copy a file here before overwriting it. `None` disables backups.
    pub backup_dir: Option<PathBuf>,
    /// Attach diffs in `Write` mode too (watch mode shows them).
    pub show_diff: bool,
    pub diff_context: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Write,
            backup_dir: None,
            show_diff: false,
            diff_context: DEFAULT_CONTEXT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Created,
    Updated,
    Unchanged,
    WouldCreate,
    WouldUpdate,
}

impl FileStatus {
    /// The file on disk differs (or would differ) from the generated one.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    pub fn is_written(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::WouldCreate => "would create",
            Self::WouldUpdate => "would update",
        })
    }
}

/// Result of generating one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Relative to the project root; also the ledger key.
    pub path: PathBuf,
    pub status: FileStatus,
    /// Hash of the content now on disk (or that would be).
    pub content_hash: String,
    /// Hash of the content found before generation.
    pub previous_hash: Option<String>,
    pub has_markers: bool,
    pub diff: Option<FileDiff>,
    pub backup: Option<PathBuf>,
}

impl FileOutcome {
    /// Key used in the generation ledger.
    pub fn ledger_key(&self) -> String {
        ledger_key(&self.path)
    }
}

/// Forward-slash form of a relative path.
pub fn ledger_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub struct Generator {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
    options: GeneratorOptions,
}

impl Generator {
    /// `root` is the project directory that target paths are relative to.
    pub fn new(
        filesystem: Arc<dyn Filesystem>,
        root: impl Into<PathBuf>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            filesystem,
            root: root.into(),
            options,
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Produce or update one file.
    ///
    /// Errors are scoped to this file: marker corruption, read failures,
    /// backup failures, and write failures all leave the file as it was.
    pub fn generate_file(&self, target: &GenerationTarget) -> BffgenResult<FileOutcome> {
        self.generate_file_with(target, &mut |_: &FileDiff| {})
    }

    /// Like [`generate_file`](Self::generate_file), handing the diff to
    /// `on_diff` before anything on disk changes. `on_diff` only runs when a
    /// diff is computed (dry runs, or `show_diff`) and the file would change.
    #[instrument(skip_all, fields(path = %target.path.display(), mode = %self.options.mode))]
    pub fn generate_file_with(
        &self,
        target: &GenerationTarget,
        on_diff: &mut dyn FnMut(&FileDiff),
    ) -> BffgenResult<FileOutcome> {
        let key = ledger_key(&target.path);
        let abs = self.root.join(&target.path);

        let existing = self.filesystem.read_to_string(&abs)?;
        let splicer = MarkerSplicer::new(target.comment_style);
        let content = splicer
            .splice(existing.as_deref(), &target.region, &target.scaffold)
            .map_err(|e| BffgenError::Domain(e.with_path(key.clone())))?;

        let changed = existing.as_deref() != Some(content.as_str());
        let mode = self.options.mode;

        let diff = (changed && (mode == GenerationMode::DryRun || self.options.show_diff)).then(|| {
            FileDiff::compute(
                &key,
                existing.as_deref(),
                &content,
                self.options.diff_context,
            )
        });
        if let Some(diff) = &diff {
            on_diff(diff);
        }

        let mut outcome = FileOutcome {
            path: target.path.clone(),
            status: FileStatus::Unchanged,
            content_hash: content_hash(&content),
            previous_hash: existing.as_deref().map(content_hash),
            has_markers: true,
            diff,
            backup: None,
        };

        if !changed {
            debug!("Region already up to date");
            return Ok(outcome);
        }

        if !mode.writes() {
            outcome.status = if existing.is_some() {
                FileStatus::WouldUpdate
            } else {
                FileStatus::WouldCreate
            };
            info!(status = %outcome.status, "File not written");
            return Ok(outcome);
        }

        if existing.is_some() {
            outcome.backup = self.backup(&abs, &key, Utc::now())?;
        }

        self.filesystem.write_atomic(&abs, &content)?;
        outcome.status = if existing.is_some() {
            FileStatus::Updated
        } else {
            FileStatus::Created
        };
        info!(status = %outcome.status, "File generated");
        Ok(outcome)
    }

    fn backup(&self, abs: &Path, key: &str, at: DateTime<Utc>) -> BffgenResult<Option<PathBuf>> {
        let Some(dir) = &self.options.backup_dir else {
            return Ok(None);
        };
        let dest = self.root.join(dir).join(backup_name(key, at));
        self.filesystem
            .copy_file(abs, &dest)
            .map_err(|e| match e {
                BffgenError::Application(ApplicationError::Backup { .. }) => e,
                other => ApplicationError::Backup {
                    path: abs.to_path_buf(),
                    reason: other.to_string(),
                }
                .into(),
            })?;
        debug!(backup = %dest.display(), "Backup written");
        Ok(Some(dest))
    }

    /// Remove backups older than `max_age`. Returns how many were removed.
    /// Files in the backup directory that bffgen did not name are left alone.
    #[instrument(skip_all)]
    pub fn cleanup_backups(
        &self,
        max_age: chrono::Duration,
        now: DateTime<Utc>,
    ) -> BffgenResult<usize> {
        let Some(dir) = &self.options.backup_dir else {
            return Ok(0);
        };
        let dir = self.root.join(dir);
        let mut removed = 0;
        for file in self.filesystem.list_files(&dir)? {
            let Some(taken_at) = file
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_backup_time)
            else {
                continue;
            };
            if now - taken_at > max_age {
                match self.filesystem.remove_file(&file) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(file = %file.display(), error = %e, "Failed to remove old backup")
                    }
                }
            }
        }
        if removed > 0 {
            info!(removed, "Old backups removed");
        }
        Ok(removed)
    }
}

/// `cmd/server/main.go` at t becomes `cmd__server__main.go.<millis>.bak`.
fn backup_name(key: &str, at: DateTime<Utc>) -> String {
    format!("{}.{}.bak", key.replace('/', "__"), at.timestamp_millis())
}

fn parse_backup_time(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(".bak")?;
    let (_, millis) = stem.rsplit_once('.')?;
    DateTime::from_timestamp_millis(millis.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::fakes::FakeFilesystem;
    use crate::domain::{CommentStyle, DomainError, Scaffold};

    fn target(region: &str) -> GenerationTarget {
        GenerationTarget {
            path: PathBuf::from("main.go"),
            region: region.to_string(),
            scaffold: Scaffold::new("package main\n", "// end of file\n"),
            comment_style: CommentStyle::Slash,
            routes: vec![],
        }
    }

    fn generator(fs: &Arc<FakeFilesystem>, options: GeneratorOptions) -> Generator {
        Generator::new(fs.clone(), "/proj", options)
    }

    #[test]
    fn creates_then_leaves_unchanged() {
        let fs = Arc::new(FakeFilesystem::default());
        let generator = generator(&fs, GeneratorOptions::default());

        let first = generator.generate_file(&target("a\n")).unwrap();
        assert_eq!(first.status, FileStatus::Created);
        assert_eq!(first.previous_hash, None);

        let second = generator.generate_file(&target("a\n")).unwrap();
        assert_eq!(second.status, FileStatus::Unchanged);
        assert_eq!(second.content_hash, first.content_hash);
        assert_eq!(fs.write_count(), 1);
    }

    #[test]
    fn update_keeps_user_code_and_backs_up() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put(
            "/proj/main.go",
            "package main\n// bffgen:begin\nold\n// bffgen:end\nfunc mine() {}\n",
        );
        let generator = generator(
            &fs,
            GeneratorOptions {
                backup_dir: Some(PathBuf::from(".bffgen/backup")),
                ..Default::default()
            },
        );

        let outcome = generator.generate_file(&target("new\n")).unwrap();
        assert_eq!(outcome.status, FileStatus::Updated);
        assert_eq!(
            fs.get("/proj/main.go").unwrap(),
            "package main\n// bffgen:begin\nnew\n// bffgen:end\nfunc mine() {}\n"
        );

        let backup = outcome.backup.unwrap();
        assert!(backup.starts_with("/proj/.bffgen/backup"));
        assert!(fs.get(&backup).unwrap().contains("old"));
    }

    #[test]
    fn check_mode_writes_nothing() {
        let fs = Arc::new(FakeFilesystem::default());
        let generator = generator(
            &fs,
            GeneratorOptions {
                mode: GenerationMode::Check,
                ..Default::default()
            },
        );
        let outcome = generator.generate_file(&target("a\n")).unwrap();
        assert_eq!(outcome.status, FileStatus::WouldCreate);
        assert!(outcome.diff.is_none());
        assert_eq!(fs.write_count(), 0);
        assert!(fs.paths().is_empty());
    }

    #[test]
    fn dry_run_attaches_diff() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/main.go", "// bffgen:begin\nold\n// bffgen:end\n");
        let generator = generator(
            &fs,
            GeneratorOptions {
                mode: GenerationMode::DryRun,
                ..Default::default()
            },
        );
        let outcome = generator.generate_file(&target("new\n")).unwrap();
        assert_eq!(outcome.status, FileStatus::WouldUpdate);
        let diff = outcome.diff.unwrap();
        assert_eq!(diff.summary.added, 1);
        assert_eq!(diff.summary.removed, 1);
        assert_eq!(
            fs.get("/proj/main.go").unwrap(),
            "// bffgen:begin\nold\n// bffgen:end\n"
        );
    }

    #[test]
    fn diff_is_handed_over_before_the_file_is_written() {
        let fs = Arc::new(FakeFilesystem::default());
        let original = "// bffgen:begin\nold\n// bffgen:end\n";
        fs.put("/proj/main.go", original);
        let generator = generator(
            &fs,
            GeneratorOptions {
                show_diff: true,
                ..Default::default()
            },
        );

        let mut seen = Vec::new();
        let outcome = generator
            .generate_file_with(&target("new\n"), &mut |diff: &FileDiff| {
                // still the old content while the diff is being shown
                assert_eq!(fs.get("/proj/main.go").as_deref(), Some(original));
                assert_eq!(fs.write_count(), 0);
                seen.push(diff.summary);
            })
            .unwrap();

        assert_eq!(outcome.status, FileStatus::Updated);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].added, 1);
        assert_eq!(fs.write_count(), 1);
    }

    #[test]
    fn no_diff_callback_for_unchanged_files() {
        let fs = Arc::new(FakeFilesystem::default());
        let generator = generator(
            &fs,
            GeneratorOptions {
                show_diff: true,
                ..Default::default()
            },
        );
        generator.generate_file(&target("a\n")).unwrap();

        let mut calls = 0;
        generator
            .generate_file_with(&target("a\n"), &mut |_: &FileDiff| calls += 1)
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn unmanaged_file_is_left_untouched() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.put("/proj/main.go", "package main\nfunc hand() {}\n");
        let generator = generator(&fs, GeneratorOptions::default());

        let err = generator.generate_file(&target("x\n")).unwrap_err();
        let BffgenError::Domain(DomainError::MarkerCorruption { path, .. }) = err else {
            panic!("expected marker corruption, got {err:?}");
        };
        assert_eq!(path.as_deref(), Some("main.go"));
        assert_eq!(fs.get("/proj/main.go").unwrap(), "package main\nfunc hand() {}\n");
        assert_eq!(fs.write_count(), 0);
    }

    #[test]
    fn write_failure_surfaces_as_file_write() {
        let fs = Arc::new(FakeFilesystem::default());
        fs.deny_writes("/proj/main.go");
        let generator = generator(&fs, GeneratorOptions::default());
        let err = generator.generate_file(&target("x\n")).unwrap_err();
        assert!(err.is_per_file());
    }

    #[test]
    fn cleanup_removes_only_old_named_backups() {
        let fs = Arc::new(FakeFilesystem::default());
        let now = Utc::now();
        let old = now - chrono::Duration::days(10);
        let dir = Path::new("/proj/.bffgen/backup");
        fs.put(dir.join(backup_name("main.go", old)), "old");
        fs.put(dir.join(backup_name("main.go", now)), "fresh");
        fs.put(dir.join("notes.txt"), "keep");

        let generator = generator(
            &fs,
            GeneratorOptions {
                backup_dir: Some(PathBuf::from(".bffgen/backup")),
                ..Default::default()
            },
        );
        let removed = generator
            .cleanup_backups(chrono::Duration::days(7), now)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(fs.paths().len(), 2);
        assert!(fs.exists(&dir.join("notes.txt")));
    }

    #[test]
    fn ledger_key_uses_forward_slashes() {
        assert_eq!(ledger_key(Path::new("cmd/server/main.go")), "cmd/server/main.go");
        assert_eq!(
            backup_name("cmd/server/main.go", DateTime::from_timestamp_millis(5).unwrap()),
            "cmd__server__main.go.5.bak"
        );
        assert_eq!(
            parse_backup_time("cmd__server__main.go.5.bak"),
            DateTime::from_timestamp_millis(5)
        );
        assert_eq!(parse_backup_time("notes.txt"), None);
    }
}
