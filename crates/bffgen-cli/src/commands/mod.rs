//! Command handlers. Each one translates arguments into core calls and
//! prints the result; no generation logic lives here.

use std::path::PathBuf;
use std::sync::Arc;

use bffgen_adapters::{BuiltinRenderer, JsonStateStore, LocalFilesystem};
use bffgen_core::application::{
    ConfigLoader, GenerationMode, Generator, GeneratorOptions, RegenerationOptions, Regenerator,
    ports::Filesystem,
};

use crate::cli::GlobalArgs;

pub mod completions;
pub mod generate;
pub mod settings;
pub mod state;
pub mod watch;

/// Backups land here, relative to the project directory.
pub const BACKUP_DIR: &str = ".bffgen/backup";

/// How one command wants regeneration to behave.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: GenerationMode,
    pub force: bool,
    pub backup: bool,
    pub show_diff: bool,
}

/// Wire the local adapters into a [`Regenerator`] for the project directory.
pub fn build_regenerator(global: &GlobalArgs, opts: RunOptions) -> Regenerator {
    let fs: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let root = global.project_dir.clone();

    let generator = Generator::new(
        Arc::clone(&fs),
        root.clone(),
        GeneratorOptions {
            mode: opts.mode,
            backup_dir: opts.backup.then(|| PathBuf::from(BACKUP_DIR)),
            show_diff: opts.show_diff,
            ..GeneratorOptions::default()
        },
    );

    Regenerator::new(
        ConfigLoader::new(Arc::clone(&fs)),
        generator,
        Box::new(BuiltinRenderer::new()),
        Box::new(JsonStateStore::new(fs, root)),
        RegenerationOptions { force: opts.force },
    )
}

/// The ledger store for the project directory.
pub fn state_store(global: &GlobalArgs) -> JsonStateStore {
    JsonStateStore::new(Arc::new(LocalFilesystem::new()), &global.project_dir)
}
