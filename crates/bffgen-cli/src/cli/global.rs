//! Global arguments that apply to every subcommand.
//!
//! Declared here and flattened into [`super::Cli`] so that `-v`, `-q`, etc.
//! are available on any invocation without repetition

use clap::Args;
use std::path::{Path, PathBuf};

/// Config file names tried, in order, when `--config` is not given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["bff.config.yaml", "bffgen.config.json"];

/// Global arguments for all commands.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase logging verbosity.
    ///
    /// Pass once for INFO (`-v`), twice for DEBUG (`-vv`), three times for
    /// TRACE (`-vvv`).  Conflicts with `--quiet`.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)",
        long_help = "Increase logging verbosity:
    (none)  - Warnings and errors
    -v      - Info level (progress messages)
    -vv     - Debug level (detailed diagnostics)
    -vvv    - Trace level (very verbose)"
    )]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Disable ANSI colour codes.
    ///
    /// Automatically honoured when `NO_COLOR` is set in the environment
    /// (see <https://no-color.org>).
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Disable colored output"
    )]
    pub no_color: bool,

    /// BFF config file describing services and endpoints.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "BFF config file (default: bff.config.yaml, then bffgen.config.json)"
    )]
    pub config: Option<PathBuf>,

    /// Settings file for bffgen itself.
    #[arg(
        long = "settings",
        global = true,
        value_name = "FILE",
        env = "BFFGEN_SETTINGS",
        help = "bffgen settings file (TOML)"
    )]
    pub settings: Option<PathBuf>,

    /// Project root; generated files and `.bffgen/` live here.
    #[arg(
        short = 'C',
        long = "project-dir",
        global = true,
        value_name = "DIR",
        default_value = ".",
        help = "Project directory"
    )]
    pub project_dir: PathBuf,

    /// Output format.
    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Output format"
    )]
    pub output_format: OutputFormat,
}

impl GlobalArgs {
    /// The BFF config file to use.
    ///
    /// An explicit `--config` is resolved against the project directory when
    /// relative. Otherwise the first default name that exists wins, and the
    /// first default name is returned when none does, so the not-found error
    /// names a sensible file.
    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.config {
            return self.in_project(path);
        }
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| self.project_dir.join(name))
            .find(|p| p.is_file())
            .unwrap_or_else(|| self.project_dir.join(DEFAULT_CONFIG_FILES[0]))
    }

    fn in_project(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}

/// How the CLI should render its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Human-readable with colors.
    Human,
    /// Plain text without colors.
    Plain,
}
