//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "bffgen",
    bin_name = "bffgen",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Regeneration-safe route code for backend-for-frontend projects",
    long_about = "bffgen turns a declarative service config into proxy routes. \
                  Generated code lives between bffgen:begin / bffgen:end markers; \
                  everything outside them is yours and survives every regeneration.",
    after_help = "EXAMPLES:\n\
        \x20 bffgen generate\n\
        \x20 bffgen generate --dry-run\n\
        \x20 bffgen watch --debounce-ms 500\n\
        \x20 bffgen completions bash > /usr/share/bash-completion/completions/bffgen",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Regenerate route code from the config.
    #[command(
        visible_alias = "gen",
        about = "Regenerate route code from the config",
        after_help = "EXAMPLES:\n\
            \x20 bffgen generate\n\
            \x20 bffgen generate --check     # exit 5 when files are out of date\n\
            \x20 bffgen generate --dry-run   # show the diff, write nothing\n\
            \x20 bffgen generate --force     # forget previously generated routes"
    )]
    Generate(GenerateArgs),

    /// Watch the config and regenerate on every change.
    #[command(
        visible_alias = "w",
        about = "Regenerate whenever the config changes",
        after_help = "EXAMPLES:\n\
            \x20 bffgen watch\n\
            \x20 bffgen watch --no-diff --debounce-ms 1000\n\
            \x20 BFFGEN__WATCH__RESTART_COMMAND='go run ./cmd/server' bffgen watch"
    )]
    Watch(WatchArgs),

    /// Inspect or reset the generation ledger.
    #[command(
        about = "Inspect or reset the generation ledger",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 bffgen state show\n\
            \x20 bffgen state reset\n\
            \x20 bffgen state path"
    )]
    State(StateCommands),

    /// Manage bffgen's own settings.
    #[command(
        about = "Settings management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 bffgen settings get watch.debounce_ms\n\
            \x20 bffgen settings list\n\
            \x20 bffgen settings init"
    )]
    Settings(SettingsCommands),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 bffgen completions bash > ~/.local/share/bash-completion/completions/bffgen\n\
            \x20 bffgen completions zsh  > ~/.zfunc/_bffgen\n\
            \x20 bffgen completions fish > ~/.config/fish/completions/bffgen.fish"
    )]
    Completions(CompletionsArgs),
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `bffgen generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Report whether anything is out of date; write nothing.
    #[arg(
        long = "check",
        conflicts_with = "dry_run",
        help = "Exit 5 if regeneration would change anything"
    )]
    pub check: bool,

    /// Print the diff of every file that would change; write nothing.
    #[arg(long = "dry-run", help = "Show what would change without writing")]
    pub dry_run: bool,

    /// Reset the ledger before generating.
    #[arg(long = "force", help = "Forget previously generated routes")]
    pub force: bool,

    /// Skip copying files into `.bffgen/backup` before overwriting.
    #[arg(long = "no-backup", help = "Do not back up files before overwriting")]
    pub no_backup: bool,
}

// ── watch ─────────────────────────────────────────────────────────────────────

/// Arguments for `bffgen watch`.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Do not print diffs of changed files.
    #[arg(long = "no-diff", help = "Do not print diffs")]
    pub no_diff: bool,

    /// Do not run the configured restart command.
    #[arg(long = "no-restart", help = "Do not run watch.restart_command")]
    pub no_restart: bool,

    /// Override `watch.debounce_ms`.
    #[arg(long = "debounce-ms", value_name = "MS", help = "Debounce window in milliseconds")]
    pub debounce_ms: Option<u64>,

    /// Skip copying files into `.bffgen/backup` before overwriting.
    #[arg(long = "no-backup", help = "Do not back up files before overwriting")]
    pub no_backup: bool,
}

// ── state ─────────────────────────────────────────────────────────────────────

/// Subcommands for `bffgen state`.
#[derive(Debug, Subcommand)]
pub enum StateCommands {
    /// Print the tracked routes and files.
    Show {
        /// Print the raw ledger JSON.
        #[arg(long = "json")]
        json: bool,
    },
    /// Delete the ledger; the next run treats every route as new.
    Reset,
    /// Print the ledger location.
    Path,
}

// ── settings ──────────────────────────────────────────────────────────────────

/// Subcommands for `bffgen settings`.
#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Print the value of a settings key.
    Get {
        /// Dotted key path, e.g. `watch.debounce_ms`.
        key: String,
    },
    /// Print all settings.
    List,
    /// Print the path to the settings file.
    Path,
    /// Write the default settings file.
    Init {
        /// Overwrite an existing file.
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `bffgen completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_generate_flags() {
        let cli = Cli::parse_from(["bffgen", "generate", "--dry-run", "--no-backup"]);
        match cli.command {
            Commands::Generate(args) => {
                assert!(args.dry_run);
                assert!(args.no_backup);
                assert!(!args.check);
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn check_and_dry_run_conflict() {
        assert!(Cli::try_parse_from(["bffgen", "generate", "--check", "--dry-run"]).is_err());
    }

    #[test]
    fn gen_alias() {
        let cli = Cli::parse_from(["bffgen", "gen"]);
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bffgen", "watch", "-C", "proj", "--config", "x.yaml"]);
        assert_eq!(cli.global.project_dir, std::path::PathBuf::from("proj"));
        assert!(matches!(cli.command, Commands::Watch(_)));
    }

    #[test]
    fn watch_debounce_override() {
        let cli = Cli::parse_from(["bffgen", "watch", "--debounce-ms", "50"]);
        match cli.command {
            Commands::Watch(args) => assert_eq!(args.debounce_ms, Some(50)),
            other => panic!("expected watch, got {other:?}"),
        }
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["bffgen", "--quiet", "--verbose", "state", "path"]);
        assert!(result.is_err());
    }
}
