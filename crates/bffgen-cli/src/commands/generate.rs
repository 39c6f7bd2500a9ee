//! Implementation of the `bffgen generate` command.

use std::io;

use chrono::Utc;
use tracing::{info, instrument, warn};

use bffgen_core::application::{FileStatus, GenerationMode, RegenerationReport};

use super::{RunOptions, build_regenerator};
use crate::{
    cli::{GenerateArgs, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute `bffgen generate`.
///
/// 1. Load the ledger
/// 2. Regenerate every target from the config
/// 3. Print per-file results, diffs and new routes
/// 4. Prune old backups after a write run
/// 5. With `--check`, fail with exit code 5 if anything is out of date
#[instrument(skip_all, fields(check = args.check, dry_run = args.dry_run, force = args.force))]
pub fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let mode = if args.check {
        GenerationMode::Check
    } else if args.dry_run {
        GenerationMode::DryRun
    } else {
        GenerationMode::Write
    };
    let backup = config.generate.backup && !args.no_backup;

    let regenerator = build_regenerator(
        &global,
        RunOptions {
            mode,
            force: args.force,
            backup,
            show_diff: false,
        },
    );

    let config_path = global.config_path();
    let mut state = regenerator.load_state()?;
    let report = regenerator.regenerate(&config_path, &mut state)?;

    print_report(&output, &report, true)?;

    if mode.writes() && backup && config.generate.backup_retention_hours > 0 {
        let retention = i64::try_from(config.generate.backup_retention_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX);
        if let Err(e) = regenerator.generator().cleanup_backups(retention, Utc::now()) {
            warn!(error = %e, "Backup cleanup failed");
        }
    }

    if mode == GenerationMode::Check && report.has_pending_changes() {
        return Err(CliError::ChecksPending {
            files: report.changed_files().count(),
            routes: report.new_routes.len(),
        });
    }

    info!(success = report.is_success(), "Generate finished");
    Ok(())
}

/// Print one regeneration report. Per-file failures and ledger warnings go
/// to stderr; everything else respects `--quiet`. Pass `include_diffs =
/// false` when the diffs were already shown as the files were generated.
pub fn print_report(
    output: &OutputManager,
    report: &RegenerationReport,
    include_diffs: bool,
) -> io::Result<()> {
    if report.ledger_reset {
        output.warning("Ledger reset; every route is treated as new")?;
    }

    for outcome in &report.outcomes {
        let path = outcome.path.display();
        match outcome.status {
            FileStatus::Created | FileStatus::Updated => {
                output.success(&format!("{} {path}", outcome.status))?;
            }
            FileStatus::WouldCreate | FileStatus::WouldUpdate => {
                output.info(&format!("{} {path}", outcome.status))?;
            }
            FileStatus::Unchanged => {}
        }
        if let Some(diff) = outcome.diff.as_ref().filter(|_| include_diffs) {
            output.diff(diff)?;
        }
    }

    for failure in &report.failures {
        output.error_stderr(&format!("{}: {}", failure.path.display(), failure.error))?;
        for suggestion in failure.error.suggestions() {
            output.error_stderr(&format!("  {suggestion}"))?;
        }
    }

    if let Some(error) = &report.state_error {
        output.warning_stderr(&error.to_string())?;
    }

    let verb = if report.mode.writes() { "generated" } else { "to generate" };
    for route in &report.new_routes {
        output.print(&format!("  + {} {} ({})", route.method, route.expose_as, route.service))?;
    }

    let changed = report.changed_files().count();
    let unchanged = report.outcomes.len() - changed;
    output.print(&format!(
        "{changed} file(s) {}, {unchanged} unchanged, {} failed; {} new route(s) {verb}, {} already tracked",
        if report.mode.writes() { "written" } else { "out of date" },
        report.failures.len(),
        report.new_routes.len(),
        report.known_routes,
    ))
}
