//! Implementation of the `bffgen watch` command.
//!
//! Runs one regeneration up front, then one per settled config change until
//! SIGINT/SIGTERM. When the OS cannot watch files, falls back to
//! regenerating each time Enter is pressed.

use std::io::BufRead;
use std::path::Path;
use std::process::{Child, Command};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{debug, error, info, instrument, warn};

use bffgen_adapters::{ConfigWatcher, WatchEvent, WatchSettings};
use bffgen_core::application::{GenerationMode, Regenerator};
use bffgen_core::domain::{FileDiff, GenerationState};

use super::{RunOptions, build_regenerator, generate::print_report};
use crate::{
    cli::{GlobalArgs, WatchArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

enum Control {
    Regenerate,
    Stop,
}

/// Execute `bffgen watch`.
#[instrument(skip_all)]
pub fn execute(
    args: WatchArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let config_path = global.config_path();
    let debounce = Duration::from_millis(args.debounce_ms.unwrap_or(config.watch.debounce_ms));

    let regenerator = build_regenerator(
        &global,
        RunOptions {
            mode: GenerationMode::Write,
            force: false,
            backup: config.generate.backup && !args.no_backup,
            show_diff: config.watch.show_diff && !args.no_diff,
        },
    );
    let state = regenerator.load_state()?;
    let restarter = config
        .watch
        .restart_command
        .clone()
        .filter(|cmd| !args.no_restart && !cmd.trim().is_empty())
        .map(Restarter::new);

    let session = Arc::new(Session {
        regenerator,
        state: Mutex::new(state),
        output,
        restarter: Mutex::new(restarter),
    });

    session.run_cycle(&config_path);

    let (control_tx, control_rx) = mpsc::channel();
    let mut signals = Signals::new([SIGINT, SIGTERM])
        .with_cli_context(|| "registering signal handlers")?;
    let signal_handle = signals.handle();
    let signal_tx = control_tx.clone();
    let signal_thread = thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            debug!(signal, "Shutdown signal received");
            let _ = signal_tx.send(Control::Stop);
        }
    });

    let cycle_session = Arc::clone(&session);
    let mut watcher = ConfigWatcher::new(
        [&config_path],
        WatchSettings::default().with_debounce(debounce),
        move |path| cycle_session.run_cycle(path),
    )?;

    match watcher.start() {
        Ok(()) => {
            session.output.info(&format!(
                "Watching {} (debounce {} ms). Press Ctrl+C to stop.",
                config_path.display(),
                debounce.as_millis()
            ))?;
        }
        Err(e) => {
            warn!(error = %e, "Falling back to manual regeneration");
            session.output.warning_stderr(&format!(
                "{e}. Press Enter to regenerate, Ctrl+C to stop."
            ))?;
            watcher.start_pipeline()?;
            spawn_stdin_reader(control_tx.clone());
        }
    }
    drop(control_tx);

    while let Ok(control) = control_rx.recv() {
        match control {
            Control::Regenerate => {
                watcher.submit(WatchEvent::modified(&config_path));
            }
            Control::Stop => break,
        }
    }

    session.output.info("Stopping…")?;
    watcher.stop();
    signal_handle.close();
    if signal_thread.join().is_err() {
        error!("Signal thread panicked");
    }
    session.shutdown();
    Ok(())
}

/// Lines on stdin request a regeneration. The thread is left running on
/// exit; it only ever blocks on stdin.
fn spawn_stdin_reader(tx: mpsc::Sender<Control>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.send(Control::Regenerate).is_err() {
                break;
            }
        }
    });
}

/// State shared between the main thread and watch workers.
struct Session {
    regenerator: Regenerator,
    state: Mutex<GenerationState>,
    output: OutputManager,
    restarter: Mutex<Option<Restarter>>,
}

impl Session {
    /// One regeneration. Errors are printed and watching continues; the
    /// files on disk stay as they were before a failed config load.
    fn run_cycle(&self, config_path: &Path) {
        let Ok(mut state) = self.state.lock() else {
            error!("Ledger lock poisoned; skipping regeneration");
            return;
        };

        let _ = self.output.header(&format!(
            "[{}] regenerating from {}",
            chrono::Local::now().format("%H:%M:%S"),
            config_path.display()
        ));

        // each diff is shown before its file is replaced
        let mut show_diff = |diff: &FileDiff| {
            if let Err(e) = self.output.diff(diff) {
                debug!(error = %e, "Failed to print diff");
            }
        };
        match self
            .regenerator
            .regenerate_with(config_path, &mut state, &mut show_diff)
        {
            Ok(report) => {
                if let Err(e) = print_report(&self.output, &report, false) {
                    debug!(error = %e, "Failed to print report");
                }
                let wrote = report.outcomes.iter().any(|o| o.status.is_written());
                if report.failures.is_empty() {
                    self.restart(wrote);
                }
            }
            Err(e) => {
                let err = CliError::from(e);
                err.log();
                let _ = self.output.error_stderr(&err.to_string());
                for suggestion in err.suggestions() {
                    let _ = self.output.error_stderr(&format!("  {suggestion}"));
                }
            }
        }
    }

    fn restart(&self, wrote: bool) {
        let Ok(mut guard) = self.restarter.lock() else {
            return;
        };
        if let Some(restarter) = guard.as_mut() {
            if wrote || !restarter.is_running() {
                restarter.restart();
            }
        }
    }

    fn shutdown(&self) {
        if let Ok(mut guard) = self.restarter.lock() {
            if let Some(restarter) = guard.as_mut() {
                restarter.stop();
            }
        }
    }
}

/// Keeps at most one child process running the restart command.
struct Restarter {
    command: String,
    child: Option<Child>,
}

impl Restarter {
    fn new(command: String) -> Self {
        Self {
            command,
            child: None,
        }
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.as_mut().map(Child::try_wait), Some(Ok(None)))
    }

    fn restart(&mut self) {
        self.stop();
        match shell_command(&self.command).spawn() {
            Ok(child) => {
                info!(pid = child.id(), command = %self.command, "Restart command started");
                self.child = Some(child);
            }
            Err(e) => warn!(command = %self.command, error = %e, "Failed to run restart command"),
        }
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
            debug!("Previous restart child stopped");
        }
    }
}

fn shell_command(command: &str) -> Command {
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn restarter_replaces_the_running_child() {
        let mut restarter = Restarter::new("sleep 5".into());
        restarter.restart();
        assert!(restarter.is_running());
        let first = restarter.child.as_ref().map(Child::id);

        restarter.restart();
        assert!(restarter.is_running());
        assert_ne!(restarter.child.as_ref().map(Child::id), first);

        restarter.stop();
        assert!(!restarter.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn finished_child_is_not_running() {
        let mut restarter = Restarter::new("true".into());
        restarter.restart();
        let mut child = restarter.child.take().unwrap();
        child.wait().unwrap();
        restarter.child = Some(child);
        assert!(!restarter.is_running());
    }
}
