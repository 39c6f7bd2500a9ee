//! `bffgen state`: inspect or reset the generation ledger.

use bffgen_core::application::StateStore;

use super::state_store;
use crate::{
    cli::{GlobalArgs, StateCommands},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct state subcommand.
pub fn execute(cmd: StateCommands, global: GlobalArgs, output: OutputManager) -> CliResult<()> {
    let store = state_store(&global);

    match cmd {
        StateCommands::Show { json } => {
            let state = store.load()?;
            if json {
                let text = serde_json::to_string_pretty(&state).map_err(|e| CliError::InvalidInput {
                    message: format!("Failed to encode ledger: {e}"),
                    source: Some(Box::new(e)),
                })?;
                output.print(&text)?;
                return Ok(());
            }

            output.header(&format!("Ledger: {}", store.location().display()))?;
            if state.is_empty() {
                output.info("Nothing generated yet")?;
                return Ok(());
            }
            output.print(&format!("  version:        {}", state.version))?;
            if let Some(project_type) = state.project_type {
                output.print(&format!("  project type:   {project_type}"))?;
            }
            if let Some(at) = state.last_generation {
                output.print(&format!("  last generated: {}", at.to_rfc3339()))?;
            }

            output.header(&format!("Routes ({})", state.route_count()))?;
            for route in state.routes() {
                output.print(&format!(
                    "  {} {} ({})",
                    route.method, route.expose_as, route.service
                ))?;
            }

            output.header("Files")?;
            for (path, file) in state.files() {
                let short = file
                    .content_hash
                    .strip_prefix("sha256:")
                    .unwrap_or(&file.content_hash);
                output.print(&format!(
                    "  {path}  {}  {}",
                    &short[..short.len().min(12)],
                    file.last_generated_at.to_rfc3339()
                ))?;
            }
        }

        StateCommands::Reset => {
            if store.delete()? {
                output.success(&format!("Removed {}", store.location().display()))?;
            } else {
                output.info(&format!("No ledger at {}", store.location().display()))?;
            }
        }

        StateCommands::Path => {
            output.print(&store.location().display().to_string())?;
        }
    }

    Ok(())
}
