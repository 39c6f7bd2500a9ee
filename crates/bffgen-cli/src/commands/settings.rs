//! `bffgen settings`: read and initialise bffgen's own settings.

use std::path::PathBuf;

use crate::{
    cli::{GlobalArgs, SettingsCommands},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct settings subcommand.
pub fn execute(
    cmd: SettingsCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        SettingsCommands::Get { key } => {
            let value = get_setting(&config, &key)?;
            output.print(&format!("{key} = {value:?}"))?;
        }

        SettingsCommands::List => {
            output.header("Current Settings:")?;
            output.print(&to_toml(&config)?)?;
        }

        SettingsCommands::Path => {
            output.print(&settings_path(&global).display().to_string())?;
        }

        SettingsCommands::Init { force } => {
            let path = settings_path(&global);
            if path.exists() && !force {
                return Err(CliError::SettingsExist { path });
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_cli_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(&path, to_toml(&AppConfig::default())?)
                .with_cli_context(|| format!("writing {}", path.display()))?;
            output.success(&format!("Wrote default settings to {}", path.display()))?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn settings_path(global: &GlobalArgs) -> PathBuf {
    global.settings.clone().unwrap_or_else(AppConfig::config_path)
}

fn to_toml(config: &AppConfig) -> CliResult<String> {
    toml::to_string_pretty(config).map_err(|e| CliError::Settings {
        message: format!("Failed to serialise settings: {e}"),
        source: Some(Box::new(e)),
    })
}

fn get_setting(config: &AppConfig, key: &str) -> CliResult<String> {
    config.get(key).ok_or_else(|| CliError::Settings {
        message: format!(
            "Unknown settings key: '{key}' (known: {})",
            AppConfig::KEYS.join(", ")
        ),
        source: None,
    })
}

// ── tests ─────────────────────────────────────────────────────────────────────
