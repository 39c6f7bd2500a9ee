//! Tool settings.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns it; the core crate never sees it. These are settings for
//! bffgen itself, not the BFF config file that describes services.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables, `BFFGEN__WATCH__DEBOUNCE_MS=500`
//! 3. Settings file (`--settings`, else `config.toml` in the platform config dir)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub generate: GenerateConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a burst of saves counts as one change.
    pub debounce_ms: u64,
    /// Print a unified diff of every changed file.
    pub show_diff: bool,
    /// Shell command to (re)start after each successful regeneration.
    pub restart_command: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            show_diff: true,
            restart_command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Copy files into `.bffgen/backup` before overwriting them.
    pub backup: bool,
    /// Backups older than this are removed after a write run. 0 keeps all.
    pub backup_retention_hours: u64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            backup: true,
            backup_retention_hours: 168,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl AppConfig {
    /// Load settings. An explicit `settings_file` must exist; the default
    /// location is optional.
    pub fn load(settings_file: Option<&Path>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to encode default settings")?;

        let (path, required) = match settings_file {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_path(), false),
        };

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_path()).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix("BFFGEN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()
            .context("Invalid settings")
    }

    /// Path to the default settings file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.bffgen.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "bffgen", "bffgen")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".bffgen.toml"))
    }

    /// Look up one setting by dotted key.
    pub fn get(&self, key: &str) -> Option<String> {
        Some(match key {
            "watch.debounce_ms" => self.watch.debounce_ms.to_string(),
            "watch.show_diff" => self.watch.show_diff.to_string(),
            "watch.restart_command" => self.watch.restart_command.clone().unwrap_or_default(),
            "generate.backup" => self.generate.backup.to_string(),
            "generate.backup_retention_hours" => self.generate.backup_retention_hours.to_string(),
            "output.no_color" => self.output.no_color.to_string(),
            _ => return None,
        })
    }

    /// Every key [`AppConfig::get`] understands.
    pub const KEYS: &'static [&'static str] = &[
        "watch.debounce_ms",
        "watch.show_diff",
        "watch.restart_command",
        "generate.backup",
        "generate.backup_retention_hours",
        "output.no_color",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.watch.debounce_ms, 300);
        assert!(cfg.watch.show_diff);
        assert!(cfg.generate.backup);
        assert!(!cfg.output.no_color);
    }

    #[test]
    fn file_overrides_defaults_and_keeps_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[watch]\ndebounce_ms = 50\nrestart_command = \"go run ./cmd/server\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.watch.debounce_ms, 50);
        assert_eq!(cfg.watch.restart_command.as_deref(), Some("go run ./cmd/server"));
        assert!(cfg.watch.show_diff);
        assert_eq!(cfg.generate.backup_retention_hours, 168);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[watch]\ndebounce_ms = \"soon\"\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn every_listed_key_resolves() {
        let cfg = AppConfig::default();
        for key in AppConfig::KEYS {
            assert!(cfg.get(key).is_some(), "{key}");
        }
        assert_eq!(cfg.get("nope"), None);
    }

    #[test]
    fn serialises_to_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(text.contains("[watch]"));
        assert!(text.contains("debounce_ms = 300"));
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
