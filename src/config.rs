// Configuration File Support
//
// This module provides configuration file parsing for the CallTally tracker.
// Supports TOML format with environment variable overrides.
// Configuration files are loaded from XDG config directory: ~/.config/calltally/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Emit per-call diagnostic output (record/check tracing at debug level)
    pub diagnostics: bool,

    /// Log level for the tracker's own output (trace, debug, info, warn, error)
    pub log_level: String,

    /// Directory where unnamed `save()` snapshots are written
    pub snapshot_dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            diagnostics: false,
            log_level: "info".to_string(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// Get the default snapshot directory
///
/// Returns `~/.local/share/calltally/snapshots` on Linux (XDG data dir)
fn default_snapshot_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "calltally", "CallTally") {
        proj_dirs.data_dir().join("snapshots")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("calltally")
            .join("snapshots")
    }
}

impl TrackerConfig {
    /// Load configuration from the default XDG config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file from {:?}", path))?;

        let config: TrackerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file from {:?}", path))?;

        let config = config.apply_env_overrides();
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/calltally/config.toml` on Linux/Mac
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "calltally", "CallTally") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("calltally")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - CALLTALLY_DIAGNOSTICS
    /// - CALLTALLY_LOG_LEVEL
    /// - CALLTALLY_SNAPSHOT_DIR
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("CALLTALLY_DIAGNOSTICS") {
            self.diagnostics = val.parse().unwrap_or(self.diagnostics);
        }
        if let Ok(level) = std::env::var("CALLTALLY_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(dir) = std::env::var("CALLTALLY_SNAPSHOT_DIR") {
            if !dir.is_empty() {
                self.snapshot_dir = PathBuf::from(dir);
            }
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if self.snapshot_dir.as_os_str().is_empty() {
            anyhow::bail!("Snapshot directory must not be empty");
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}
