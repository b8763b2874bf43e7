//! Configuration loading and default path resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Steps 1 and 2 belong to each binary's argument parser; this module covers
//! the TOML file and the compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config and data directories
pub const APP_DIR_NAME: &str = "epc";

/// Settings read from a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    /// Path of the catalog SQLite database
    pub database_path: Option<PathBuf>,
    /// Directory receiving migration report artifacts
    pub report_dir: Option<PathBuf>,
    /// Records per batch
    pub batch_size: Option<usize>,
    /// Pause between batches, milliseconds
    pub batch_delay_ms: Option<u64>,
    /// Maximum total wait on a locked database before giving up, milliseconds
    pub max_lock_wait_ms: Option<u64>,
    /// Country recorded for organizations whose location is known
    pub default_country: Option<String>,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset (e.g. "info", "epc_ingest=debug")
    pub filter: Option<String>,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the TOML config from an explicit path, or the per-user default if present
///
/// An explicit path that cannot be read is an error; a missing default file
/// yields an empty config.
pub fn resolve_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_file("ingest.toml") {
        Some(path) if path.exists() => load_toml_config(&path),
        _ => Ok(TomlConfig::default()),
    }
}

/// Per-user config file path (`~/.config/epc/<file_name>` on Linux)
pub fn default_config_file(file_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(file_name))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    default_data_dir().join("catalog.db")
}

/// OS-dependent default data directory
pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/epc (or /var/lib/epc for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib/epc"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/epc"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\epc"))
    } else {
        PathBuf::from("./epc_data")
    }
}
