//! Configuration resolution for epc-ingest
//!
//! Provides multi-tier resolution with CLI → ENV → TOML → default priority.
//! The CLI and environment tiers arrive together as [`ConfigOverrides`]
//! (clap reads both); the TOML tier is an [`epc_common::config::TomlConfig`].

use crate::error::{IngestError, IngestResult};
use epc_common::config::{default_database_path, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Default records per batch
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default pause between batches
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;
/// Default maximum wait on a locked database
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;
/// Default country for organizations with a known city or state
pub const DEFAULT_COUNTRY: &str = "USA";

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub batch_delay_ms: Option<u64>,
    pub max_lock_wait_ms: Option<u64>,
}

/// Fully resolved pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub database_path: PathBuf,
    pub report_dir: PathBuf,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub max_lock_wait_ms: u64,
    pub default_country: String,
}

impl IngestConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: &TomlConfig) -> IngestResult<Self> {
        let config = Self {
            database_path: overrides
                .database_path
                .or_else(|| toml.database_path.clone())
                .unwrap_or_else(default_database_path),
            report_dir: overrides
                .report_dir
                .or_else(|| toml.report_dir.clone())
                .unwrap_or_else(|| PathBuf::from("reports")),
            batch_size: overrides
                .batch_size
                .or(toml.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            batch_delay: Duration::from_millis(
                overrides
                    .batch_delay_ms
                    .or(toml.batch_delay_ms)
                    .unwrap_or(DEFAULT_BATCH_DELAY_MS),
            ),
            max_lock_wait_ms: overrides
                .max_lock_wait_ms
                .or(toml.max_lock_wait_ms)
                .unwrap_or(DEFAULT_MAX_LOCK_WAIT_MS),
            default_country: toml
                .default_country
                .clone()
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        };

        config.validate()?;

        info!(
            database = %config.database_path.display(),
            batch_size = config.batch_size,
            batch_delay_ms = config.batch_delay.as_millis() as u64,
            "Configuration resolved"
        );

        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> IngestResult<()> {
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be at least 1".to_string()));
        }
        if self.default_country.trim().is_empty() {
            return Err(IngestError::Config("default_country must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            report_dir: PathBuf::from("reports"),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
            default_country: DEFAULT_COUNTRY.to_string(),
        }
    }
}
