//! Test Helper Utilities
//!
//! Shared setup for epc-ingest integration tests

#![allow(dead_code)]

use epc_common::db::init::init_database;
use epc_ingest::config::IngestConfig;
use epc_ingest::workflow::{MigrationReport, Orchestrator};
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Create a temporary on-disk catalog database
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_database(&temp_dir.path().join("catalog.db"))
        .await
        .expect("Failed to initialize test database");
    (temp_dir, pool)
}

/// Configuration pointing into the test directory, without batch delays
pub fn test_config(temp_dir: &TempDir) -> IngestConfig {
    IngestConfig {
        database_path: temp_dir.path().join("catalog.db"),
        report_dir: temp_dir.path().join("reports"),
        batch_size: 50,
        batch_delay: Duration::ZERO,
        max_lock_wait_ms: 200,
        default_country: "USA".to_string(),
    }
}

/// Run the whole pipeline once over `records`
pub async fn run_records(pool: &SqlitePool, config: &IngestConfig, records: &[Value]) -> MigrationReport {
    Orchestrator::new(pool.clone(), config.clone())
        .await
        .expect("Failed to build orchestrator")
        .run("test-input.json", records, &CancellationToken::new())
        .await
        .expect("Import aborted")
}

/// Row count of a table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

/// Install a trigger that aborts inserts into `table` when `condition` holds
pub async fn reject_inserts(pool: &SqlitePool, name: &str, table: &str, condition: &str) {
    let sql = format!(
        "CREATE TRIGGER {name} BEFORE INSERT ON {table} WHEN {condition} \
         BEGIN SELECT RAISE(ABORT, '{name} rejected the row'); END"
    );
    sqlx::query(&sql)
        .execute(pool)
        .await
        .expect("Failed to create trigger");
}
