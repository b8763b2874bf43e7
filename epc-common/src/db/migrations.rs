//! Database schema migrations
//!
//! Versioned, idempotent upgrades for catalog databases created by older
//! builds. `init::create_schema` always creates tables in their current
//! shape; migrations only patch what an older file is missing.
//!
//! Released migrations are frozen. A schema change gets a new version, a new
//! arm in [`run_migrations`] and a bump of [`CURRENT_SCHEMA_VERSION`]; each
//! step must tolerate running against a database that already has it.

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Schema version this build writes
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Highest version recorded in `schema_version`, or 0 for a database that
/// predates the table
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await?;

    if !has_table {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply every migration above the recorded version, in order
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let from = get_schema_version(pool).await?;

    if from > CURRENT_SCHEMA_VERSION {
        warn!(
            schema_version = from,
            supported = CURRENT_SCHEMA_VERSION,
            "catalog database was written by a newer build; leaving schema untouched"
        );
        return Ok(());
    }
    if from == CURRENT_SCHEMA_VERSION {
        debug!(schema_version = from, "catalog schema up to date");
        return Ok(());
    }

    info!(from, to = CURRENT_SCHEMA_VERSION, "migrating catalog schema");

    for version in (from + 1)..=CURRENT_SCHEMA_VERSION {
        match version {
            // Baseline: tables come from init::create_schema
            1 => {}
            2 => add_lookup_indexes(pool).await?,
            3 => add_run_cancelled_flag(pool).await?,
            other => {
                return Err(Error::Schema(format!("no migration registered for v{}", other)))
            }
        }
        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(pool)
            .await?;
        info!(version, "schema migration applied");
    }

    Ok(())
}

/// v2: lookup indexes used by the listing service
async fn add_lookup_indexes(pool: &SqlitePool) -> Result<()> {
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_programs_organization ON programs(organization_id)",
        "CREATE INDEX IF NOT EXISTS idx_programs_selectivity ON programs(selectivity_tier)",
        "CREATE INDEX IF NOT EXISTS idx_program_attributes_definition ON program_attributes(attribute_definition_id)",
        "CREATE INDEX IF NOT EXISTS idx_program_categories_category ON program_categories(category_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// v3: `import_runs.cancelled`, absent from ledgers written before
/// interrupted runs were recorded
async fn add_run_cancelled_flag(pool: &SqlitePool) -> Result<()> {
    let present: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('import_runs') WHERE name = 'cancelled'",
    )
    .fetch_one(pool)
    .await?;

    if present > 0 {
        debug!("import_runs.cancelled already present");
        return Ok(());
    }

    sqlx::query("ALTER TABLE import_runs ADD COLUMN cancelled INTEGER NOT NULL DEFAULT 0")
        .execute(pool)
        .await?;
    Ok(())
}
