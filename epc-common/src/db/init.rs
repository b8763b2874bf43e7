//! Database initialization
//!
//! Opens (or creates) the catalog database, applies connection pragmas,
//! creates every table idempotently, runs versioned migrations and seeds the
//! static registries. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout; lock waits beyond it surface as errors for the retry layer
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas are per connection, so they go on the connect options rather
    // than through a one-off query.
    // WAL lets the listing service read while an import is running.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    // The pipeline is a single writer; a small pool is enough for the
    // occasional concurrent read.
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    prepare(&pool).await?;

    Ok(pool)
}

/// Initialize a private in-memory database with the full schema
///
/// Used by dry runs and tests. A single connection that is never recycled
/// keeps every query on the same in-memory database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    prepare(&pool).await?;

    Ok(pool)
}

async fn prepare(pool: &SqlitePool) -> Result<()> {
    create_schema(pool).await?;

    // Patch databases created by older builds
    crate::db::migrations::run_migrations(pool).await?;

    crate::db::registry::seed_attribute_definitions(pool).await?;
    crate::db::registry::seed_categories(pool).await?;

    Ok(())
}

/// Create all catalog tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_organizations_table(pool).await?;
    create_programs_table(pool).await?;
    create_attribute_definitions_table(pool).await?;
    create_program_attributes_table(pool).await?;
    create_categories_table(pool).await?;
    create_program_categories_table(pool).await?;
    create_import_runs_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_organizations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL DEFAULT 'organization'
                CHECK (type IN ('university', 'government', 'nonprofit', 'organization')),
            website TEXT,
            city TEXT,
            state TEXT,
            country TEXT,
            verification_status TEXT NOT NULL DEFAULT 'pending'
                CHECK (verification_status IN ('pending', 'verified')),
            trust_score REAL NOT NULL DEFAULT 0.0
                CHECK (trust_score >= 0.0 AND trust_score <= 5.0),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_programs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS programs (
            guid TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL REFERENCES organizations(guid),
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            description TEXT,
            program_type TEXT NOT NULL DEFAULT 'program',
            target_audience TEXT,
            duration_value INTEGER,
            selectivity_tier TEXT NOT NULL DEFAULT 'open'
                CHECK (selectivity_tier IN ('elite', 'highly_selective', 'selective', 'open')),
            estimated_acceptance_rate REAL
                CHECK (estimated_acceptance_rate IS NULL
                       OR (estimated_acceptance_rate >= 0 AND estimated_acceptance_rate <= 100)),
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (organization_id, slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attribute_definitions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attribute_definitions (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            data_type TEXT NOT NULL
                CHECK (data_type IN ('string', 'integer', 'decimal', 'boolean', 'date', 'json', 'array')),
            category TEXT NOT NULL,
            applies_to TEXT NOT NULL DEFAULT 'programs'
                CHECK (applies_to IN ('programs', 'organizations'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_program_attributes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS program_attributes (
            guid TEXT PRIMARY KEY,
            program_id TEXT NOT NULL REFERENCES programs(guid) ON DELETE CASCADE,
            attribute_definition_id TEXT NOT NULL REFERENCES attribute_definitions(guid),
            value_string TEXT,
            value_integer INTEGER,
            value_decimal REAL,
            value_boolean INTEGER,
            value_date TEXT,
            value_json TEXT,
            value_array TEXT,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (program_id, attribute_definition_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            category_type TEXT NOT NULL CHECK (category_type IN ('subject', 'demographic')),
            parent_id TEXT REFERENCES categories(guid),
            UNIQUE (slug, category_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_program_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS program_categories (
            program_id TEXT NOT NULL REFERENCES programs(guid) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(guid),
            is_primary INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (program_id, category_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_import_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_runs (
            run_id TEXT PRIMARY KEY,
            input_path TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            total INTEGER NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL,
            skipped INTEGER NOT NULL,
            errors INTEGER NOT NULL,
            cancelled INTEGER NOT NULL DEFAULT 0,
            report TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
