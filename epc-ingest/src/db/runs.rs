//! Import run ledger and catalog statistics

use crate::error::IngestResult;
use crate::workflow::report::{MigrationReport, ReportCounters};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// Summary of one recorded run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub input_path: String,
    pub started_at: String,
    pub finished_at: String,
    pub cancelled: bool,
    pub counters: ReportCounters,
}

/// Row counts across the catalog tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub organizations: i64,
    pub programs: i64,
    pub program_attributes: i64,
    pub categories: i64,
    pub program_categories: i64,
}

/// Record a finished run with its full report
pub async fn save_run(pool: &SqlitePool, report: &MigrationReport) -> IngestResult<()> {
    let counters = report.counters();

    sqlx::query(
        r#"
        INSERT INTO import_runs (
            run_id, input_path, started_at, finished_at,
            total, created, updated, skipped, errors, cancelled, report
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.run_id().to_string())
    .bind(report.input_path())
    .bind(report.started_at().to_rfc3339())
    .bind(report.finished_at().to_rfc3339())
    .bind(counters.total as i64)
    .bind(counters.created as i64)
    .bind(counters.updated as i64)
    .bind(counters.skipped as i64)
    .bind(counters.errors as i64)
    .bind(report.cancelled())
    .bind(report.to_json_pretty()?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recently finished run, if any
pub async fn latest_run(pool: &SqlitePool) -> IngestResult<Option<RunSummary>> {
    let row = sqlx::query(
        r#"
        SELECT run_id, input_path, started_at, finished_at,
               total, created, updated, skipped, errors, cancelled
        FROM import_runs
        ORDER BY finished_at DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| RunSummary {
        run_id: row.get("run_id"),
        input_path: row.get("input_path"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
        cancelled: row.get("cancelled"),
        counters: ReportCounters {
            total: row.get::<i64, _>("total") as u64,
            created: row.get::<i64, _>("created") as u64,
            updated: row.get::<i64, _>("updated") as u64,
            skipped: row.get::<i64, _>("skipped") as u64,
            errors: row.get::<i64, _>("errors") as u64,
        },
    }))
}

/// Count rows in every catalog table
pub async fn entity_counts(pool: &SqlitePool) -> IngestResult<EntityCounts> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM organizations) AS organizations,
            (SELECT COUNT(*) FROM programs) AS programs,
            (SELECT COUNT(*) FROM program_attributes) AS program_attributes,
            (SELECT COUNT(*) FROM categories) AS categories,
            (SELECT COUNT(*) FROM program_categories) AS program_categories
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(EntityCounts {
        organizations: row.get("organizations"),
        programs: row.get("programs"),
        program_attributes: row.get("program_attributes"),
        categories: row.get("categories"),
        program_categories: row.get("program_categories"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::report::ReportBuilder;
    use epc_common::db::init::init_memory_database;

    #[tokio::test]
    async fn test_save_and_read_latest_run() {
        let pool = init_memory_database().await.unwrap();
        assert!(latest_run(&pool).await.unwrap().is_none());

        let mut builder = ReportBuilder::new("programs.json");
        builder.record_seen();
        builder.record_created();
        let report = builder.finish();
        save_run(&pool, &report).await.unwrap();

        let latest = latest_run(&pool).await.unwrap().unwrap();
        assert_eq!(latest.run_id, report.run_id().to_string());
        assert_eq!(latest.counters.created, 1);
        assert!(!latest.cancelled);

        let stored: String = sqlx::query_scalar("SELECT report FROM import_runs WHERE run_id = ?")
            .bind(&latest.run_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        let parsed: MigrationReport = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, report);
    }

    #[tokio::test]
    async fn test_entity_counts_include_seeded_categories() {
        let pool = init_memory_database().await.unwrap();
        let counts = entity_counts(&pool).await.unwrap();
        assert_eq!(counts.organizations, 0);
        assert_eq!(counts.programs, 0);
        assert_eq!(counts.categories, 16);
    }
}
