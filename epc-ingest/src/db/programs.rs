//! Program database operations
//!
//! A program is identified by (organization_id, slug). Re-importing the same
//! record updates the row in place.

use super::parse_guid;
use crate::error::IngestResult;
use crate::models::NormalizedProgram;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Whether an upsert created a new row or rewrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Find a program id by its identity
pub async fn find_program_id(
    pool: &SqlitePool,
    organization_id: Uuid,
    slug: &str,
) -> IngestResult<Option<Uuid>> {
    let guid: Option<String> =
        sqlx::query_scalar("SELECT guid FROM programs WHERE organization_id = ? AND slug = ?")
            .bind(organization_id.to_string())
            .bind(slug)
            .fetch_optional(pool)
            .await?;

    guid.as_deref().map(parse_guid).transpose()
}

/// Insert or update a program under its organization
pub async fn upsert_program(
    pool: &SqlitePool,
    organization_id: Uuid,
    program: &NormalizedProgram,
) -> IngestResult<(Uuid, UpsertOutcome)> {
    if let Some(guid) = find_program_id(pool, organization_id, &program.slug).await? {
        update_program(pool, guid, program).await?;
        return Ok((guid, UpsertOutcome::Updated));
    }

    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO programs (
            guid, organization_id, name, slug, description, program_type, target_audience,
            duration_value, selectivity_tier, estimated_acceptance_rate, status,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(organization_id.to_string())
    .bind(&program.name)
    .bind(&program.slug)
    .bind(&program.description)
    .bind(program.program_type.to_db_string())
    .bind(&program.target_audience)
    .bind(program.duration_value)
    .bind(program.selectivity_tier.to_db_string())
    .bind(program.estimated_acceptance_rate)
    .bind(program.status.to_db_string())
    .execute(pool)
    .await?;

    Ok((guid, UpsertOutcome::Created))
}

async fn update_program(pool: &SqlitePool, guid: Uuid, program: &NormalizedProgram) -> IngestResult<()> {
    sqlx::query(
        r#"
        UPDATE programs SET
            name = ?,
            description = ?,
            program_type = ?,
            target_audience = ?,
            duration_value = ?,
            selectivity_tier = ?,
            estimated_acceptance_rate = ?,
            status = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&program.name)
    .bind(&program.description)
    .bind(program.program_type.to_db_string())
    .bind(&program.target_audience)
    .bind(program.duration_value)
    .bind(program.selectivity_tier.to_db_string())
    .bind(program.estimated_acceptance_rate)
    .bind(program.status.to_db_string())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Program slugs owned by an organization, sorted
pub async fn list_program_slugs(pool: &SqlitePool, organization_id: Uuid) -> IngestResult<Vec<String>> {
    let rows = sqlx::query("SELECT slug FROM programs WHERE organization_id = ? ORDER BY slug")
        .bind(organization_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|row| row.get("slug")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::organizations::insert_organization;
    use crate::models::OrganizationDraft;
    use epc_common::db::init::init_memory_database;
    use epc_common::db::models::{OrganizationType, ProgramStatus, ProgramType, SelectivityTier};

    async fn setup() -> (SqlitePool, Uuid) {
        let pool = init_memory_database().await.unwrap();
        let org_id = Uuid::new_v4();
        let draft = OrganizationDraft {
            name: "CEE".to_string(),
            slug: "cee".to_string(),
            org_type: OrganizationType::Nonprofit,
            website: None,
            city: None,
            state: None,
            country: None,
        };
        insert_organization(&pool, org_id, &draft).await.unwrap();
        (pool, org_id)
    }

    fn program(description: &str) -> NormalizedProgram {
        NormalizedProgram {
            name: "Research Science Institute".to_string(),
            slug: "research-science-institute".to_string(),
            description: Some(description.to_string()),
            program_type: ProgramType::SummerProgram,
            target_audience: Some("Grades 11-12".to_string()),
            duration_value: Some(6),
            selectivity_tier: SelectivityTier::Elite,
            estimated_acceptance_rate: Some(3.0),
            status: ProgramStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let (pool, org_id) = setup().await;

        let (first, outcome) = upsert_program(&pool, org_id, &program("v1")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let (second, outcome) = upsert_program(&pool, org_id, &program("v2")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(first, second);

        let description: Option<String> =
            sqlx::query_scalar("SELECT description FROM programs WHERE guid = ?")
                .bind(first.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(description.as_deref(), Some("v2"));
        assert_eq!(list_program_slugs(&pool, org_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_organization_rejected() {
        let (pool, _) = setup().await;

        let err = upsert_program(&pool, Uuid::new_v4(), &program("x")).await.unwrap_err();
        assert!(!err.is_fatal());
    }
}
