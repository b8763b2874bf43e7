//! Organization database operations
//!
//! Organizations are deduplicated by slug. Inserts ignore slug conflicts so a
//! concurrent writer (or a previous run) wins and the existing row is reused.

use super::parse_guid;
use crate::error::IngestResult;
use crate::models::OrganizationDraft;
use epc_common::db::models::{OrganizationType, VerificationStatus};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Organization row
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub org_type: OrganizationType,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub verification_status: VerificationStatus,
    pub trust_score: f64,
}

/// Insert a new organization unless the slug is already taken
///
/// Returns true when a row was inserted. New organizations start pending
/// with a zero trust score.
pub async fn insert_organization(
    pool: &SqlitePool,
    guid: Uuid,
    draft: &OrganizationDraft,
) -> IngestResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO organizations (
            guid, name, slug, type, website, city, state, country,
            verification_status, trust_score, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', 0.0, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(slug) DO NOTHING
        "#,
    )
    .bind(guid.to_string())
    .bind(&draft.name)
    .bind(&draft.slug)
    .bind(draft.org_type.to_db_string())
    .bind(&draft.website)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.country)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fill website and location columns that are still null
///
/// Values already stored are never overwritten. Returns true when a column
/// changed.
pub async fn fill_missing_fields(
    pool: &SqlitePool,
    guid: Uuid,
    draft: &OrganizationDraft,
) -> IngestResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE organizations SET
            website = COALESCE(website, ?),
            city = COALESCE(city, ?),
            state = COALESCE(state, ?),
            country = COALESCE(country, ?),
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
          AND ((website IS NULL AND ? IS NOT NULL)
            OR (city IS NULL AND ? IS NOT NULL)
            OR (state IS NULL AND ? IS NOT NULL)
            OR (country IS NULL AND ? IS NOT NULL))
        "#,
    )
    .bind(&draft.website)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.country)
    .bind(guid.to_string())
    .bind(&draft.website)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.country)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load organization by slug
pub async fn load_organization_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> IngestResult<Option<Organization>> {
    let row = sqlx::query(
        r#"
        SELECT guid, name, slug, type, website, city, state, country,
               verification_status, trust_score
        FROM organizations
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid: String = row.get("guid");
            let org_type: String = row.get("type");
            let status: String = row.get("verification_status");

            Ok(Some(Organization {
                guid: parse_guid(&guid)?,
                name: row.get("name"),
                slug: row.get("slug"),
                org_type: OrganizationType::from_db_string(&org_type)
                    .unwrap_or(OrganizationType::Organization),
                website: row.get("website"),
                city: row.get("city"),
                state: row.get("state"),
                country: row.get("country"),
                verification_status: VerificationStatus::from_db_string(&status)
                    .unwrap_or(VerificationStatus::Pending),
                trust_score: row.get("trust_score"),
            }))
        }
        None => Ok(None),
    }
}
