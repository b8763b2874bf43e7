//! Program category links

use crate::error::IngestResult;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Category to link, with its primary flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLink {
    pub category_id: Uuid,
    pub is_primary: bool,
}

/// Link a program to categories
///
/// Runs in one transaction: existing primary flags for the program are
/// cleared first, so at most one link stays primary. Existing links are kept;
/// links are only ever added or re-flagged.
pub async fn link_program_categories(
    pool: &SqlitePool,
    program_id: Uuid,
    links: &[CategoryLink],
) -> IngestResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE program_categories SET is_primary = 0 WHERE program_id = ?")
        .bind(program_id.to_string())
        .execute(&mut *tx)
        .await?;

    for link in links {
        sqlx::query(
            r#"
            INSERT INTO program_categories (program_id, category_id, is_primary, created_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(program_id, category_id) DO UPDATE SET
                is_primary = excluded.is_primary
            "#,
        )
        .bind(program_id.to_string())
        .bind(link.category_id.to_string())
        .bind(link.is_primary)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Category slugs linked to a program as (slug, is_primary), sorted by slug
pub async fn load_program_categories(
    pool: &SqlitePool,
    program_id: Uuid,
) -> IngestResult<Vec<(String, bool)>> {
    let rows = sqlx::query(
        r#"
        SELECT c.slug, pc.is_primary
        FROM program_categories pc
        JOIN categories c ON c.guid = pc.category_id
        WHERE pc.program_id = ?
        ORDER BY c.slug
        "#,
    )
    .bind(program_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get("slug"), row.get::<bool, _>("is_primary")))
        .collect())
}
