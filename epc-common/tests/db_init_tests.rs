//! Tests for database initialization
//!
//! Covers first-run creation, reopening an existing file, and the seeded
//! registries surviving repeated startups.

use epc_common::db::init::init_database;
use epc_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use epc_common::db::registry::{ATTRIBUTE_SEEDS, CATEGORY_SEEDS};
use tempfile::TempDir;

#[tokio::test]
async fn test_creates_nested_path_then_reopens() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("data").join("catalog.db");
    assert!(!db_path.exists());

    init_database(&db_path).await.unwrap().close().await;
    assert!(db_path.exists());

    let reopened = init_database(&db_path).await;
    assert!(reopened.is_ok(), "reopen failed: {:?}", reopened.err());
}

#[tokio::test]
async fn test_registries_seeded_once_across_restarts() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    init_database(&db_path).await.unwrap().close().await;
    let pool = init_database(&db_path).await.unwrap();

    let attributes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attribute_definitions")
        .fetch_one(&pool)
        .await
        .unwrap();
    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(attributes as usize, ATTRIBUTE_SEEDS.len());
    assert_eq!(categories as usize, CATEGORY_SEEDS.len());
    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("catalog.db")).await.unwrap();

    let orphan = sqlx::query(
        "INSERT INTO programs (guid, organization_id, name, slug) VALUES ('p1', 'missing', 'X', 'x')",
    )
    .execute(&pool)
    .await;

    assert!(orphan.is_err(), "program without organization must be rejected");
}
