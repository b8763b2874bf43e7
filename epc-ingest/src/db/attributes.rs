//! Program attribute database operations
//!
//! One row per (program, attribute definition). Rewriting an attribute
//! replaces every value column, so a row never carries a stale value in a
//! column other than the one its data type selects.

use crate::error::{IngestError, IngestResult};
use crate::models::attribute_value::ValueColumns;
use crate::models::AttributeValue;
use epc_common::db::models::DataType;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Insert or replace one attribute value for a program
pub async fn upsert_program_attribute(
    pool: &SqlitePool,
    program_id: Uuid,
    definition_id: Uuid,
    value: &AttributeValue,
) -> IngestResult<()> {
    let columns = value.to_columns();

    sqlx::query(
        r#"
        INSERT INTO program_attributes (
            guid, program_id, attribute_definition_id,
            value_string, value_integer, value_decimal, value_boolean,
            value_date, value_json, value_array, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(program_id, attribute_definition_id) DO UPDATE SET
            value_string = excluded.value_string,
            value_integer = excluded.value_integer,
            value_decimal = excluded.value_decimal,
            value_boolean = excluded.value_boolean,
            value_date = excluded.value_date,
            value_json = excluded.value_json,
            value_array = excluded.value_array,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(program_id.to_string())
    .bind(definition_id.to_string())
    .bind(columns.string)
    .bind(columns.integer)
    .bind(columns.decimal)
    .bind(columns.boolean)
    .bind(columns.date)
    .bind(columns.json)
    .bind(columns.array)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load every attribute of a program keyed by attribute name
pub async fn load_program_attributes(
    pool: &SqlitePool,
    program_id: Uuid,
) -> IngestResult<BTreeMap<String, AttributeValue>> {
    let rows = sqlx::query(
        r#"
        SELECT d.name, d.data_type,
               a.value_string, a.value_integer, a.value_decimal, a.value_boolean,
               a.value_date, a.value_json, a.value_array
        FROM program_attributes a
        JOIN attribute_definitions d ON d.guid = a.attribute_definition_id
        WHERE a.program_id = ?
        "#,
    )
    .bind(program_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut attributes = BTreeMap::new();
    for row in rows {
        let name: String = row.get("name");
        let data_type: String = row.get("data_type");
        let data_type = DataType::from_db_string(&data_type).ok_or_else(|| {
            IngestError::Persistence(format!("attribute {}: unknown data_type {}", name, data_type))
        })?;

        let columns = ValueColumns {
            string: row.get("value_string"),
            integer: row.get("value_integer"),
            decimal: row.get("value_decimal"),
            boolean: row.get("value_boolean"),
            date: row.get("value_date"),
            json: row.get("value_json"),
            array: row.get("value_array"),
        };
        let value = AttributeValue::from_columns(data_type, columns).ok_or_else(|| {
            IngestError::Persistence(format!("attribute {}: no readable {} value", name, data_type))
        })?;
        attributes.insert(name, value);
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epc_common::db::init::init_memory_database;
    use epc_common::db::registry::load_attribute_definitions;

    async fn insert_program(pool: &SqlitePool) -> Uuid {
        let org_id = Uuid::new_v4();
        sqlx::query("INSERT INTO organizations (guid, name, slug) VALUES (?, 'Org', 'org')")
            .bind(org_id.to_string())
            .execute(pool)
            .await
            .unwrap();
        let program_id = Uuid::new_v4();
        sqlx::query("INSERT INTO programs (guid, organization_id, name, slug) VALUES (?, ?, 'P', 'p')")
            .bind(program_id.to_string())
            .bind(org_id.to_string())
            .execute(pool)
            .await
            .unwrap();
        program_id
    }

    #[tokio::test]
    async fn test_rewrite_replaces_value() {
        let pool = init_memory_database().await.unwrap();
        let registry = load_attribute_definitions(&pool).await.unwrap();
        let program_id = insert_program(&pool).await;
        let definition = &registry["grade_level_min"];

        upsert_program_attribute(&pool, program_id, definition.id, &AttributeValue::Integer(9))
            .await
            .unwrap();
        upsert_program_attribute(&pool, program_id, definition.id, &AttributeValue::Integer(10))
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM program_attributes WHERE program_id = ?")
            .bind(program_id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let loaded = load_program_attributes(&pool, program_id).await.unwrap();
        assert_eq!(loaded["grade_level_min"], AttributeValue::Integer(10));
    }
}
