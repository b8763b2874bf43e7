//! Static registries: attribute definitions and the category taxonomy
//!
//! Both registries are seeded on every startup with conflict-ignore inserts,
//! so existing rows (and any manual edits to them) are left untouched.
//! Attributes that are not in the registry are never created on the fly.

use crate::db::models::{AppliesTo, CategoryType, DataType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Seed entry for an attribute definition
#[derive(Debug, Clone, Copy)]
pub struct AttributeSeed {
    pub name: &'static str,
    pub data_type: DataType,
    pub category: &'static str,
    pub applies_to: AppliesTo,
}

const fn attr(
    name: &'static str,
    data_type: DataType,
    category: &'static str,
    applies_to: AppliesTo,
) -> AttributeSeed {
    AttributeSeed {
        name,
        data_type,
        category,
        applies_to,
    }
}

/// Attribute definitions known to the catalog
pub const ATTRIBUTE_SEEDS: &[AttributeSeed] = &[
    attr("grade_level_min", DataType::Integer, "eligibility", AppliesTo::Programs),
    attr("grade_level_max", DataType::Integer, "eligibility", AppliesTo::Programs),
    attr("grade_level_note", DataType::String, "eligibility", AppliesTo::Programs),
    attr("cost_category", DataType::String, "cost", AppliesTo::Programs),
    attr("financial_aid", DataType::String, "cost", AppliesTo::Programs),
    attr("application_deadline", DataType::Date, "application", AppliesTo::Programs),
    attr("deadline_note", DataType::String, "application", AppliesTo::Programs),
    attr("application_requirements", DataType::Array, "application", AppliesTo::Programs),
    attr("key_benefits", DataType::String, "details", AppliesTo::Programs),
    attr("subject_area", DataType::String, "details", AppliesTo::Programs),
    attr("location_city", DataType::String, "location", AppliesTo::Programs),
    attr("location_state", DataType::String, "location", AppliesTo::Programs),
    attr("website", DataType::String, "contact", AppliesTo::Programs),
    attr("source_record", DataType::Json, "audit", AppliesTo::Programs),
    attr("founded_year", DataType::Integer, "profile", AppliesTo::Organizations),
    attr("accreditation", DataType::String, "profile", AppliesTo::Organizations),
];

/// Seed entry for a taxonomy category
#[derive(Debug, Clone, Copy)]
pub struct CategorySeed {
    pub name: &'static str,
    pub slug: &'static str,
    pub category_type: CategoryType,
    /// Slug of the parent category (same category_type)
    pub parent: Option<&'static str>,
}

const fn subject(name: &'static str, slug: &'static str, parent: Option<&'static str>) -> CategorySeed {
    CategorySeed {
        name,
        slug,
        category_type: CategoryType::Subject,
        parent,
    }
}

const fn demographic(name: &'static str, slug: &'static str) -> CategorySeed {
    CategorySeed {
        name,
        slug,
        category_type: CategoryType::Demographic,
        parent: None,
    }
}

/// Category taxonomy. Parents precede their children.
pub const CATEGORY_SEEDS: &[CategorySeed] = &[
    subject("STEM", "stem", None),
    subject("Computer Science", "computer-science", Some("stem")),
    subject("Mathematics", "mathematics", Some("stem")),
    subject("Engineering", "engineering", Some("stem")),
    subject("Biology", "biology", Some("stem")),
    subject("Chemistry", "chemistry", Some("stem")),
    subject("Physics", "physics", Some("stem")),
    subject("Environmental Science", "environmental-science", Some("stem")),
    subject("Research", "research", None),
    subject("Leadership", "leadership", None),
    subject("Business", "business", None),
    subject("Humanities", "humanities", None),
    subject("Arts", "arts", None),
    demographic("High School", "high-school"),
    demographic("Women in STEM", "women-in-stem"),
    demographic("Underrepresented Students", "underrepresented"),
];

/// Attribute definition row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: Uuid,
    pub name: String,
    pub data_type: DataType,
    pub category: String,
    pub applies_to: AppliesTo,
}

/// Category row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category_type: CategoryType,
    pub parent_id: Option<Uuid>,
}

/// Insert any missing attribute definitions
pub async fn seed_attribute_definitions(pool: &SqlitePool) -> Result<()> {
    let mut inserted = 0u64;
    for seed in ATTRIBUTE_SEEDS {
        let result = sqlx::query(
            r#"
            INSERT INTO attribute_definitions (guid, name, data_type, category, applies_to)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(seed.name)
        .bind(seed.data_type.to_db_string())
        .bind(seed.category)
        .bind(seed.applies_to.to_db_string())
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    debug!(inserted, "Attribute definitions seeded");
    Ok(())
}

/// Insert any missing categories, linking children to their parents
pub async fn seed_categories(pool: &SqlitePool) -> Result<()> {
    let mut inserted = 0u64;
    for seed in CATEGORY_SEEDS {
        let result = sqlx::query(
            r#"
            INSERT INTO categories (guid, name, slug, category_type, parent_id)
            VALUES (?, ?, ?, ?, (SELECT guid FROM categories WHERE slug = ? AND category_type = ?))
            ON CONFLICT(slug, category_type) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(seed.name)
        .bind(seed.slug)
        .bind(seed.category_type.to_db_string())
        .bind(seed.parent)
        .bind(seed.category_type.to_db_string())
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    debug!(inserted, "Categories seeded");
    Ok(())
}

/// Load the attribute registry keyed by attribute name
pub async fn load_attribute_definitions(
    pool: &SqlitePool,
) -> Result<HashMap<String, AttributeDefinition>> {
    let rows = sqlx::query(
        "SELECT guid, name, data_type, category, applies_to FROM attribute_definitions",
    )
    .fetch_all(pool)
    .await?;

    let mut registry = HashMap::with_capacity(rows.len());
    for row in rows {
        let guid: String = row.get("guid");
        let name: String = row.get("name");
        let data_type: String = row.get("data_type");
        let applies_to: String = row.get("applies_to");

        let definition = AttributeDefinition {
            id: parse_guid(&guid)?,
            data_type: DataType::from_db_string(&data_type).ok_or_else(|| {
                Error::Registry(format!("attribute {}: unknown data_type {}", name, data_type))
            })?,
            category: row.get("category"),
            applies_to: AppliesTo::from_db_string(&applies_to).ok_or_else(|| {
                Error::Registry(format!("attribute {}: unknown applies_to {}", name, applies_to))
            })?,
            name: name.clone(),
        };
        registry.insert(name, definition);
    }

    Ok(registry)
}

/// Load all categories keyed by (category_type, slug)
pub async fn load_categories(pool: &SqlitePool) -> Result<HashMap<(CategoryType, String), Category>> {
    let rows = sqlx::query("SELECT guid, name, slug, category_type, parent_id FROM categories")
        .fetch_all(pool)
        .await?;

    let mut categories = HashMap::with_capacity(rows.len());
    for row in rows {
        let guid: String = row.get("guid");
        let category_type: String = row.get("category_type");
        let parent_id: Option<String> = row.get("parent_id");
        let category_type = CategoryType::from_db_string(&category_type).ok_or_else(|| {
            Error::Registry(format!("unknown category_type {}", category_type))
        })?;

        let category = Category {
            id: parse_guid(&guid)?,
            name: row.get("name"),
            slug: row.get("slug"),
            category_type,
            parent_id: parent_id.as_deref().map(parse_guid).transpose()?,
        };
        categories.insert((category_type, category.slug.clone()), category);
    }

    Ok(categories)
}

fn parse_guid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Registry(format!("invalid guid {}: {}", s, e)))
}
