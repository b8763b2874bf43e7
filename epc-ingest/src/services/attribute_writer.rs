//! Attribute store writer
//!
//! Writes a program's named attribute values against the attribute registry.
//! Names the registry does not know are dropped without a trace in the
//! report. Each known value is coerced to the definition's data type first;
//! a value that does not coerce (or whose row cannot be written) is recorded
//! as a per-attribute failure and the remaining attributes are still written.

use crate::db::attributes::upsert_program_attribute;
use crate::error::IngestResult;
use crate::models::AttributeValue;
use crate::normalize::date::parse_date;
use crate::utils::retry_on_lock;
use epc_common::db::models::{AppliesTo, DataType};
use epc_common::db::registry::AttributeDefinition;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Coerce a JSON value into the typed value for `data_type`
pub fn coerce(value: &Value, data_type: DataType) -> Result<AttributeValue, String> {
    let mismatch = || format!("cannot store {} as {}", value, data_type);

    match data_type {
        DataType::String => match value {
            Value::String(s) => Ok(AttributeValue::String(s.trim().to_string())),
            Value::Number(n) => Ok(AttributeValue::String(n.to_string())),
            Value::Bool(b) => Ok(AttributeValue::String(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => Err(mismatch()),
        },
        DataType::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(AttributeValue::Integer)
                .ok_or_else(mismatch),
            Value::String(s) => s.trim().parse::<i64>().map(AttributeValue::Integer).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        DataType::Decimal => match value {
            Value::Number(n) => n.as_f64().map(AttributeValue::Decimal).ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(AttributeValue::Decimal)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        DataType::Boolean => match value {
            Value::Bool(b) => Ok(AttributeValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(AttributeValue::Boolean(false)),
                Some(1) => Ok(AttributeValue::Boolean(true)),
                _ => Err(mismatch()),
            },
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(AttributeValue::Boolean(true)),
                "false" | "no" | "n" | "0" => Ok(AttributeValue::Boolean(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        DataType::Date => match value {
            Value::String(s) => parse_date(s).map(AttributeValue::Date).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        DataType::Json => match value {
            Value::Null => Err(mismatch()),
            other => Ok(AttributeValue::Json(other.clone())),
        },
        DataType::Array => match value {
            Value::Array(items) => Ok(AttributeValue::Array(items.clone())),
            Value::String(s) => {
                let items: Vec<Value> = s
                    .split([';', '\n', ','])
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(Value::from)
                    .collect();
                if items.is_empty() {
                    Err(mismatch())
                } else {
                    Ok(AttributeValue::Array(items))
                }
            }
            _ => Err(mismatch()),
        },
    }
}

/// An attribute that was not written
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFailure {
    pub name: String,
    pub reason: String,
}

/// Result of writing one program's attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeWriteOutcome {
    pub written: usize,
    /// Names with no registry definition
    pub unknown: Vec<String>,
    pub failures: Vec<AttributeFailure>,
}

/// Write attribute values for a program
///
/// Only connection-level errors are returned; everything else ends up in
/// the outcome.
pub async fn write_attributes(
    pool: &SqlitePool,
    registry: &HashMap<String, AttributeDefinition>,
    program_id: Uuid,
    attributes: &BTreeMap<String, Value>,
    max_lock_wait_ms: u64,
) -> IngestResult<AttributeWriteOutcome> {
    let mut outcome = AttributeWriteOutcome::default();

    for (name, raw) in attributes {
        if raw.is_null() {
            continue;
        }

        let Some(definition) = registry.get(name) else {
            outcome.unknown.push(name.clone());
            continue;
        };

        if definition.applies_to != AppliesTo::Programs {
            outcome.failures.push(AttributeFailure {
                name: name.clone(),
                reason: format!("attribute applies to {}", definition.applies_to),
            });
            continue;
        }

        let value = match coerce(raw, definition.data_type) {
            Ok(value) => value,
            Err(reason) => {
                outcome.failures.push(AttributeFailure {
                    name: name.clone(),
                    reason,
                });
                continue;
            }
        };

        let result = retry_on_lock("attribute upsert", max_lock_wait_ms, || {
            upsert_program_attribute(pool, program_id, definition.id, &value)
        })
        .await;

        match result {
            Ok(()) => outcome.written += 1,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => outcome.failures.push(AttributeFailure {
                name: name.clone(),
                reason: err.to_string(),
            }),
        }
    }

    Ok(outcome)
}
