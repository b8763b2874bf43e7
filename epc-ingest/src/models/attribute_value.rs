//! Typed attribute values
//!
//! The variant is the discriminant: it must match the `data_type` of the
//! attribute definition it is written against, and it selects the single
//! `value_*` column that is populated.

use chrono::NaiveDate;
use epc_common::db::models::DataType;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    Json(Value),
    Array(Vec<Value>),
}

/// Column values for one program_attributes row; exactly one is Some
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueColumns {
    pub string: Option<String>,
    pub integer: Option<i64>,
    pub decimal: Option<f64>,
    pub boolean: Option<bool>,
    pub date: Option<String>,
    pub json: Option<String>,
    pub array: Option<String>,
}

impl AttributeValue {
    pub fn data_type(&self) -> DataType {
        match self {
            AttributeValue::String(_) => DataType::String,
            AttributeValue::Integer(_) => DataType::Integer,
            AttributeValue::Decimal(_) => DataType::Decimal,
            AttributeValue::Boolean(_) => DataType::Boolean,
            AttributeValue::Date(_) => DataType::Date,
            AttributeValue::Json(_) => DataType::Json,
            AttributeValue::Array(_) => DataType::Array,
        }
    }

    /// Split into storage columns
    pub fn to_columns(&self) -> ValueColumns {
        let mut columns = ValueColumns::default();
        match self {
            AttributeValue::String(s) => columns.string = Some(s.clone()),
            AttributeValue::Integer(n) => columns.integer = Some(*n),
            AttributeValue::Decimal(n) => columns.decimal = Some(*n),
            AttributeValue::Boolean(b) => columns.boolean = Some(*b),
            AttributeValue::Date(d) => columns.date = Some(d.format("%Y-%m-%d").to_string()),
            AttributeValue::Json(v) => columns.json = Some(v.to_string()),
            AttributeValue::Array(items) => columns.array = Some(Value::Array(items.clone()).to_string()),
        }
        columns
    }

    /// Rebuild a value from the column selected by `data_type`
    ///
    /// Returns None when that column is null or its content does not decode.
    pub fn from_columns(data_type: DataType, columns: ValueColumns) -> Option<Self> {
        match data_type {
            DataType::String => columns.string.map(AttributeValue::String),
            DataType::Integer => columns.integer.map(AttributeValue::Integer),
            DataType::Decimal => columns.decimal.map(AttributeValue::Decimal),
            DataType::Boolean => columns.boolean.map(AttributeValue::Boolean),
            DataType::Date => columns
                .date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
                .map(AttributeValue::Date),
            DataType::Json => columns
                .json
                .and_then(|j| serde_json::from_str(&j).ok())
                .map(AttributeValue::Json),
            DataType::Array => match columns.array.and_then(|a| serde_json::from_str(&a).ok()) {
                Some(Value::Array(items)) => Some(AttributeValue::Array(items)),
                _ => None,
            },
        }
    }
}
