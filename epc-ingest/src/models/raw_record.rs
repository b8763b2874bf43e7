//! Raw program record as compiled by hand
//!
//! Field names vary between compilations, so every field accepts the
//! spellings seen in practice. Numeric-ish fields accept either a JSON number
//! or a string. Fields nobody recognizes are kept in `extra` so the source
//! record can be stored verbatim for auditing.
//!
//! A `RawRecord` is never modified after parsing; normalizers read from it
//! and return new values.

use crate::slug::slugify;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A field that may arrive as a JSON number or as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl FlexValue {
    /// Text form of the value
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FlexValue::Integer(n) => Cow::Owned(n.to_string()),
            FlexValue::Decimal(n) => Cow::Owned(n.to_string()),
            FlexValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Whether the value carries nothing (blank text)
    pub fn is_blank(&self) -> bool {
        matches!(self, FlexValue::Text(s) if s.trim().is_empty())
    }
}

/// One input record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "name", alias = "title", alias = "program")]
    pub program_name: Option<String>,

    #[serde(
        default,
        alias = "org",
        alias = "organization_name",
        alias = "host",
        alias = "sponsor"
    )]
    pub organization: Option<String>,

    #[serde(default, alias = "summary")]
    pub description: Option<String>,

    #[serde(default, alias = "cost")]
    pub cost_category: Option<String>,

    #[serde(default, alias = "type")]
    pub program_type: Option<String>,

    #[serde(default, alias = "subject", alias = "subjects", alias = "field")]
    pub subject_area: Option<String>,

    #[serde(default, alias = "grades", alias = "grade")]
    pub grade_level: Option<FlexValue>,

    #[serde(default, alias = "duration")]
    pub duration_weeks: Option<FlexValue>,

    #[serde(default, alias = "state")]
    pub location_state: Option<String>,

    #[serde(default, alias = "city")]
    pub location_city: Option<String>,

    #[serde(default, alias = "deadline")]
    pub application_deadline: Option<String>,

    #[serde(default, alias = "acceptance_rate", alias = "selectivity")]
    pub selectivity_percent: Option<FlexValue>,

    #[serde(default, alias = "aid")]
    pub financial_aid: Option<String>,

    #[serde(default, alias = "url", alias = "link")]
    pub website: Option<String>,

    #[serde(default, alias = "benefits")]
    pub key_benefits: Option<String>,

    #[serde(default, alias = "requirements")]
    pub application_requirements: Option<String>,

    /// Unrecognized fields, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawRecord {
    /// Parse one record from a JSON value
    ///
    /// Fails when the value is not an object or a field has the wrong shape
    /// (e.g. an array where text was expected).
    pub fn from_value(value: Value) -> Result<Self, String> {
        if !value.is_object() {
            return Err(format!("expected a JSON object, found {}", json_kind(&value)));
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    /// Program name, trimmed; None when missing or blank
    pub fn name(&self) -> Option<&str> {
        non_blank(&self.program_name)
    }

    /// Label identifying this record in the migration report
    pub fn identifier(&self, index: usize) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => record_label(index),
        }
    }

    /// Organization field, when it has letters or digits to slug
    pub fn organization(&self) -> Option<&str> {
        non_blank(&self.organization).filter(|org| !slugify(org).is_empty())
    }
}

/// Trimmed, non-blank view of an optional text field
pub fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Fallback report label for a record without a usable name
pub fn record_label(index: usize) -> String {
    format!("record #{}", index + 1)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aliases_map_to_canonical_fields() {
        let record = RawRecord::from_value(json!({
            "title": "Research Science Institute",
            "org": "CEE",
            "state": "MA",
            "deadline": "2025-01-15",
            "acceptance_rate": "3%",
            "url": "cee.org"
        }))
        .unwrap();

        assert_eq!(record.name(), Some("Research Science Institute"));
        assert_eq!(record.organization.as_deref(), Some("CEE"));
        assert_eq!(record.location_state.as_deref(), Some("MA"));
        assert_eq!(record.application_deadline.as_deref(), Some("2025-01-15"));
        assert_eq!(record.selectivity_percent, Some(FlexValue::Text("3%".to_string())));
        assert_eq!(record.website.as_deref(), Some("cee.org"));
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_numeric_or_text_fields() {
        let record = RawRecord::from_value(json!({
            "program_name": "X",
            "grade_level": 10,
            "duration_weeks": "6 weeks",
            "selectivity_percent": 12.5
        }))
        .unwrap();

        assert_eq!(record.grade_level, Some(FlexValue::Integer(10)));
        assert_eq!(record.duration_weeks.unwrap().as_text(), "6 weeks");
        assert_eq!(record.selectivity_percent, Some(FlexValue::Decimal(12.5)));
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let record = RawRecord::from_value(json!({
            "program_name": "X",
            "contact_email": "a@b.org"
        }))
        .unwrap();
        assert_eq!(record.extra.get("contact_email"), Some(&json!("a@b.org")));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = RawRecord::from_value(json!(["a", "b"])).unwrap_err();
        assert!(err.contains("an array"));
    }

    #[test]
    fn test_blank_name_falls_back_to_index_label() {
        let record = RawRecord::from_value(json!({"program_name": "   "})).unwrap();
        assert_eq!(record.name(), None);
        assert_eq!(record.identifier(4), "record #5");
    }

    #[test]
    fn test_organization_needs_sluggable_text() {
        let blank = RawRecord::from_value(json!({"program_name": "MITES Summer", "organization": "  "}))
            .unwrap();
        assert_eq!(blank.organization(), None);

        let punctuation = RawRecord::from_value(json!({"organization": "--"})).unwrap();
        assert_eq!(punctuation.organization(), None);

        let named = RawRecord::from_value(json!({"organization": " MIT "})).unwrap();
        assert_eq!(named.organization(), Some("MIT"));
    }
}
