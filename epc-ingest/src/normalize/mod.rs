//! Field normalizers
//!
//! Pure functions, one per field family. None of them perform I/O or fail:
//! each returns the cleaned value (or `None`) together with an advisory note
//! and a [`Provenance`] saying whether the value was taken from the record,
//! inferred by a rule, filled with a default, or is missing.

pub mod cost;
pub mod date;
pub mod duration;
pub mod grade;
pub mod program_type;
pub mod record;
pub mod selectivity;
pub mod website;

pub use cost::{normalize_cost_category, CostCategory};
pub use date::normalize_date;
pub use duration::normalize_duration;
pub use grade::{parse_grade_range, GradeRange};
pub use program_type::normalize_program_type;
pub use record::{normalize_record, ParseFailure};
pub use selectivity::{normalize_selectivity, tier_for_percent, Selectivity};
pub use website::{normalize_website, website_origin};

use serde::{Deserialize, Serialize};

/// Where a normalized value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Present in the record and accepted after cleaning
    Given,
    /// Derived from other text by a rule
    Inferred,
    /// Absent or unusable; a policy default was substituted
    Defaulted,
    /// Absent or unusable; stored as null
    Missing,
}

/// Result of normalizing one field
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: Option<T>,
    pub note: Option<String>,
    pub provenance: Provenance,
}

impl<T> Normalized<T> {
    pub fn given(value: T) -> Self {
        Self {
            value: Some(value),
            note: None,
            provenance: Provenance::Given,
        }
    }

    pub fn inferred(value: T) -> Self {
        Self {
            value: Some(value),
            note: None,
            provenance: Provenance::Inferred,
        }
    }

    pub fn defaulted(value: T, note: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            note: Some(note.into()),
            provenance: Provenance::Defaulted,
        }
    }

    /// Null value; `note` is None when the field was simply absent
    pub fn missing(note: Option<String>) -> Self {
        Self {
            value: None,
            note,
            provenance: Provenance::Missing,
        }
    }
}

/// Tokens that stand in for "no value" in hand-compiled sheets
pub const PLACEHOLDER_TOKENS: &[&str] = &["n/a", "tbd", "rolling", "varies"];

/// Whether the text contains a placeholder token (case-insensitive substring)
pub fn contains_placeholder(text: &str) -> bool {
    let lower = text.to_lowercase();
    PLACEHOLDER_TOKENS.iter().any(|token| lower.contains(token))
}

/// Trimmed, non-blank text or None
pub(crate) fn clean(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(contains_placeholder("N/A"));
        assert!(contains_placeholder("Deadline TBD"));
        assert!(contains_placeholder("Rolling admissions"));
        assert!(!contains_placeholder("2025-03-01"));
    }
}
