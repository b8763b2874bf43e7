//! Grade range parser
//!
//! Recognized forms, tried in order:
//! 1. bare integer `N` in 9–12 → `[max(6, N-1), min(12, N+1)]`
//! 2. explicit range `A-B` (also `A to B`) with `6 <= A <= B <= 12` → `[A, B]`
//! 3. "high school" → `[9, 12]`
//! 4. "middle school" → `[6, 8]`
//!
//! Anything else yields no bounds and an advisory note.

use super::Provenance;
use crate::models::FlexValue;
use regex::Regex;
use std::sync::OnceLock;

/// Advisory attached when grades cannot be determined
pub const GRADE_NOTE: &str = "refer to website for grade requirements";

const LOWEST_GRADE: u8 = 6;
const HIGHEST_GRADE: u8 = 12;

/// Parsed grade eligibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRange {
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub note: Option<String>,
    pub provenance: Provenance,
}

impl GradeRange {
    fn bounded(min: u8, max: u8, provenance: Provenance) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            note: None,
            provenance,
        }
    }

    fn unknown() -> Self {
        Self {
            min: None,
            max: None,
            note: Some(GRADE_NOTE.to_string()),
            provenance: Provenance::Missing,
        }
    }

    /// Audience label derived from the bounds
    pub fn audience(&self) -> Option<String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => Some(format!("Grade {}", min)),
            (Some(min), Some(max)) => Some(format!("Grades {}-{}", min, max)),
            _ => None,
        }
    }
}

fn range_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)?\s*(?:-|–|—|to)\s*(\d{1,2})(?:st|nd|rd|th)?\b").ok()
        })
        .as_ref()
}

/// Parse a free-form grade requirement. Never fails.
pub fn parse_grade_range(raw: Option<&FlexValue>) -> GradeRange {
    let raw = match raw {
        Some(value) if !value.is_blank() => value,
        _ => return GradeRange::unknown(),
    };

    let text = raw.as_text();
    let text = text.trim();

    if let Ok(grade) = text.parse::<u8>() {
        if (9..=HIGHEST_GRADE).contains(&grade) {
            return GradeRange::bounded(
                (grade - 1).max(LOWEST_GRADE),
                (grade + 1).min(HIGHEST_GRADE),
                Provenance::Inferred,
            );
        }
        return GradeRange::unknown();
    }

    if let Some(caps) = range_pattern().and_then(|re| re.captures(text)) {
        let low = caps[1].parse::<u8>().ok();
        let high = caps[2].parse::<u8>().ok();
        if let (Some(low), Some(high)) = (low, high) {
            if LOWEST_GRADE <= low && low <= high && high <= HIGHEST_GRADE {
                return GradeRange::bounded(low, high, Provenance::Given);
            }
        }
    }

    let lower = text.to_lowercase();
    if lower.contains("high school") {
        return GradeRange::bounded(9, 12, Provenance::Inferred);
    }
    if lower.contains("middle school") {
        return GradeRange::bounded(6, 8, Provenance::Inferred);
    }

    GradeRange::unknown()
}
