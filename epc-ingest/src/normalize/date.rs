//! Date validator
//!
//! Blank or placeholder text ("N/A", "TBD", "rolling", "varies") and dates outside
//! 2020–2030 become null with a note. Valid dates come back as `YYYY-MM-DD`.

use super::{clean, contains_placeholder, Normalized, Provenance};
use chrono::{Datelike, NaiveDate};

/// Earliest plausible year in the catalog
pub const MIN_YEAR: i32 = 2020;
/// Latest plausible year in the catalog
pub const MAX_YEAR: i32 = 2030;

/// Accepted input layouts, tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a date in any accepted layout (no range check)
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // ISO timestamps: keep the date part
    let text = match text.split_once('T') {
        Some((date, _)) if date.len() == 10 => date,
        _ => text,
    };
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Validate and normalize a date field
pub fn normalize_date(raw: Option<&str>) -> Normalized<String> {
    let text = match (raw, clean(raw)) {
        (_, Some(text)) => text,
        (None, None) => return Normalized::missing(None),
        (Some(_), None) => {
            return Normalized::missing(Some("empty date treated as unknown".to_string()))
        }
    };

    if contains_placeholder(text) {
        return Normalized::missing(Some(format!("placeholder date '{}' treated as unknown", text)));
    }

    match parse_date(text) {
        Some(date) if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) => Normalized {
            value: Some(date.format("%Y-%m-%d").to_string()),
            note: None,
            provenance: Provenance::Given,
        },
        Some(date) => Normalized::missing(Some(format!(
            "date {} outside {}-{}",
            date.format("%Y-%m-%d"),
            MIN_YEAR,
            MAX_YEAR
        ))),
        None => Normalized::missing(Some(format!("unrecognized date '{}'", text))),
    }
}
