//! Duration normalizer (weeks)
//!
//! Accepts a bare number of weeks or text with a unit: `"6"`, `"6 weeks"`,
//! `"2-3 weeks"` (upper bound), `"10 days"` (rounded up to whole weeks),
//! `"2 months"` (4 weeks each), `"1 year"` (52 weeks). Results outside
//! 1–52 weeks are discarded.

use super::{Normalized, Provenance};
use crate::models::FlexValue;
use regex::Regex;
use std::sync::OnceLock;

const MAX_WEEKS: i64 = 52;

fn duration_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?i)(\d+(?:\.\d+)?)(?:\s*(?:-|–|to)\s*(\d+(?:\.\d+)?))?\s*(days?|weeks?|wks?|months?|years?)?\b",
            )
            .ok()
        })
        .as_ref()
}

/// Normalize a duration into whole weeks
pub fn normalize_duration(raw: Option<&FlexValue>) -> Normalized<i64> {
    let raw = match raw {
        Some(value) if !value.is_blank() => value,
        _ => return Normalized::missing(None),
    };

    let text = raw.as_text();
    let weeks = duration_pattern()
        .and_then(|re| re.captures(&text))
        .and_then(|caps| {
            let amount = caps
                .get(2)
                .or_else(|| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())?;
            let unit = caps.get(3).map(|m| m.as_str().to_lowercase());
            let weeks = match unit.as_deref() {
                Some(u) if u.starts_with("day") => amount / 7.0,
                Some(u) if u.starts_with("month") => amount * 4.0,
                Some(u) if u.starts_with("year") => amount * 52.0,
                _ => amount,
            };
            Some(weeks.ceil() as i64)
        });

    match weeks {
        Some(weeks) if (1..=MAX_WEEKS).contains(&weeks) => {
            let provenance = match raw {
                FlexValue::Integer(_) => Provenance::Given,
                _ => Provenance::Inferred,
            };
            Normalized {
                value: Some(weeks),
                note: None,
                provenance,
            }
        }
        _ => Normalized::missing(Some(format!("unrecognized duration '{}'", text))),
    }
}
