//! Selectivity tier mapper
//!
//! Acceptance percentage `p`: `p <= 10` elite, `p <= 25` highly selective,
//! `p <= 50` selective, otherwise open. Missing or unparseable → open.

use super::Provenance;
use crate::models::FlexValue;
use epc_common::db::models::SelectivityTier;

/// Tier plus the acceptance rate it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct Selectivity {
    pub tier: SelectivityTier,
    pub acceptance_rate: Option<f64>,
    pub note: Option<String>,
    pub provenance: Provenance,
}

/// Parse an acceptance percentage such as `12`, `"12.5"` or `"12%"`
///
/// Values outside 0–100 are rejected.
pub fn parse_percent(raw: &FlexValue) -> Option<f64> {
    let value = match raw {
        FlexValue::Integer(n) => *n as f64,
        FlexValue::Decimal(n) => *n,
        FlexValue::Text(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && (0.0..=100.0).contains(&value)).then_some(value)
}

/// Map an acceptance percentage onto a tier
pub fn tier_for_percent(percent: Option<f64>) -> SelectivityTier {
    match percent {
        Some(p) if p <= 10.0 => SelectivityTier::Elite,
        Some(p) if p <= 25.0 => SelectivityTier::HighlySelective,
        Some(p) if p <= 50.0 => SelectivityTier::Selective,
        _ => SelectivityTier::Open,
    }
}

/// Derive the selectivity tier from a raw percentage field
pub fn normalize_selectivity(raw: Option<&FlexValue>) -> Selectivity {
    match raw.filter(|value| !value.is_blank()) {
        None => Selectivity {
            tier: SelectivityTier::Open,
            acceptance_rate: None,
            note: None,
            provenance: Provenance::Defaulted,
        },
        Some(value) => match parse_percent(value) {
            Some(percent) => Selectivity {
                tier: tier_for_percent(Some(percent)),
                acceptance_rate: Some(percent),
                note: None,
                provenance: Provenance::Inferred,
            },
            None => Selectivity {
                tier: SelectivityTier::Open,
                acceptance_rate: None,
                note: Some(format!(
                    "unparseable acceptance rate '{}'; tier defaulted to open",
                    value.as_text()
                )),
                provenance: Provenance::Defaulted,
            },
        },
    }
}
