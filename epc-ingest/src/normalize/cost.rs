//! Cost-category inference
//!
//! A recognized category label is kept as-is. Otherwise the financial-aid
//! text is searched for keywords in priority order; with no match the
//! program is assumed free.

use super::{clean, Normalized};
use serde::{Deserialize, Serialize};

/// Cost bucket of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostCategory {
    Free,
    FreePlusStipend,
    FreePlusScholarship,
    LowCost,
    Paid,
}

impl CostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostCategory::Free => "FREE",
            CostCategory::FreePlusStipend => "FREE_PLUS_STIPEND",
            CostCategory::FreePlusScholarship => "FREE_PLUS_SCHOLARSHIP",
            CostCategory::LowCost => "LOW_COST",
            CostCategory::Paid => "PAID",
        }
    }

    /// Parse an exact category label (case-insensitive; spaces or hyphens
    /// accepted for underscores)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "FREE" => Some(CostCategory::Free),
            "FREE_PLUS_STIPEND" => Some(CostCategory::FreePlusStipend),
            "FREE_PLUS_SCHOLARSHIP" => Some(CostCategory::FreePlusScholarship),
            "LOW_COST" => Some(CostCategory::LowCost),
            "PAID" => Some(CostCategory::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for CostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword rules over financial-aid text, highest priority first
const AID_RULES: &[(&[&str], CostCategory)] = &[
    (&["stipend"], CostCategory::FreePlusStipend),
    (&["scholarship", "free"], CostCategory::FreePlusScholarship),
    (&["low cost", "low-cost", "reduced"], CostCategory::LowCost),
];

/// Keep a recognized category or infer one from financial-aid text
pub fn normalize_cost_category(
    raw_category: Option<&str>,
    financial_aid: Option<&str>,
) -> Normalized<CostCategory> {
    if let Some(category) = clean(raw_category).and_then(CostCategory::from_label) {
        return Normalized::given(category);
    }

    if let Some(aid) = clean(financial_aid) {
        let lower = aid.to_lowercase();
        for (keywords, category) in AID_RULES {
            if keywords.iter().any(|keyword| lower.contains(keyword)) {
                return Normalized::inferred(*category);
            }
        }
    }

    let note = match clean(raw_category) {
        Some(raw) => format!("unrecognized cost category '{}'; assumed FREE", raw),
        None => "no cost information; assumed FREE".to_string(),
    };
    Normalized::defaulted(CostCategory::Free, note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Provenance;

    #[test]
    fn test_known_label_kept() {
        let result = normalize_cost_category(Some("low_cost"), Some("full stipend"));
        assert_eq!(result.value, Some(CostCategory::LowCost));
        assert_eq!(result.provenance, Provenance::Given);
    }

    #[test]
    fn test_stipend_beats_scholarship() {
        let result = normalize_cost_category(None, Some("Scholarships and a $500 stipend"));
        assert_eq!(result.value, Some(CostCategory::FreePlusStipend));
        assert_eq!(result.provenance, Provenance::Inferred);
    }

    #[test]
    fn test_inference_order() {
        assert_eq!(
            normalize_cost_category(Some("$2,000"), Some("Need-based scholarship")).value,
            Some(CostCategory::FreePlusScholarship)
        );
        assert_eq!(
            normalize_cost_category(None, Some("Tuition-free")).value,
            Some(CostCategory::FreePlusScholarship)
        );
        assert_eq!(
            normalize_cost_category(None, Some("Reduced fees available")).value,
            Some(CostCategory::LowCost)
        );
    }

    #[test]
    fn test_default_is_free_with_note() {
        let result = normalize_cost_category(None, None);
        assert_eq!(result.value, Some(CostCategory::Free));
        assert_eq!(result.provenance, Provenance::Defaulted);
        assert!(result.note.is_some());

        let result = normalize_cost_category(Some("varies"), Some("contact office"));
        assert_eq!(result.value, Some(CostCategory::Free));
        assert!(result.note.unwrap().contains("varies"));
    }
}
