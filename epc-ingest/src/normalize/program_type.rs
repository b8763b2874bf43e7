//! Program-type normalizer
//!
//! A raw value naming one of the program types is kept. Otherwise the raw
//! type text, then the program name, is searched for keywords; the first
//! rule that matches wins.

use super::{clean, Normalized};
use epc_common::db::models::ProgramType;

/// Keyword rules, evaluated in order
const TYPE_RULES: &[(&[&str], ProgramType)] = &[
    (&["competition", "olympiad", "challenge", "contest"], ProgramType::Competition),
    (&["scholarship"], ProgramType::Scholarship),
    (&["award", "prize"], ProgramType::Award),
    (&["workshop"], ProgramType::Workshop),
    (&["conference", "symposium", "summit"], ProgramType::Conference),
    (&["camp"], ProgramType::Camp),
    (&["summer"], ProgramType::SummerProgram),
];

fn match_rules(text: &str) -> Option<ProgramType> {
    let lower = text.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(_, program_type)| *program_type)
}

/// Normalize the program type from the raw type field and program name
pub fn normalize_program_type(raw_type: Option<&str>, program_name: &str) -> Normalized<ProgramType> {
    let raw_type = clean(raw_type);

    if let Some(program_type) = raw_type.and_then(ProgramType::from_db_string) {
        return Normalized::given(program_type);
    }

    if let Some(program_type) = raw_type.and_then(match_rules) {
        return Normalized::inferred(program_type);
    }

    if let Some(program_type) = match_rules(program_name) {
        return Normalized::inferred(program_type);
    }

    Normalized::defaulted(ProgramType::Program, "program type not recognized; using 'program'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Provenance;

    #[test]
    fn test_exact_labels() {
        let result = normalize_program_type(Some("Summer Program"), "Anything");
        assert_eq!(result.value, Some(ProgramType::SummerProgram));
        assert_eq!(result.provenance, Provenance::Given);
        assert_eq!(
            normalize_program_type(Some("COMPETITION"), "x").value,
            Some(ProgramType::Competition)
        );
    }

    #[test]
    fn test_keywords_from_raw_type() {
        assert_eq!(
            normalize_program_type(Some("Math Olympiad"), "USAMO").value,
            Some(ProgramType::Competition)
        );
        assert_eq!(
            normalize_program_type(Some("Residential camp"), "x").value,
            Some(ProgramType::Camp)
        );
    }

    #[test]
    fn test_keywords_from_name() {
        assert_eq!(
            normalize_program_type(None, "Regeneron Science Talent Search Award").value,
            Some(ProgramType::Award)
        );
        assert_eq!(
            normalize_program_type(Some("research"), "Stanford Summer Session").value,
            Some(ProgramType::SummerProgram)
        );
    }

    #[test]
    fn test_fallback() {
        let result = normalize_program_type(None, "Research Science Institute");
        assert_eq!(result.value, Some(ProgramType::Program));
        assert_eq!(result.provenance, Provenance::Defaulted);
    }
}
