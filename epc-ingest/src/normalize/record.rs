//! Whole-record normalization
//!
//! Runs every field normalizer over an immutable [`RawRecord`] and gathers
//! the program fields, the attribute map and one [`FieldFinding`] per field
//! for the migration report.

use super::{
    clean, normalize_cost_category, normalize_date, normalize_duration, normalize_program_type,
    normalize_selectivity, normalize_website, parse_grade_range, Normalized, Provenance,
};
use crate::models::{FieldFinding, NormalizedProgram, NormalizedRecord, RawRecord};
use crate::slug::slugify;
use epc_common::db::models::ProgramStatus;
use serde_json::Value;
use std::collections::BTreeMap;

/// Audience used when grade bounds are unknown
pub const DEFAULT_AUDIENCE: &str = "High school students";

/// Why a record cannot be imported at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub field: &'static str,
    pub reason: String,
}

struct Findings(Vec<FieldFinding>);

impl Findings {
    fn push(&mut self, field: &'static str, provenance: Provenance, note: Option<String>) {
        self.0.push(FieldFinding {
            field,
            provenance,
            note,
        });
    }

    fn record<T>(&mut self, field: &'static str, result: &Normalized<T>) {
        self.push(field, result.provenance, result.note.clone());
    }

    /// Plain text field: present or missing, never inferred
    fn presence(&mut self, field: &'static str, value: Option<&str>) {
        let provenance = if value.is_some() {
            Provenance::Given
        } else {
            Provenance::Missing
        };
        self.push(field, provenance, None);
    }
}

/// Normalize one record
///
/// Fails only when the program name is missing or has no usable characters.
pub fn normalize_record(record: &RawRecord) -> Result<NormalizedRecord, ParseFailure> {
    let name = record.name().ok_or_else(|| ParseFailure {
        field: "program_name",
        reason: "missing required program name".to_string(),
    })?;
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ParseFailure {
            field: "program_name",
            reason: format!("program name '{}' has no letters or digits", name),
        });
    }

    let mut findings = Findings(Vec::new());
    let mut attributes: BTreeMap<String, Value> = BTreeMap::new();
    let mut put = |key: &str, value: Value| {
        if !value.is_null() {
            attributes.insert(key.to_string(), value);
        }
    };

    // Organization text: explicit field, else the program name
    let organization_source = match record.organization() {
        Some(org) => {
            findings.push("organization", Provenance::Given, None);
            org.to_string()
        }
        None => {
            findings.push(
                "organization",
                Provenance::Inferred,
                Some("organization derived from program name".to_string()),
            );
            name.to_string()
        }
    };

    let grades = parse_grade_range(record.grade_level.as_ref());
    findings.push("grade_level", grades.provenance, grades.note.clone());
    put("grade_level_min", grades.min.map(Value::from).unwrap_or(Value::Null));
    put("grade_level_max", grades.max.map(Value::from).unwrap_or(Value::Null));
    put("grade_level_note", grades.note.clone().map(Value::from).unwrap_or(Value::Null));

    let deadline = normalize_date(record.application_deadline.as_deref());
    findings.record("application_deadline", &deadline);
    put("application_deadline", deadline.value.clone().map(Value::from).unwrap_or(Value::Null));
    put("deadline_note", deadline.note.clone().map(Value::from).unwrap_or(Value::Null));

    let website = normalize_website(record.website.as_deref());
    findings.record("website", &website);
    put("website", website.value.clone().map(Value::from).unwrap_or(Value::Null));

    let financial_aid = clean(record.financial_aid.as_deref());
    let cost = normalize_cost_category(record.cost_category.as_deref(), financial_aid);
    findings.record("cost_category", &cost);
    put(
        "cost_category",
        cost.value.map(|c| Value::from(c.as_str())).unwrap_or(Value::Null),
    );

    let selectivity = normalize_selectivity(record.selectivity_percent.as_ref());
    findings.push("selectivity_percent", selectivity.provenance, selectivity.note.clone());

    let duration = normalize_duration(record.duration_weeks.as_ref());
    findings.record("duration_weeks", &duration);

    let program_type = normalize_program_type(record.program_type.as_deref(), name);
    findings.record("program_type", &program_type);

    let description = clean(record.description.as_deref());
    let subject_area = clean(record.subject_area.as_deref());
    let city = clean(record.location_city.as_deref());
    let state = clean(record.location_state.as_deref());
    let key_benefits = clean(record.key_benefits.as_deref());
    let requirements = clean(record.application_requirements.as_deref());

    findings.presence("description", description);
    findings.presence("subject_area", subject_area);
    findings.presence("location", city.or(state));

    for (key, value) in [
        ("financial_aid", financial_aid),
        ("subject_area", subject_area),
        ("location_city", city),
        ("location_state", state),
        ("key_benefits", key_benefits),
        // Split into a list by the attribute writer
        ("application_requirements", requirements),
    ] {
        put(key, value.map(Value::from).unwrap_or(Value::Null));
    }

    put(
        "source_record",
        serde_json::to_value(record).unwrap_or(Value::Null),
    );

    let classification_text = match subject_area {
        Some(subject) => format!("{} {}", subject, name),
        None => name.to_string(),
    };

    let program = NormalizedProgram {
        name: name.to_string(),
        slug,
        description: description.map(str::to_string),
        program_type: program_type.value.unwrap_or_default(),
        target_audience: Some(grades.audience().unwrap_or_else(|| DEFAULT_AUDIENCE.to_string())),
        duration_value: duration.value,
        selectivity_tier: selectivity.tier,
        estimated_acceptance_rate: selectivity.acceptance_rate,
        status: ProgramStatus::Active,
    };

    Ok(NormalizedRecord {
        program,
        organization_source,
        website: website.value,
        city: city.map(str::to_string),
        state: state.map(str::to_string),
        attributes,
        classification_text,
        findings: findings.0,
    })
}
