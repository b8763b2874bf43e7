//! Normalized entities produced from a raw record

use crate::normalize::Provenance;
use epc_common::db::models::{OrganizationType, ProgramStatus, ProgramType, SelectivityTier};
use serde_json::Value;
use std::collections::BTreeMap;

/// Organization to find or create
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationDraft {
    pub name: String,
    pub slug: String,
    pub org_type: OrganizationType,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Program fields ready for upsert (organization assigned later)
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProgram {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub program_type: ProgramType,
    pub target_audience: Option<String>,
    pub duration_value: Option<i64>,
    pub selectivity_tier: SelectivityTier,
    pub estimated_acceptance_rate: Option<f64>,
    pub status: ProgramStatus,
}

/// Outcome of normalizing one field, for the report
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFinding {
    pub field: &'static str,
    pub provenance: Provenance,
    pub note: Option<String>,
}

/// Everything the orchestrator needs from one raw record
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub program: NormalizedProgram,
    /// Text naming the hosting organization
    pub organization_source: String,
    /// Website with scheme, if any
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Attribute values keyed by attribute name; nulls already removed
    pub attributes: BTreeMap<String, Value>,
    /// Subject and keyword text for the category classifier
    pub classification_text: String,
    pub findings: Vec<FieldFinding>,
}
