//! Migration report
//!
//! A [`ReportBuilder`] accumulates counters, issues and per-field
//! inferred/missing tallies while the run progresses. [`ReportBuilder::finish`]
//! consumes the builder and yields a [`MigrationReport`], which has no
//! mutators: once finished, a report is only read, serialized and stored.

use crate::error::IngestResult;
use crate::models::FieldFinding;
use crate::normalize::Provenance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Severity of a report issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Value inferred or defaulted; worth a look, nothing lost
    Info,
    /// Attribute value dropped
    Low,
    /// Record skipped, or a dependent link not written
    Warning,
    /// Entity write failed; needs manual follow-up
    Error,
}

/// One report entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportIssue {
    pub record_identifier: String,
    pub field: String,
    pub issue: String,
    pub severity: Severity,
}

/// Run counters
///
/// `total` counts records taken from the input; every one of them ends in
/// exactly one of `created`, `updated`, `skipped` or `errors`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounters {
    pub total: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Finished, immutable migration report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    run_id: Uuid,
    input_path: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    cancelled: bool,
    counters: ReportCounters,
    inferred: BTreeMap<String, u64>,
    missing: BTreeMap<String, u64>,
    issues: Vec<ReportIssue>,
}

impl MigrationReport {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn input_path(&self) -> &str {
        &self.input_path
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Whether the run was stopped before consuming all input
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn counters(&self) -> ReportCounters {
        self.counters
    }

    /// Per-field count of values that were inferred or defaulted
    pub fn inferred(&self) -> &BTreeMap<String, u64> {
        &self.inferred
    }

    /// Per-field count of values stored as null
    pub fn missing(&self) -> &BTreeMap<String, u64> {
        &self.missing
    }

    pub fn issues(&self) -> &[ReportIssue] {
        &self.issues
    }

    /// Issues at or above a severity
    pub fn issues_at_least(&self, severity: Severity) -> impl Iterator<Item = &ReportIssue> {
        self.issues.iter().filter(move |issue| issue.severity >= severity)
    }

    /// A run succeeds when no record ended in an error
    pub fn is_success(&self) -> bool {
        self.counters.errors == 0
    }

    /// File name used when the report is written to a directory
    pub fn file_name(&self) -> String {
        format!("migration-report-{}.json", self.run_id)
    }

    pub fn to_json_pretty(&self) -> IngestResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON into `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: &Path) -> IngestResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_json_pretty()?)?;
        Ok(path)
    }
}

/// Accumulates a report while a run is in progress
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: Uuid,
    input_path: String,
    started_at: DateTime<Utc>,
    cancelled: bool,
    counters: ReportCounters,
    inferred: BTreeMap<String, u64>,
    missing: BTreeMap<String, u64>,
    issues: Vec<ReportIssue>,
}

impl ReportBuilder {
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            input_path: input_path.into(),
            started_at: Utc::now(),
            cancelled: false,
            counters: ReportCounters::default(),
            inferred: BTreeMap::new(),
            missing: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn counters(&self) -> ReportCounters {
        self.counters
    }

    pub fn record_seen(&mut self) {
        self.counters.total += 1;
    }

    pub fn record_created(&mut self) {
        self.counters.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.counters.updated += 1;
    }

    pub fn record_skipped(&mut self) {
        self.counters.skipped += 1;
    }

    pub fn record_error(&mut self) {
        self.counters.errors += 1;
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn issue(
        &mut self,
        record_identifier: impl Into<String>,
        field: impl Into<String>,
        issue: impl Into<String>,
        severity: Severity,
    ) {
        self.issues.push(ReportIssue {
            record_identifier: record_identifier.into(),
            field: field.into(),
            issue: issue.into(),
            severity,
        });
    }

    /// Tally a field finding and keep its note as an info issue
    pub fn finding(&mut self, record_identifier: &str, finding: &FieldFinding) {
        let tally = match finding.provenance {
            Provenance::Given => None,
            Provenance::Inferred | Provenance::Defaulted => Some(&mut self.inferred),
            Provenance::Missing => Some(&mut self.missing),
        };
        if let Some(tally) = tally {
            *tally.entry(finding.field.to_string()).or_insert(0) += 1;
        }

        if let Some(note) = &finding.note {
            self.issue(record_identifier, finding.field, note.clone(), Severity::Info);
        }
    }

    pub fn finish(self) -> MigrationReport {
        MigrationReport {
            run_id: self.run_id,
            input_path: self.input_path,
            started_at: self.started_at,
            finished_at: Utc::now(),
            cancelled: self.cancelled,
            counters: self.counters,
            inferred: self.inferred,
            missing: self.missing,
            issues: self.issues,
        }
    }
}
