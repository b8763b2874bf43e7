//! Import workflow
//!
//! Drives records through the pipeline in fixed-size batches and produces
//! the migration report.

pub mod orchestrator;
pub mod report;

pub use orchestrator::{run_import, Orchestrator, RecordOutcome};
pub use report::{MigrationReport, ReportBuilder, ReportCounters, ReportIssue, Severity};
