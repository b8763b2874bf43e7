//! Upsert orchestrator
//!
//! Each record moves through the same stages:
//!
//! Parse → ResolveOrganization → UpsertProgram → WriteAttributes →
//! LinkCategories → Commit
//!
//! A parse failure skips the record before anything is written. A failed
//! organization or program write counts as an error and skips the rest of
//! the record. Attribute and category failures are reported but do not stop
//! the record. Connection-level failures abort the run: no report is
//! produced for it.
//!
//! Records are processed one at a time by a single task, in batches of
//! `batch_size` with `batch_delay` between batches. Cancellation is checked
//! before every record, so a stopped run never leaves a record half-written
//! beyond the single-statement writes already committed.

use super::report::{MigrationReport, ReportBuilder, Severity};
use crate::config::IngestConfig;
use crate::db::categories::{link_program_categories, CategoryLink};
use crate::db::programs::{upsert_program, UpsertOutcome};
use crate::db::runs::save_run;
use crate::error::IngestResult;
use crate::models::raw_record::record_label;
use crate::models::RawRecord;
use crate::normalize::normalize_record;
use crate::services::{
    classify, draft_organization, resolve_organization, write_attributes, OrganizationCache,
    Resolution,
};
use crate::utils::retry_on_lock;
use epc_common::db::models::CategoryType;
use epc_common::db::registry::{
    load_attribute_definitions, load_categories, AttributeDefinition, Category,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stage whose failure counts a record as an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStage {
    ResolveOrganization,
    UpsertProgram,
}

/// Final state of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    /// Not importable; nothing written
    Skipped,
    /// Organization or program write failed
    Failed(RecordStage),
}

/// Import orchestrator
///
/// Holds the pool, the resolved configuration and the registries loaded
/// once at construction.
pub struct Orchestrator {
    db: SqlitePool,
    config: IngestConfig,
    attributes: HashMap<String, AttributeDefinition>,
    categories: HashMap<(CategoryType, String), Category>,
}

impl Orchestrator {
    pub async fn new(db: SqlitePool, config: IngestConfig) -> IngestResult<Self> {
        let attributes = load_attribute_definitions(&db).await?;
        let categories = load_categories(&db).await?;

        debug!(
            attributes = attributes.len(),
            categories = categories.len(),
            "Registries loaded"
        );

        Ok(Self {
            db,
            config,
            attributes,
            categories,
        })
    }

    /// Run the pipeline over all records
    ///
    /// Returns the finished report, also recorded in the run ledger. Errors
    /// only on connection-level failures.
    pub async fn run(
        &self,
        input_path: &str,
        records: &[Value],
        cancel: &CancellationToken,
    ) -> IngestResult<MigrationReport> {
        let mut report = ReportBuilder::new(input_path);
        let mut cache = OrganizationCache::new();
        let batch_size = self.config.batch_size.max(1);
        let total_batches = records.len().div_ceil(batch_size);

        info!(
            run_id = %report.run_id(),
            input = input_path,
            records = records.len(),
            batch_size,
            "Starting import"
        );

        'batches: for (batch_index, batch) in records.chunks(batch_size).enumerate() {
            if batch_index > 0 && !self.config.batch_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.batch_delay) => {}
                    _ = cancel.cancelled() => {}
                }
            }

            for (offset, value) in batch.iter().enumerate() {
                if cancel.is_cancelled() {
                    info!(
                        run_id = %report.run_id(),
                        processed = report.counters().total,
                        "Import cancelled"
                    );
                    report.mark_cancelled();
                    break 'batches;
                }

                let index = batch_index * batch_size + offset;
                report.record_seen();

                match self.process_record(index, value, &mut cache, &mut report).await? {
                    RecordOutcome::Created => report.record_created(),
                    RecordOutcome::Updated => report.record_updated(),
                    RecordOutcome::Skipped => report.record_skipped(),
                    RecordOutcome::Failed(stage) => {
                        debug!(record = index + 1, stage = ?stage, "Record failed");
                        report.record_error();
                    }
                }
            }

            let counters = report.counters();
            info!(
                batch = batch_index + 1,
                total_batches,
                created = counters.created,
                updated = counters.updated,
                skipped = counters.skipped,
                errors = counters.errors,
                "Batch complete"
            );
        }

        let placeholders = cache.placeholders();
        if !placeholders.is_empty() {
            warn!(organizations = ?placeholders, "Organizations need manual follow-up");
        }

        let report = report.finish();

        let saved = retry_on_lock("run ledger", self.config.max_lock_wait_ms, || {
            save_run(&self.db, &report)
        })
        .await;
        match saved {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(run_id = %report.run_id(), error = %err, "Could not record run"),
        }

        let counters = report.counters();
        info!(
            run_id = %report.run_id(),
            total = counters.total,
            created = counters.created,
            updated = counters.updated,
            skipped = counters.skipped,
            errors = counters.errors,
            cancelled = report.cancelled(),
            "Import finished"
        );

        Ok(report)
    }

    /// Take one record through every stage
    async fn process_record(
        &self,
        index: usize,
        value: &Value,
        cache: &mut OrganizationCache,
        report: &mut ReportBuilder,
    ) -> IngestResult<RecordOutcome> {
        // Parse
        let raw = match RawRecord::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(reason) => {
                warn!(record = index + 1, error = %reason, "Unparseable record, skipping");
                report.issue(record_label(index), "record", reason, Severity::Warning);
                return Ok(RecordOutcome::Skipped);
            }
        };
        let identifier = raw.identifier(index);

        let normalized = match normalize_record(&raw) {
            Ok(normalized) => normalized,
            Err(failure) => {
                warn!(record = %identifier, field = failure.field, "{}", failure.reason);
                report.issue(&identifier, failure.field, failure.reason, Severity::Warning);
                return Ok(RecordOutcome::Skipped);
            }
        };
        for finding in &normalized.findings {
            report.finding(&identifier, finding);
        }

        // ResolveOrganization
        let Some(draft) = draft_organization(&normalized, &self.config.default_country) else {
            report.issue(
                &identifier,
                "organization",
                "no organization name could be derived",
                Severity::Warning,
            );
            return Ok(RecordOutcome::Skipped);
        };

        let resolution =
            resolve_organization(&self.db, cache, &draft, self.config.max_lock_wait_ms).await?;
        if let Resolution::Placeholder { id, error } = &resolution {
            report.issue(
                &identifier,
                "organization",
                format!(
                    "could not store organization '{}' ({}); placeholder {} needs manual follow-up",
                    draft.slug, error, id
                ),
                Severity::Error,
            );
            return Ok(RecordOutcome::Failed(RecordStage::ResolveOrganization));
        }
        let organization_id = resolution.id();

        // UpsertProgram
        let upserted = retry_on_lock("program upsert", self.config.max_lock_wait_ms, || {
            upsert_program(&self.db, organization_id, &normalized.program)
        })
        .await;
        let (program_id, outcome) = match upserted {
            Ok(result) => result,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(record = %identifier, error = %err, "Program upsert failed");
                report.issue(&identifier, "program", err.to_string(), Severity::Error);
                return Ok(RecordOutcome::Failed(RecordStage::UpsertProgram));
            }
        };

        // WriteAttributes
        let written = write_attributes(
            &self.db,
            &self.attributes,
            program_id,
            &normalized.attributes,
            self.config.max_lock_wait_ms,
        )
        .await?;
        for failure in &written.failures {
            report.issue(&identifier, &failure.name, &failure.reason, Severity::Low);
        }
        if !written.unknown.is_empty() {
            debug!(record = %identifier, attributes = ?written.unknown, "No definition for attributes, dropped");
        }

        // LinkCategories
        self.link_categories(&identifier, program_id, &normalized.classification_text, report)
            .await?;

        // Commit
        debug!(
            record = %identifier,
            organization = %draft.slug,
            program = %normalized.program.slug,
            outcome = ?outcome,
            attributes = written.written,
            "Record committed"
        );

        Ok(match outcome {
            UpsertOutcome::Created => RecordOutcome::Created,
            UpsertOutcome::Updated => RecordOutcome::Updated,
        })
    }

    async fn link_categories(
        &self,
        identifier: &str,
        program_id: Uuid,
        text: &str,
        report: &mut ReportBuilder,
    ) -> IngestResult<()> {
        let mut links = Vec::new();
        for matched in classify(text) {
            match self.categories.get(&(matched.category_type, matched.slug.to_string())) {
                Some(category) => links.push(CategoryLink {
                    category_id: category.id,
                    is_primary: matched.is_primary,
                }),
                None => report.issue(
                    identifier,
                    "categories",
                    format!("category '{}' is not in the taxonomy", matched.slug),
                    Severity::Warning,
                ),
            }
        }

        let result = retry_on_lock("category link", self.config.max_lock_wait_ms, || {
            link_program_categories(&self.db, program_id, &links)
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(record = %identifier, error = %err, "Category linking failed");
                report.issue(identifier, "categories", err.to_string(), Severity::Warning);
                Ok(())
            }
        }
    }
}

/// Load registries and run the pipeline once
pub async fn run_import(
    db: SqlitePool,
    config: IngestConfig,
    input_path: &str,
    records: &[Value],
    cancel: &CancellationToken,
) -> IngestResult<MigrationReport> {
    Orchestrator::new(db, config).await?.run(input_path, records, cancel).await
}
