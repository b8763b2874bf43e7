//! Catalog persistence for the ingest pipeline
//!
//! Plain async functions over a `SqlitePool`, one module per table family.
//! Every write is a single statement (or one short transaction for category
//! links) so a run can stop between records without leaving partial rows.

pub mod attributes;
pub mod categories;
pub mod organizations;
pub mod programs;
pub mod runs;

use crate::error::{IngestError, IngestResult};
use uuid::Uuid;

pub(crate) fn parse_guid(s: &str) -> IngestResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| IngestError::Persistence(format!("invalid guid {}: {}", s, e)))
}
