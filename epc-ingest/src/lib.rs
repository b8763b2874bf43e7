//! epc-ingest library interface
//!
//! Normalizes hand-compiled enrichment-program records into the catalog
//! database: deduplicated organizations, canonical programs, typed
//! attributes and taxonomy links, plus a migration report per run.
//! Exposed as a library so the pipeline can be driven from tests.

pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod models;
pub mod normalize;
pub mod services;
pub mod slug;
pub mod utils;
pub mod workflow;

pub use crate::config::{ConfigOverrides, IngestConfig};
pub use crate::error::{IngestError, IngestResult};
pub use crate::workflow::{run_import, MigrationReport};
