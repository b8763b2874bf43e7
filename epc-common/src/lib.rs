//! # EPC Common Library
//!
//! Shared code for the enrichment program catalog:
//! - Database initialization, migrations and seeded registries
//! - Domain enums shared by the ingest pipeline and the listing service
//! - Configuration loading and path resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
