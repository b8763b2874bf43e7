//! Database access shared by catalog crates
//!
//! The catalog lives in a single SQLite file. `init` creates it, `migrations`
//! upgrades older files in place, `registry` seeds the attribute definitions
//! and category taxonomy, and `models` holds the enums stored as TEXT columns.

pub mod init;
pub mod migrations;
pub mod models;
pub mod registry;
