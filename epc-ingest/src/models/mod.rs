//! Data models for the ingest pipeline

pub mod attribute_value;
pub mod entities;
pub mod raw_record;

pub use attribute_value::AttributeValue;
pub use entities::{FieldFinding, NormalizedProgram, NormalizedRecord, OrganizationDraft};
pub use raw_record::{FlexValue, RawRecord};
