//! Pipeline services
//!
//! Organization resolution, category classification and attribute writing.
//! The classifier is pure; the other two talk to the store through
//! [`crate::db`].

pub mod attribute_writer;
pub mod category_classifier;
pub mod organization_resolver;

pub use attribute_writer::{coerce, write_attributes, AttributeFailure, AttributeWriteOutcome};
pub use category_classifier::{classify, CategoryMatch};
pub use organization_resolver::{
    draft_organization, extract_organization_name, infer_organization_type, resolve_organization,
    ExtractionRule, OrganizationCache, OrganizationRef, Resolution,
};
