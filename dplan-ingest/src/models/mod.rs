//! Data model for course ingestion
//!
//! Two independently maintained documents are decoded into immutable sorted
//! maps, then merged into `CourseRecord`s.

pub mod catalog;
pub mod course_code;
pub mod course_record;
pub mod prerequisite;

pub use catalog::{decode_catalog, Catalog, CatalogEntry};
pub use course_code::normalize_code;
pub use course_record::{CourseRecord, NormalizedRequirements, RequirementGroup, CROSS_LISTED_MARKER};
pub use prerequisite::{decode_prerequisites, PrerequisiteRecord, PrerequisiteRecords, RequirementNode};
