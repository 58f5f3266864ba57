//! dplan-ingest library interface
//!
//! Course data worker: pulls the course catalog and the prerequisite records,
//! normalizes each course's requirement tree into AND-of-OR groups, resolves
//! cross-listed codes that have no catalog entry, and upserts the resulting
//! course records in one batch.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{
    DecodeError, FetchError, IngestError, PersistenceError, ReferenceFormatError,
};
pub use crate::models::{
    CatalogEntry, CourseRecord, NormalizedRequirements, PrerequisiteRecord, RequirementGroup,
    RequirementNode,
};
pub use crate::workflow::{IngestionRun, RunSummary};
