//! Ingestion run orchestration
//!
//! fetch → decode → normalize/merge → persist, reported as one `RunSummary`.

pub mod ingestion_run;
pub mod summary;

pub use ingestion_run::{run_from_config, IngestionRun};
pub use summary::RunSummary;
