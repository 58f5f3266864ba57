//! Ingestion services
//!
//! Pure transforms (requirement normalization, cross-listing resolution,
//! record building) plus the raw document sources.

pub mod course_record_builder;
pub mod cross_listing_resolver;
pub mod data_source;
pub mod requirement_normalizer;

pub use course_record_builder::{BuildOutput, BuildStats, CourseRecordBuilder};
pub use cross_listing_resolver::{resolve, AliasClass};
pub use data_source::{
    fetch_documents, source_from_config, HttpSource, LocalFileSource, RawDataSource, RawDocuments,
};
pub use requirement_normalizer::normalize;
