//! Error types for dplan-ingest
//!
//! Fetch, decode and persistence failures are fatal to a run.
//! `ReferenceFormatError` is recovered where it happens and only counted.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The two source documents an ingestion run consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDocument {
    /// Flat course catalog (code -> name)
    Catalog,
    /// Per-course prerequisite, corequisite and cross-listing records
    Prerequisites,
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDocument::Catalog => write!(f, "catalog"),
            SourceDocument::Prerequisites => write!(f, "prerequisites"),
        }
    }
}

/// Failure retrieving a source document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Fetch deadline of {deadline:?} exceeded")]
    Timeout { deadline: Duration },
}

/// Malformed JSON in a source document
#[derive(Debug, Error)]
#[error("Malformed {document} document: {source}")]
pub struct DecodeError {
    pub document: SourceDocument,
    #[source]
    pub source: serde_json::Error,
}

/// Course reference that is not "SUBJECT NUMBER"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Course reference {reference:?} is not two whitespace-separated tokens")]
pub struct ReferenceFormatError {
    pub reference: String,
}

/// Batch upsert failure
///
/// The sink writes the batch atomically, so every code in the batch was in
/// flight when the failure happened.
#[derive(Debug, Error)]
#[error("Batch upsert of {} course records failed: {source}", .codes.len())]
pub struct PersistenceError {
    pub codes: Vec<String>,
    #[source]
    pub source: dplan_common::Error,
}

/// Fatal ingestion run error
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to fetch {document} document: {source}")]
    Fetch {
        document: SourceDocument,
        #[source]
        source: FetchError,
    },

    #[error("Failed to set up the {source_name} data source: {source}")]
    SourceSetup {
        source_name: &'static str,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Common error: {0}")]
    Common(#[from] dplan_common::Error),
}
