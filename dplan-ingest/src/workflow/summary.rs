//! Per-run summary counts

use crate::db::UpsertOutcome;
use crate::services::BuildStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What one ingestion run produced and wrote
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records handed to the sink
    pub records_produced: usize,
    pub build: BuildStats,
    pub persistence: UpsertOutcome,
}

impl RunSummary {
    /// Existing records matched by code
    pub fn matched(&self) -> usize {
        self.persistence.matched
    }

    /// Records newly created
    pub fn upserted(&self) -> usize {
        self.persistence.upserted
    }

    /// Existing records whose fields changed
    pub fn modified(&self) -> usize {
        self.persistence.modified
    }

    /// Orphan codes dropped for lack of a catalog-anchored alias
    pub fn orphans_dropped(&self) -> usize {
        self.build.orphans_dropped
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Human-readable summary, one line per count
    pub fn display_lines(&self) -> Vec<String> {
        vec![
            format!("Number of courses: {}", self.records_produced),
            format!("Matched {} documents", self.matched()),
            format!("Upserted {} documents", self.upserted()),
            format!("Modified {} documents", self.modified()),
            format!("Orphans promoted: {}", self.build.orphans_promoted),
            format!("Orphans dropped: {}", self.orphans_dropped()),
            format!("Malformed references: {}", self.build.reference_format_errors),
        ]
    }
}
