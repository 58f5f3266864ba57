//! Ingestion run
//!
//! One run owns its documents and maps for its whole lifetime and keeps
//! nothing afterwards. The only external effect is the single batch upsert,
//! which happens after every document has been fetched and decoded; a fetch
//! or decode failure persists nothing.

use crate::db::{PersistenceSink, SqliteCourseSink};
use crate::error::IngestError;
use crate::models::{decode_catalog, decode_prerequisites};
use crate::services::{fetch_documents, source_from_config, CourseRecordBuilder, RawDataSource};
use crate::workflow::RunSummary;
use chrono::Utc;
use dplan_common::WorkerConfig;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Orchestrates fetch → decode → build → persist
pub struct IngestionRun<'a> {
    run_id: Uuid,
    source: &'a dyn RawDataSource,
    sink: &'a dyn PersistenceSink,
    fetch_timeout: Duration,
}

impl<'a> IngestionRun<'a> {
    pub fn new(
        source: &'a dyn RawDataSource,
        sink: &'a dyn PersistenceSink,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source,
            sink,
            fetch_timeout,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Execute the run
    ///
    /// # Errors
    /// Any fetch, decode or persistence failure. Malformed course references
    /// are not errors; they are counted in the summary.
    pub async fn execute(&self) -> Result<RunSummary, IngestError> {
        let started_at = Utc::now();
        info!(run_id = %self.run_id, source = self.source.name(), "Starting course data ingestion");

        let documents = fetch_documents(self.source, self.fetch_timeout).await?;
        let catalog = decode_catalog(&documents.catalog)?;
        let prerequisites = decode_prerequisites(&documents.prerequisites)?;
        drop(documents);

        info!(
            run_id = %self.run_id,
            catalog_entries = catalog.len(),
            prerequisite_records = prerequisites.len(),
            "Decoded source documents"
        );

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();
        info!(run_id = %self.run_id, "Built course records: {}", output.stats.display_string());

        if output.stats.reference_format_errors > 0 {
            warn!(
                run_id = %self.run_id,
                count = output.stats.reference_format_errors,
                "Malformed course references were skipped"
            );
        }

        let persistence = match self.sink.upsert_batch(&output.records).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    run_id = %self.run_id,
                    in_flight = err.codes.len(),
                    codes = ?err.codes,
                    "Batch upsert failed: {}",
                    err.source
                );
                return Err(err.into());
            }
        };

        let summary = RunSummary {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            records_produced: output.records.len(),
            build: output.stats,
            persistence,
        };

        for line in summary.display_lines() {
            info!(run_id = %self.run_id, "{}", line);
        }
        info!(run_id = %self.run_id, elapsed_ms = summary.elapsed_ms(), "Course data ingestion complete");

        Ok(summary)
    }
}

/// Open the configured database and source, then execute one run
pub async fn run_from_config(config: &WorkerConfig) -> Result<RunSummary, IngestError> {
    info!(
        run_mode = config.run_mode.as_str(),
        database = %config.database_path.display(),
        "Course data worker configured"
    );

    let pool = dplan_common::db::init_database(&config.database_path).await?;
    let source = source_from_config(config)?;
    let sink = SqliteCourseSink::new(pool);

    let result = IngestionRun::new(source.as_ref(), &sink, config.fetch_timeout)
        .execute()
        .await;

    sink.pool().close().await;
    result
}
