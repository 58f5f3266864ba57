//! dplan-ingest - Course Data Worker
//!
//! Run-once entry point: loads configuration, ingests the course catalog and
//! prerequisite records, upserts the normalized course records, logs the run
//! summary and exits. Any fatal error exits non-zero.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dplan_common::config::config_file_path;
use dplan_common::WorkerConfig;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments for dplan-ingest
#[derive(Parser, Debug)]
#[command(name = "dplan-ingest")]
#[command(about = "Course data worker for the degree planner")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "FILE", env = "DPLAN_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.or_else(config_file_path);
    let config = WorkerConfig::load_from(config_path.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let default_filter = format!(
        "dplan_ingest={level},dplan_common={level}",
        level = config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting dplan-ingest (Course Data Worker)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match dplan_ingest::workflow::run_from_config(&config).await {
        Ok(summary) => {
            info!(
                run_id = %summary.run_id,
                records = summary.records_produced,
                "Course data worker finished"
            );
            Ok(())
        }
        Err(err) => {
            error!("Course data ingestion failed: {}", err);
            Err(err).context("Course data ingestion failed")
        }
    }
}
