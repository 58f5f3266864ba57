//! Raw source documents
//!
//! The catalog and prerequisite documents come either from local fixture files
//! or from remote URLs, depending on the run mode. Both are fetched
//! concurrently under one deadline; either failing fails the run.

use crate::error::{FetchError, IngestError, SourceDocument};
use async_trait::async_trait;
use dplan_common::config::{CATALOG_FILE_NAME, PREREQ_FILE_NAME};
use dplan_common::WorkerConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("dplan-ingest/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Supplier of the two raw JSON documents
#[async_trait]
pub trait RawDataSource: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Fetch one document as raw bytes
    async fn fetch(&self, document: SourceDocument) -> Result<Vec<u8>, FetchError>;
}

/// Reads the fixture files `catalog.json` and `prereq_data.json`
pub struct LocalFileSource {
    catalog_path: PathBuf,
    prereq_path: PathBuf,
}

impl LocalFileSource {
    /// Fixture files inside `data_dir`
    pub fn new(data_dir: &Path) -> Self {
        Self::from_paths(data_dir.join(CATALOG_FILE_NAME), data_dir.join(PREREQ_FILE_NAME))
    }

    pub fn from_paths(catalog_path: PathBuf, prereq_path: PathBuf) -> Self {
        Self {
            catalog_path,
            prereq_path,
        }
    }

    fn path_for(&self, document: SourceDocument) -> &Path {
        match document {
            SourceDocument::Catalog => &self.catalog_path,
            SourceDocument::Prerequisites => &self.prereq_path,
        }
    }
}

#[async_trait]
impl RawDataSource for LocalFileSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, document: SourceDocument) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(document);
        debug!(document = %document, path = %path.display(), "Reading fixture document");

        tokio::fs::read(path).await.map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Downloads both documents over HTTP(S)
pub struct HttpSource {
    http_client: reqwest::Client,
    catalog_url: String,
    prereq_url: String,
}

impl HttpSource {
    pub fn new(catalog_url: impl Into<String>, prereq_url: impl Into<String>) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            catalog_url: catalog_url.into(),
            prereq_url: prereq_url.into(),
        })
    }

    fn url_for(&self, document: SourceDocument) -> &str {
        match document {
            SourceDocument::Catalog => &self.catalog_url,
            SourceDocument::Prerequisites => &self.prereq_url,
        }
    }
}

#[async_trait]
impl RawDataSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, document: SourceDocument) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(document);
        debug!(document = %document, url = %url, "Downloading document");

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Pick the source for the configured run mode
///
/// `Prod` downloads from the configured URLs; `Dev` and `Unspecified` read
/// the fixtures under `data_dir`.
pub fn source_from_config(config: &WorkerConfig) -> Result<Box<dyn RawDataSource>, IngestError> {
    if !config.run_mode.uses_remote() {
        return Ok(Box::new(LocalFileSource::from_paths(
            config.catalog_fixture_path(),
            config.prereq_fixture_path(),
        )));
    }

    // validate() guarantees both URLs in prod mode
    let catalog_url = config.course_data_url.clone().unwrap_or_default();
    let prereq_url = config.course_prereq_data_url.clone().unwrap_or_default();

    let source = HttpSource::new(catalog_url, prereq_url).map_err(|source| {
        IngestError::SourceSetup {
            source_name: "http",
            source,
        }
    })?;
    Ok(Box::new(source))
}

/// Both documents, undecoded
#[derive(Debug, Clone)]
pub struct RawDocuments {
    pub catalog: Vec<u8>,
    pub prerequisites: Vec<u8>,
}

/// Fetch both documents concurrently under a single deadline
///
/// The first failure (including the deadline passing) aborts the other fetch.
pub async fn fetch_documents(
    source: &dyn RawDataSource,
    deadline: Duration,
) -> Result<RawDocuments, IngestError> {
    let deadline_at = Instant::now() + deadline;

    let (catalog, prerequisites) = tokio::try_join!(
        fetch_before(source, SourceDocument::Catalog, deadline_at, deadline),
        fetch_before(source, SourceDocument::Prerequisites, deadline_at, deadline),
    )?;

    info!(
        source = source.name(),
        catalog_bytes = catalog.len(),
        prerequisite_bytes = prerequisites.len(),
        "Fetched source documents"
    );

    Ok(RawDocuments {
        catalog,
        prerequisites,
    })
}

async fn fetch_before(
    source: &dyn RawDataSource,
    document: SourceDocument,
    deadline_at: Instant,
    deadline: Duration,
) -> Result<Vec<u8>, IngestError> {
    let result = match tokio::time::timeout_at(deadline_at, source.fetch(document)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout { deadline }),
    };

    result.map_err(|source| IngestError::Fetch { document, source })
}
