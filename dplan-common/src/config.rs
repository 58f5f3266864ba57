//! Configuration loading for the course data worker
//!
//! Resolution priority for every setting:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! A missing TOML file is not an error. The worker starts on defaults and
//! logs a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable selecting the run mode
pub const ENV_RUN_MODE: &str = "DPLAN_ENV";
/// Remote catalog document URL
pub const ENV_COURSE_DATA_URL: &str = "DPLAN_COURSE_DATA_URL";
/// Remote prerequisite document URL
pub const ENV_COURSE_PREREQ_DATA_URL: &str = "DPLAN_COURSE_PREREQ_DATA_URL";
/// Directory holding the local fixture documents
pub const ENV_DATA_DIR: &str = "DPLAN_DATA_DIR";
/// SQLite database file
pub const ENV_DATABASE_PATH: &str = "DPLAN_DATABASE_PATH";
/// Deadline covering both document fetches, in seconds
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DPLAN_FETCH_TIMEOUT_SECS";
/// Explicit TOML config file location
pub const ENV_CONFIG_FILE: &str = "DPLAN_CONFIG";

/// Catalog document file name under the data directory
pub const CATALOG_FILE_NAME: &str = "catalog.json";
/// Prerequisite document file name under the data directory
pub const PREREQ_FILE_NAME: &str = "prereq_data.json";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Where the source documents come from
///
/// Three-valued on purpose: an unset or unrecognized mode is kept distinct
/// from an explicit `dev`, but both read the local fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Local fixture files
    Dev,
    /// Remote URLs
    Prod,
    /// Absent or unrecognized value; behaves like `Dev`
    #[default]
    Unspecified,
}

impl RunMode {
    /// Parse a mode string; anything other than dev/prod is `Unspecified`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => RunMode::Dev,
            "prod" | "production" => RunMode::Prod,
            _ => RunMode::Unspecified,
        }
    }

    /// True when documents are fetched over HTTP
    pub fn uses_remote(&self) -> bool {
        matches!(self, RunMode::Prod)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Dev => "dev",
            RunMode::Prod => "prod",
            RunMode::Unspecified => "unspecified",
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// On-disk TOML configuration; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run_mode: Option<String>,
    pub course_data_url: Option<String>,
    pub course_prereq_data_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fully resolved worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub run_mode: RunMode,
    pub course_data_url: Option<String>,
    pub course_prereq_data_url: Option<String>,
    /// Directory containing `catalog.json` and `prereq_data.json`
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    /// Single deadline wrapping both document fetches
    pub fetch_timeout: Duration,
    pub log_level: String,
}

impl WorkerConfig {
    /// Resolve the configuration from `path` (if any), the environment and defaults
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let toml_config = match path {
            Some(path) => load_toml_config(path)?,
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        };
        Self::resolve(&toml_config)
    }

    /// Resolve settings from environment over `toml_config` over defaults
    pub fn resolve(toml_config: &TomlConfig) -> Result<Self> {
        let run_mode = env_value(ENV_RUN_MODE)
            .or_else(|| toml_config.run_mode.clone())
            .map(|mode| RunMode::parse(&mode))
            .unwrap_or_default();

        let course_data_url =
            env_value(ENV_COURSE_DATA_URL).or_else(|| toml_config.course_data_url.clone());
        let course_prereq_data_url = env_value(ENV_COURSE_PREREQ_DATA_URL)
            .or_else(|| toml_config.course_prereq_data_url.clone());

        let data_dir = match env_value(ENV_DATA_DIR).map(PathBuf::from) {
            Some(dir) => dir,
            None => match &toml_config.data_dir {
                Some(dir) => dir.clone(),
                None => default_data_dir()?,
            },
        };

        let database_path = env_value(ENV_DATABASE_PATH)
            .map(PathBuf::from)
            .or_else(|| toml_config.database_path.clone())
            .unwrap_or_else(default_database_path);

        let fetch_timeout_secs = match env_value(ENV_FETCH_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be a whole number of seconds: {}", ENV_FETCH_TIMEOUT_SECS, e))
            })?,
            None => toml_config
                .fetch_timeout_secs
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        let config = Self {
            run_mode,
            course_data_url,
            course_prereq_data_url,
            data_dir,
            database_path,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            log_level: toml_config.logging.level.clone(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.run_mode.uses_remote() {
            if self.course_data_url.as_deref().map_or(true, is_blank) {
                return Err(Error::Config(format!(
                    "{} is required in prod mode",
                    ENV_COURSE_DATA_URL
                )));
            }
            if self.course_prereq_data_url.as_deref().map_or(true, is_blank) {
                return Err(Error::Config(format!(
                    "{} is required in prod mode",
                    ENV_COURSE_PREREQ_DATA_URL
                )));
            }
        }

        if self.fetch_timeout.is_zero() {
            return Err(Error::Config("fetch timeout must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Local fixture path of the catalog document
    pub fn catalog_fixture_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE_NAME)
    }

    /// Local fixture path of the prerequisite document
    pub fn prereq_fixture_path(&self) -> PathBuf {
        self.data_dir.join(PREREQ_FILE_NAME)
    }
}

/// Path of the TOML config file: `DPLAN_CONFIG`, else the platform config dir
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_value(ENV_CONFIG_FILE) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("dplan").join("dplan-ingest.toml"))
}

/// Read a TOML config file
///
/// A missing file yields defaults. An unreadable or malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found: {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    debug!("Loaded config file: {}", path.display());
    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !is_blank(v))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn default_data_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join("data"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dplan").join("dplan.db"))
        .unwrap_or_else(|| PathBuf::from("./dplan_data/dplan.db"))
}
