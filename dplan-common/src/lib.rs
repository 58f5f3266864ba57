//! # Degree Planner Common Library
//!
//! Shared code for the degree planner services including:
//! - Common error type
//! - Configuration loading (environment + TOML)
//! - SQLite initialization and the course table schema

pub mod config;
pub mod db;
pub mod error;

pub use config::{RunMode, WorkerConfig};
pub use error::{Error, Result};
