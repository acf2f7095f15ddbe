//! Ingestion configuration from environment variables
//!
//! Environment variables:
//! - `CRAWL_LOG_PATH` (default: data/dht_crawler_out.txt)
//! - `CRAWLSINK_DB_PATH` (default: data/db/Infohashes.sqlite)
//! - `FLUSH_INTERVAL_LINES` (default: 10000)
//! - `SQLITE_MAX_VARIABLE_NUMBER` (default: 999)
//! - `ROW_SOURCE_TAG` (default: dht_crawler)
//!
//! `--input <path>` and `--db <path>` on the command line override the paths.

use crate::ingest_core::record::ROW_COLUMNS;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_FLUSH_INTERVAL_LINES: u64 = 10_000;
pub const DEFAULT_MAX_BOUND_PARAMETERS: usize = 999;
pub const DEFAULT_SOURCE_TAG: &str = "dht_crawler";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Crawl log to read
    pub input_path: PathBuf,

    /// SQLite archive file
    pub db_path: PathBuf,

    /// Lines per aggregation window
    pub flush_interval_lines: u64,

    /// Bound-parameter limit of one insert statement
    pub max_bound_parameters: usize,

    /// Value stored in the `source` column
    pub source_tag: String,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            input_path: lookup("CRAWL_LOG_PATH")
                .unwrap_or_else(|| "data/dht_crawler_out.txt".to_string())
                .into(),
            db_path: lookup("CRAWLSINK_DB_PATH")
                .unwrap_or_else(|| "data/db/Infohashes.sqlite".to_string())
                .into(),
            flush_interval_lines: parse_or(
                &lookup,
                "FLUSH_INTERVAL_LINES",
                DEFAULT_FLUSH_INTERVAL_LINES,
            )?,
            max_bound_parameters: parse_or(
                &lookup,
                "SQLITE_MAX_VARIABLE_NUMBER",
                DEFAULT_MAX_BOUND_PARAMETERS,
            )?,
            source_tag: lookup("ROW_SOURCE_TAG").unwrap_or_else(|| DEFAULT_SOURCE_TAG.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `--input` / `--db` overrides from command-line arguments
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        if let Some(path) = flag_value(args, "--input")? {
            self.input_path = path.into();
        }
        if let Some(path) = flag_value(args, "--db")? {
            self.db_path = path.into();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_lines == 0 {
            return Err(ConfigError::InvalidValue(
                "FLUSH_INTERVAL_LINES must be greater than 0".to_string(),
            ));
        }

        if self.max_bound_parameters < ROW_COLUMNS.len() {
            return Err(ConfigError::InvalidValue(format!(
                "SQLITE_MAX_VARIABLE_NUMBER must be at least {} (one row), got {}",
                ROW_COLUMNS.len(),
                self.max_bound_parameters
            )));
        }

        if self.source_tag.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ROW_SOURCE_TAG cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

fn flag_value(args: &[String], flag: &str) -> Result<Option<String>, ConfigError> {
    match args.iter().position(|arg| arg == flag) {
        Some(idx) => match args.get(idx + 1) {
            Some(value) if !value.starts_with("--") => Ok(Some(value.clone())),
            _ => Err(ConfigError::InvalidValue(format!("{} requires a path", flag))),
        },
        None => Ok(None),
    }
}
