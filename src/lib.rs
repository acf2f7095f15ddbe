pub mod config;
pub mod error;
pub mod ingest_core;
pub mod sqlite_pragma;

pub use config::{ConfigError, IngestConfig};
pub use error::IngestError;
