//! Writer backend trait for archive rows
//!
//! Defines the interface the pipeline flushes deduplicated rows through.

use super::record::InfohashRow;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Backend trait for persisting archive rows
#[async_trait]
pub trait InfohashSink: Send {
    /// Upsert one sub-batch atomically: rows sharing an infohash with a stored
    /// row replace it in full, and a failure applies nothing.
    async fn upsert_batch(&mut self, rows: &[InfohashRow]) -> Result<(), SinkError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
