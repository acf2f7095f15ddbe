//! Pipeline-level error taxonomy
//!
//! Every fatal error carries the input line it was raised at so the operator
//! knows where a re-run would have to look.

use crate::ingest_core::batch::PartitionError;
use crate::ingest_core::record::DecodeError;
use crate::ingest_core::writer_backend::SinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading the crawl log failed.
    #[error("I/O error after line {line}: {source}")]
    Io {
        line: u64,
        #[source]
        source: std::io::Error,
    },

    /// A line is not valid JSON, or one of its records has no usable infohash.
    #[error("malformed input on line {line}: {source}")]
    MalformedLine {
        line: u64,
        #[source]
        source: DecodeError,
    },

    #[error("batch partitioning failed while flushing at line {line}: {source}")]
    Partition {
        line: u64,
        #[source]
        source: PartitionError,
    },

    /// A sub-batch write was rejected; nothing of that sub-batch was applied.
    #[error("persistence failed while flushing at line {line}: {source}")]
    Persistence {
        line: u64,
        #[source]
        source: SinkError,
    },
}

impl IngestError {
    /// Name of the collaborator that raised the error.
    pub fn collaborator(&self) -> &'static str {
        match self {
            IngestError::Io { .. } => "line source",
            IngestError::MalformedLine { .. } => "record decoder",
            IngestError::Partition { .. } => "batch partitioner",
            IngestError::Persistence { .. } => "persistence sink",
        }
    }

    /// Input line the failure is attributed to.
    pub fn line(&self) -> u64 {
        match self {
            IngestError::Io { line, .. }
            | IngestError::MalformedLine { line, .. }
            | IngestError::Partition { line, .. }
            | IngestError::Persistence { line, .. } => *line,
        }
    }
}
