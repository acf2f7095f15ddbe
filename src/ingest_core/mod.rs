//! Ingest Core - Crawl Log Deduplication Pipeline
//!
//! Streams a DHT crawler dump (one JSON record or array of records per line)
//! into the SQLite infohash archive, one row per infohash.
//!
//! # Architecture
//!
//! ```text
//! Crawl log → LineSource → decode_line → AggregationWindow
//!     ↓ (every N lines, and once at end of input)
//! partition (≤ max bound parameters per statement)
//!     ↓
//! InfohashSink → SQLite INSERT OR REPLACE
//! ```

pub mod batch;
pub mod driver;
pub mod reader;
pub mod record;
pub mod sqlite_writer;
pub mod window;
pub mod writer_backend;

pub use batch::{partition, rows_per_batch, PartitionError};
pub use driver::{IngestPipeline, IngestSummary, PipelineSettings, PipelineState};
pub use reader::LineSource;
pub use record::{decode_line, CrawlItem, DecodeError, IncompleteRecord, InfohashRow, Observation, Payload};
pub use sqlite_writer::SqliteInfohashWriter;
pub use window::{AggregatedObservation, AggregationWindow};
pub use writer_backend::{InfohashSink, SinkError};
