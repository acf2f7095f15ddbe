//! Crawl Ingest Binary - DHT Crawler Dump to Infohash Archive
//!
//! Reads a crawler dump line by line, deduplicates infohashes per window and
//! upserts them into the SQLite archive.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin crawl_ingest -- --input dht_out.txt --db data/db/Infohashes.sqlite
//! ```
//!
//! ## Environment Variables
//!
//! - CRAWL_LOG_PATH - Crawler dump to read (default: data/dht_crawler_out.txt)
//! - CRAWLSINK_DB_PATH - SQLite archive path (default: data/db/Infohashes.sqlite)
//! - FLUSH_INTERVAL_LINES - Lines per window before flushing (default: 10000)
//! - SQLITE_MAX_VARIABLE_NUMBER - Bound values allowed per statement (default: 999)
//! - ROW_SOURCE_TAG - Value of the `source` column (default: dht_crawler)
//! - RUST_LOG - Logging level (optional, default: info)

use crawlsink::ingest_core::{IngestPipeline, LineSource, PipelineSettings, SqliteInfohashWriter};
use crawlsink::{IngestConfig, IngestError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let mut config = IngestConfig::from_env()?;
    let args: Vec<String> = env::args().collect();
    config.apply_args(&args)?;

    log::info!("🚀 Starting crawl log ingestion");
    log::info!("   Input: {}", config.input_path.display());
    log::info!("   Archive: {}", config.db_path.display());
    log::info!("   Flush interval: {} lines", config.flush_interval_lines);
    log::info!("   Max bound parameters: {}", config.max_bound_parameters);
    log::info!("   Source tag: {}", config.source_tag);

    let source = LineSource::open(&config.input_path).await.map_err(|source| {
        log::error!("❌ Cannot open {}: {}", config.input_path.display(), source);
        IngestError::Io { line: 0, source }
    })?;
    let writer = SqliteInfohashWriter::new(&config.db_path)?;

    let mut pipeline = IngestPipeline::new(PipelineSettings::from(&config), writer);
    match pipeline.run(source).await {
        Ok(summary) => {
            log::info!("total lines processed: {}", summary.lines_processed);
            Ok(())
        }
        Err(e) => {
            log::error!(
                "❌ Ingestion failed in {} at line {}: {}",
                e.collaborator(),
                e.line(),
                e
            );
            Err(e.into())
        }
    }
}
