//! Pipeline driver: line source → decoder → window → sub-batches → sink
//!
//! Single-threaded. Every `flush_interval` processed lines the window is
//! drained and written before the next line is read, so memory is bounded by
//! the distinct infohashes of one window. Counts are window-scoped: an
//! infohash seen in two windows is written twice, and the later write
//! replaces the earlier row.

use super::batch::partition;
use super::reader::LineSource;
use super::record::{decode_line, InfohashRow, ROW_COLUMNS};
use super::window::AggregationWindow;
use super::writer_backend::InfohashSink;
use crate::config::IngestConfig;
use crate::error::IngestError;
use chrono::{SecondsFormat, Utc};
use tokio::io::AsyncBufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Flushing,
    Draining,
    Done,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub lines_processed: u64,
    pub flushes: u64,
    pub rows_written: u64,
    pub incomplete_records: u64,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub flush_interval: u64,
    pub max_bound_parameters: usize,
    pub source_tag: String,
}

impl From<&IngestConfig> for PipelineSettings {
    fn from(config: &IngestConfig) -> Self {
        Self {
            flush_interval: config.flush_interval_lines,
            max_bound_parameters: config.max_bound_parameters,
            source_tag: config.source_tag.clone(),
        }
    }
}

pub struct IngestPipeline<S> {
    settings: PipelineSettings,
    sink: S,
    window: AggregationWindow,
    state: PipelineState,
    summary: IngestSummary,
}

impl<S: InfohashSink> IngestPipeline<S> {
    pub fn new(settings: PipelineSettings, sink: S) -> Self {
        Self {
            settings,
            sink,
            window: AggregationWindow::new(),
            state: PipelineState::Running,
            summary: IngestSummary::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the whole source. On a fatal error the current window is
    /// discarded and nothing more is written.
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        mut source: LineSource<R>,
    ) -> Result<IngestSummary, IngestError> {
        self.state = PipelineState::Running;
        match self.consume(&mut source).await {
            Ok(()) => {
                self.state = PipelineState::Done;
                log::info!(
                    "✅ Ingestion complete: {} lines, {} rows written in {} flushes ({} incomplete records, {} blank lines skipped)",
                    self.summary.lines_processed,
                    self.summary.rows_written,
                    self.summary.flushes,
                    self.summary.incomplete_records,
                    source.blank_lines_skipped()
                );
                Ok(self.summary.clone())
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                self.window.drain();
                Err(e)
            }
        }
    }

    async fn consume<R: AsyncBufRead + Unpin>(
        &mut self,
        source: &mut LineSource<R>,
    ) -> Result<(), IngestError> {
        loop {
            let line = source.next_line().await.map_err(|source| IngestError::Io {
                line: self.summary.lines_processed,
                source,
            })?;

            let Some(line) = line else {
                break;
            };

            self.summary.lines_processed += 1;
            let line_no = self.summary.lines_processed;
            self.ingest_line(line_no, &line)?;

            // an interval of 0 leaves only the final drain
            if self.settings.flush_interval > 0 && line_no % self.settings.flush_interval == 0 {
                log::info!("📊 {} {}", line_no, line);
                self.state = PipelineState::Flushing;
                self.flush(line_no).await?;
                self.state = PipelineState::Running;
            }
        }

        self.state = PipelineState::Draining;
        self.flush(self.summary.lines_processed).await
    }

    fn ingest_line(&mut self, line_no: u64, line: &str) -> Result<(), IngestError> {
        let records = decode_line(line).map_err(|source| IngestError::MalformedLine {
            line: line_no,
            source,
        })?;

        for record in records {
            match record {
                Ok(observation) => {
                    self.window.record(observation);
                }
                Err(incomplete) => {
                    self.summary.incomplete_records += 1;
                    log::warn!(
                        "⚠️  Incomplete record at line {} (infohash {}): {} - {}",
                        line_no,
                        incomplete.infohash,
                        incomplete.reason,
                        line
                    );
                }
            }
        }
        Ok(())
    }

    async fn flush(&mut self, line_no: u64) -> Result<(), IngestError> {
        let entries = self.window.drain();
        if entries.is_empty() {
            return Ok(());
        }

        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let rows: Vec<InfohashRow> = entries
            .into_iter()
            .map(|entry| {
                InfohashRow::from_observation(
                    entry.observation,
                    entry.occurrences,
                    &updated_at,
                    &self.settings.source_tag,
                )
            })
            .collect();

        let batches = partition(&rows, self.settings.max_bound_parameters, ROW_COLUMNS.len())
            .map_err(|source| IngestError::Partition {
                line: line_no,
                source,
            })?;

        let mut offset = 0;
        let mut sub_batches = 0;
        for batch in batches {
            log::debug!("Inserting infohash batch from: {}", offset);
            self.sink
                .upsert_batch(batch)
                .await
                .map_err(|source| IngestError::Persistence {
                    line: line_no,
                    source,
                })?;
            offset += batch.len();
            sub_batches += 1;
        }

        self.summary.flushes += 1;
        self.summary.rows_written += rows.len() as u64;
        log::info!(
            "💾 Flushed {} rows in {} sub-batches to {} at line {}",
            rows.len(),
            sub_batches,
            self.sink.backend_type(),
            line_no
        );
        Ok(())
    }
}
