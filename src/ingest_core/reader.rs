//! Line source over a crawl log file
//!
//! Yields non-blank lines in file order. `\n` and `\r\n` endings are both
//! stripped. The file handle is owned by the reader and closed when it drops.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

pub struct LineSource<R> {
    lines: Lines<R>,
    blank_lines: u64,
}

impl LineSource<BufReader<File>> {
    /// Open a crawl log for reading from the beginning
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path.as_ref()).await?;
        log::info!("📖 Reading crawl log: {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            blank_lines: 0,
        }
    }

    /// Next non-blank line, or `None` at end of input
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        while let Some(line) = self.lines.next_line().await? {
            if line.trim().is_empty() {
                self.blank_lines += 1;
                continue;
            }
            return Ok(Some(line));
        }
        Ok(None)
    }

    pub fn blank_lines_skipped(&self) -> u64 {
        self.blank_lines
    }
}
