//! Paired CSV output.
//!
//! [`DualSink`] owns both output tables behind a single lock. One call to
//! [`DualSink::write_pair`] appends the raw row and the normalized row while
//! holding that lock, so row `i` of one table always belongs to the same
//! article as row `i` of the other.
//!
//! Both rows are CSV-encoded in memory before either table is touched. The
//! first I/O failure on either table marks the sink as failed: every later
//! write is refused with [`CrawlError::SinkFailed`] and [`DualSink::finish`]
//! reports the failure, so a crawl never keeps filling one table while the
//! other has stopped.

use crate::error::{CrawlError, Result};
use crate::models::ArticlePair;
use crate::utils::ensure_parent_dir;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

const HEADER: [&str; 3] = ["Title", "Body", "Link"];

/// Encode rows with a throwaway CSV writer and return the bytes.
fn encode(fill: impl FnOnce(&mut Writer<Vec<u8>>) -> csv::Result<()>) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    fill(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| CrawlError::Io(io::Error::new(e.error().kind(), e.error().to_string())))
}

fn encode_row<T: Serialize>(row: &T) -> Result<Vec<u8>> {
    encode(|w| w.serialize(row))
}

struct Tables<W: Write> {
    raw: W,
    normalized: W,
    rows: usize,
    failure: Option<String>,
}

impl<W: Write> Tables<W> {
    fn ensure_usable(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(CrawlError::SinkFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn poison(&mut self, e: io::Error) -> CrawlError {
        error!(error = %e, rows = self.rows, "Output tables failed; refusing further rows");
        self.failure = Some(e.to_string());
        CrawlError::Io(e)
    }

    /// Append pre-encoded bytes to both tables.
    fn commit(&mut self, raw: &[u8], normalized: &[u8]) -> Result<()> {
        self.ensure_usable()?;
        let written = self
            .raw
            .write_all(raw)
            .and_then(|()| self.normalized.write_all(normalized));
        written.map_err(|e| self.poison(e))
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_usable()?;
        let flushed = self.raw.flush().and_then(|()| self.normalized.flush());
        flushed.map_err(|e| self.poison(e))
    }
}

/// Two CSV tables written in lockstep.
///
/// Rows still buffered when the sink is dropped are flushed by the
/// [`BufWriter`]s' own `Drop`, so an early return after [`DualSink::create`]
/// loses nothing.
pub struct DualSink<W: Write = BufWriter<File>> {
    tables: Mutex<Tables<W>>,
}

impl DualSink<BufWriter<File>> {
    /// Create (or truncate) both files and write their header rows.
    ///
    /// # Arguments
    ///
    /// * `raw` - Path of the table receiving the extracted text
    /// * `normalized` - Path of the table receiving the normalized text
    ///
    /// # Errors
    ///
    /// Fails if a parent directory or either file cannot be created, or if a
    /// header cannot be written.
    #[instrument(level = "info", skip_all, fields(raw = %raw.display(), normalized = %normalized.display()))]
    pub fn create(raw: &Path, normalized: &Path) -> Result<Self> {
        ensure_parent_dir(raw)?;
        ensure_parent_dir(normalized)?;
        let sink = Self::from_writers(
            BufWriter::new(File::create(raw)?),
            BufWriter::new(File::create(normalized)?),
        )?;
        info!("Output tables created");
        Ok(sink)
    }
}

impl<W: Write> DualSink<W> {
    /// Wrap two writers and write the header row to each.
    pub fn from_writers(raw: W, normalized: W) -> Result<Self> {
        let header = encode(|w| w.write_record(HEADER))?;
        let mut tables = Tables {
            raw,
            normalized,
            rows: 0,
            failure: None,
        };
        tables.commit(&header, &header)?;
        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    /// Append one article to both tables atomically with respect to other pairs.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Csv`] if a row cannot be encoded (nothing is written),
    /// [`CrawlError::Io`] if a table rejects the bytes, and
    /// [`CrawlError::SinkFailed`] for every call after such a rejection.
    pub async fn write_pair(&self, pair: &ArticlePair) -> Result<()> {
        let raw = encode_row(pair.raw())?;
        let normalized = encode_row(pair.normalized())?;
        let mut tables = self.tables.lock().await;
        tables.commit(&raw, &normalized)?;
        tables.rows += 1;
        Ok(())
    }

    /// Whether an earlier write failed and the sink refuses new rows.
    pub async fn is_failed(&self) -> bool {
        self.tables.lock().await.failure.is_some()
    }

    /// Flush both tables. Returns the number of pairs written.
    pub async fn finish(&self) -> Result<usize> {
        let mut tables = self.tables.lock().await;
        tables.flush()?;
        info!(rows = tables.rows, "Output tables flushed");
        Ok(tables.rows)
    }
}
