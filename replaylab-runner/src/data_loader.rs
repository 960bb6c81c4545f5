//! Bar loading for the runner.
//!
//! Resolves the `[data]` section into a `BarSource`:
//! - `synthetic`: the core's seeded random walk
//! - `csv`: a `timestamp,open,high,low,close,volume` file read with the `csv` crate
//!
//! Every loaded series is fingerprinted with BLAKE3 so a run can be tied to
//! the exact bars it replayed.

use crate::config::DataConfig;
use chrono::{NaiveDate, NaiveDateTime};
use replaylab_core::data::{ensure_ascending, BarQuery, BarSource, DataError, SyntheticSource};
use replaylab_core::domain::Bar;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Errors from the CSV layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{}: row {row}: {message}", .path.display())]
    InvalidRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Raw row; numbers stay text until parsed exactly as decimals.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|e| format!("bad {column} '{raw}': {e}"))
}

/// Accepts `2024-01-02T00:00:00`, `2024-01-02 00:00:00` or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Bars for one symbol from a CSV file. The file holds a single series; the
/// symbol comes from the query.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate every row, in file order.
    pub fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, LoadError> {
        let csv_err = |source: csv::Error| LoadError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(csv_err)?;

        let mut bars = Vec::new();
        for (i, record) in reader.deserialize::<CsvRecord>().enumerate() {
            let row = i + 1;
            let record = record.map_err(csv_err)?;
            let invalid = |message: String| LoadError::InvalidRow {
                path: self.path.clone(),
                row,
                message,
            };
            let timestamp = parse_timestamp(&record.timestamp)
                .ok_or_else(|| invalid(format!("bad timestamp '{}'", record.timestamp)))?;
            let bar = Bar::new(
                symbol,
                timestamp,
                parse_decimal("open", &record.open).map_err(invalid)?,
                parse_decimal("high", &record.high).map_err(invalid)?,
                parse_decimal("low", &record.low).map_err(invalid)?,
                parse_decimal("close", &record.close).map_err(invalid)?,
                parse_decimal("volume", &record.volume).map_err(invalid)?,
            )
            .map_err(|e| invalid(e.to_string()))?;
            bars.push(bar);
        }
        ensure_ascending(&bars)?;
        debug!(path = %self.path.display(), rows = bars.len(), "csv loaded");
        Ok(bars)
    }
}

impl BarSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn historical_bars(&self, query: &BarQuery) -> Result<Vec<Bar>, DataError> {
        let bars = self
            .read_all(&query.symbol)
            .map_err(|e| match e {
                LoadError::Data(inner) => inner,
                other => DataError::Backend(other.to_string()),
            })?;
        Ok(bars.into_iter().filter(|b| query.contains(b.timestamp)).collect())
    }
}

/// The source a `[data]` section describes.
pub fn source_for(data: &DataConfig) -> Box<dyn BarSource> {
    match data {
        DataConfig::Synthetic { seed, base_price } => {
            Box::new(SyntheticSource::new(*seed).with_base_price(*base_price))
        }
        DataConfig::Csv { path } => Box::new(CsvSource::new(path.clone())),
    }
}

/// BLAKE3 over every bar's fields, in order.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        let line = format!(
            "{}|{}|{}|{}|{}|{}|{}\n",
            bar.symbol, bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
        hasher.update(line.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
