//! Bar source contract and in-process sources.
//!
//! A source answers one question: the ordered bars of a symbol within an
//! optional `[start, end)` window. Everything downstream assumes strictly
//! ascending timestamps, so sources verify ordering before handing bars out.

pub mod synthetic;

pub use synthetic::SyntheticSource;

use crate::domain::Bar;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Which bars to fetch. Both bounds are optional; `start` is inclusive and
/// `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarQuery {
    pub symbol: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl BarQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            start: None,
            end: None,
        }
    }

    pub fn between(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| timestamp >= s) && self.end.map_or(true, |e| timestamp < e)
    }

    fn check_range(&self) -> Result<(), DataError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => Err(DataError::InvalidRange { start, end }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid range: end {end} is before start {start}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("{source_name} requires both start and end in the query")]
    RangeRequired { source_name: &'static str },

    #[error("bars out of order at index {index}: {timestamp} does not follow {previous}")]
    Unordered {
        index: usize,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },

    #[error("data source error: {0}")]
    Backend(String),
}

/// Supplier of historical bars.
pub trait BarSource: Send + Sync {
    /// Human-readable source name, used in logs.
    fn name(&self) -> &str;

    /// Bars for `query.symbol` inside the query window, ascending by time.
    fn historical_bars(&self, query: &BarQuery) -> Result<Vec<Bar>, DataError>;
}

/// Reject sequences whose timestamps are not strictly ascending.
pub fn ensure_ascending(bars: &[Bar]) -> Result<(), DataError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(DataError::Unordered {
                index: i + 1,
                previous: pair[0].timestamp,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Bars held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: BTreeMap<String, Vec<Bar>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bars` under `symbol`, sorted by timestamp.
    pub fn insert(&mut self, symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<(), DataError> {
        bars.sort_by_key(|b| b.timestamp);
        ensure_ascending(&bars)?;
        self.series.insert(symbol.into(), bars);
        Ok(())
    }

    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        self.insert(symbol, bars)?;
        Ok(self)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

impl BarSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn historical_bars(&self, query: &BarQuery) -> Result<Vec<Bar>, DataError> {
        query.check_range()?;
        let bars = self
            .series
            .get(&query.symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: query.symbol.clone(),
            })?;
        Ok(bars
            .iter()
            .filter(|b| query.contains(b.timestamp))
            .cloned()
            .collect())
    }
}
