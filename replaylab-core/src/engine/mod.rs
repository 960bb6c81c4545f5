//! Backtest engine: bar-by-bar replay of one symbol against one strategy.
//!
//! Replay starts at the strategy's warm-up index. For every bar after that:
//!
//! 1. Mark the open position to the bar's close
//! 2. Record start-of-bar total assets on the equity curve
//! 3. Ask the strategy for a signal on the visible window `bars[0..=i]`
//! 4. Execute the signal against the ledger
//!
//! After the last bar any open position is force-closed at the last close.

pub mod equity;
pub mod replay;
pub mod state;

pub use equity::{EquityCurve, EquityPoint};
pub use replay::BacktestEngine;
pub use state::EngineConfig;

use crate::data::DataError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exit reason recorded on the position still open after the last bar.
pub const END_OF_BACKTEST: &str = "end of backtest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no bars available for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("bar {index} is for {found}, expected {expected}")]
    SymbolMismatch {
        expected: String,
        found: String,
        index: usize,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// A strategy failure on one bar. The bar is treated as having no signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyWarning {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub message: String,
}
