//! The immutable bundle a finished run produces.

use crate::domain::{Account, TradeRecord};
use crate::engine::{EngineConfig, EquityCurve, StrategyWarning};
use crate::metrics::PerformanceMetrics;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Version of the serialized result layout.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub config: EngineConfig,

    pub strategy_name: String,
    pub strategy_description: String,
    pub symbol: String,
    pub first_bar: NaiveDateTime,
    pub last_bar: NaiveDateTime,
    pub total_bars: usize,
    pub bars_processed: usize,
    pub warmup_bars: usize,

    pub final_account: Account,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: EquityCurve,
    pub metrics: PerformanceMetrics,
    pub warnings: Vec<StrategyWarning>,
}

impl BacktestResult {
    /// Recompute the metrics from this result's own trade log and equity curve.
    pub fn recompute_metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::compute(
            self.metrics.initial_capital,
            self.metrics.final_capital,
            &self.trades,
            &self.equity_curve.values(),
            self.metrics.elapsed_days,
        )
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
