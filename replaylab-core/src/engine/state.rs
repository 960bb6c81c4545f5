//! Engine configuration and the mutable state of one replay.

use super::equity::EquityCurve;
use super::{EngineError, StrategyWarning};
use crate::domain::Account;
use crate::ledger::{Ledger, LedgerConfig};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: Decimal,
    /// Inclusive start of the replay window.
    pub start: Option<NaiveDateTime>,
    /// Exclusive end of the replay window.
    pub end: Option<NaiveDateTime>,
    pub commission_rate: Decimal,
    pub slippage: Decimal,
    /// Fraction of available balance committed per open.
    pub position_size_ratio: Decimal,
    pub allow_short: bool,
    pub max_positions: usize,
    pub currency: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(100_000),
            start: None,
            end: None,
            commission_rate: Decimal::new(1, 3),
            slippage: Decimal::ZERO,
            position_size_ratio: Decimal::ONE,
            allow_short: false,
            max_positions: 1,
            currency: "USD".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            ..Self::default()
        }
    }

    /// Check every numeric bound before any bar is replayed.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: String| Err(EngineError::InvalidConfig(reason));
        if self.initial_capital <= Decimal::ZERO {
            return invalid(format!("initial_capital must be > 0, got {}", self.initial_capital));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return invalid(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            ));
        }
        if self.slippage < Decimal::ZERO {
            return invalid(format!("slippage must be >= 0, got {}", self.slippage));
        }
        if self.position_size_ratio < Decimal::ZERO || self.position_size_ratio > Decimal::ONE {
            return invalid(format!(
                "position_size_ratio must be in [0, 1], got {}",
                self.position_size_ratio
            ));
        }
        if self.max_positions != 1 {
            return invalid(format!(
                "max_positions must be 1 for single-asset replay, got {}",
                self.max_positions
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return invalid(format!("end {end} is before start {start}"));
            }
        }
        Ok(())
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            commission_rate: self.commission_rate,
            position_size_ratio: self.position_size_ratio,
            slippage: self.slippage,
        }
    }

    /// Whole days of the run: the configured window if both ends are set,
    /// otherwise the span between the first and last bar.
    pub fn elapsed_days(&self, first_bar: NaiveDateTime, last_bar: NaiveDateTime) -> i64 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).num_days(),
            _ => (last_bar - first_bar).num_days(),
        }
    }
}

/// Everything that changes while bars are replayed.
#[derive(Debug)]
pub(crate) struct ReplayState {
    pub ledger: Ledger,
    pub equity: EquityCurve,
    pub warnings: Vec<StrategyWarning>,
    pub bars_processed: usize,
}

impl ReplayState {
    pub fn new(config: &EngineConfig, capacity: usize) -> Self {
        let account = Account::new("backtest", config.initial_capital, config.currency.clone());
        Self {
            ledger: Ledger::new(account, config.ledger_config()),
            equity: EquityCurve::with_capacity(capacity),
            warnings: Vec::new(),
            bars_processed: 0,
        }
    }
}
