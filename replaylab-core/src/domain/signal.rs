//! Trading signals produced by strategies, one bar at a time.

use super::bar::Bar;
use crate::decimal::DecimalExt;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
    Close,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalType::Buy => "BUY",
            SignalType::Sell => "SELL",
            SignalType::Hold => "HOLD",
            SignalType::Close => "CLOSE",
        };
        f.write_str(s)
    }
}

/// A strategy's decision for the latest bar of its window.
///
/// Signals are never persisted beyond the bar that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub signal_type: SignalType,
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Confidence in `[0, 1]`.
    pub strength: Decimal,
    pub reason: String,
}

impl TradingSignal {
    /// Signal at the bar's close with full strength.
    pub fn at_close(signal_type: SignalType, bar: &Bar, reason: impl Into<String>) -> Self {
        Self {
            signal_type,
            symbol: bar.symbol.clone(),
            timestamp: bar.timestamp,
            price: bar.close,
            stop_loss: None,
            take_profit: None,
            strength: Decimal::ONE,
            reason: reason.into(),
        }
    }

    pub fn buy(bar: &Bar, reason: impl Into<String>) -> Self {
        Self::at_close(SignalType::Buy, bar, reason)
    }

    pub fn sell(bar: &Bar, reason: impl Into<String>) -> Self {
        Self::at_close(SignalType::Sell, bar, reason)
    }

    pub fn close(bar: &Bar, reason: impl Into<String>) -> Self {
        Self::at_close(SignalType::Close, bar, reason)
    }

    /// Set strength, clamped into `[0, 1]`.
    pub fn with_strength(mut self, strength: Decimal) -> Self {
        self.strength = strength.clamp_unit();
        self
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price);
        self
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price);
        self
    }
}
