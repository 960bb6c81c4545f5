//! Strategy contract and the classic reference strategies.
//!
//! A strategy sees the visible window `bars[0..=i]` plus a read-only view of
//! the account and returns at most one signal for the latest bar. Strategies
//! may keep state between calls (streaming indicator trackers), hence
//! `&mut self`.
//!
//! Every classic strategy has two indicator modes: recompute the batch
//! indicator over the whole window on each call, or keep streaming state in a
//! [`WindowTracker`](crate::indicators::WindowTracker). Both yield identical
//! signals.

pub mod bollinger_reversion;
pub mod ma_crossover;
pub mod macd_crossover;
pub mod rsi_reversal;

pub use bollinger_reversion::BollingerReversion;
pub use ma_crossover::MaCrossover;
pub use macd_crossover::MacdCrossover;
pub use rsi_reversal::RsiReversal;

use crate::decimal::{DecimalExt, PRICE_SCALE};
use crate::domain::{Account, Bar, Position, TradingSignal};
use crate::indicators::IndicatorError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a strategy may look at for one bar.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub symbol: &'a str,
    /// Visible window; the last element is the current bar.
    pub bars: &'a [Bar],
    pub account: &'a Account,
    pub position: Option<&'a Position>,
}

impl<'a> StrategyContext<'a> {
    pub fn latest_bar(&self) -> Option<&'a Bar> {
        self.bars.last()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("{strategy}: needs {required} bars, window has {available}")]
    InsufficientBars {
        strategy: String,
        required: usize,
        available: usize,
    },

    #[error("invalid strategy parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("strategy fault: {0}")]
    Fault(String),
}

/// A pluggable signal producer.
pub trait Strategy: Send + Sync {
    /// Short identifier (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Human-readable parameter summary.
    fn description(&self) -> &str;

    /// Warm-up length; the engine starts replay at this bar index.
    fn min_bars_required(&self) -> usize;

    /// Decide on the latest bar of `ctx.bars`.
    ///
    /// Must only read `ctx.bars`; an `Err` is treated by the engine as "no
    /// signal" for this bar.
    fn generate_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
    ) -> Result<Option<TradingSignal>, StrategyError>;
}

/// Strength used when the scale of a signal cannot be measured.
pub(crate) const NEUTRAL_STRENGTH: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Reject windows shorter than the strategy's warm-up; returns the latest bar.
pub(crate) fn require_window<'a>(
    strategy: &str,
    required: usize,
    ctx: &StrategyContext<'a>,
) -> Result<&'a Bar, StrategyError> {
    let available = ctx.bars.len();
    match ctx.latest_bar() {
        Some(bar) if available >= required => Ok(bar),
        _ => Err(StrategyError::InsufficientBars {
            strategy: strategy.to_string(),
            required,
            available,
        }),
    }
}

/// `min(1, |a − b| / mean(a, b) × 10)`; 0.5 when the mean is zero.
pub(crate) fn relative_gap_strength(a: Decimal, b: Decimal) -> Decimal {
    let Some(avg) = (a + b).div_half_up(Decimal::TWO, PRICE_SCALE) else {
        return NEUTRAL_STRENGTH;
    };
    (a - b)
        .abs()
        .div_half_up(avg, PRICE_SCALE)
        .map_or(NEUTRAL_STRENGTH, |ratio| (ratio * Decimal::TEN).min(Decimal::ONE))
}

/// `true` when `a` crosses from at-or-below `b` to strictly above it.
pub(crate) fn crossed_above(prev: (Decimal, Decimal), cur: (Decimal, Decimal)) -> bool {
    prev.0 <= prev.1 && cur.0 > cur.1
}

/// `true` when `a` crosses from at-or-above `b` to strictly below it.
pub(crate) fn crossed_below(prev: (Decimal, Decimal), cur: (Decimal, Decimal)) -> bool {
    prev.0 >= prev.1 && cur.0 < cur.1
}

fn default_fast() -> usize {
    10
}
fn default_slow() -> usize {
    20
}
fn default_rsi_period() -> usize {
    14
}
fn default_oversold() -> Decimal {
    Decimal::from(30)
}
fn default_overbought() -> Decimal {
    Decimal::from(70)
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}
fn default_bb_period() -> usize {
    20
}
fn default_bb_k() -> Decimal {
    Decimal::TWO
}

/// Serializable strategy selection, as written in run configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MaCrossover {
        #[serde(default = "default_fast")]
        fast: usize,
        #[serde(default = "default_slow")]
        slow: usize,
        #[serde(default)]
        incremental: bool,
    },
    RsiReversal {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_oversold")]
        oversold: Decimal,
        #[serde(default = "default_overbought")]
        overbought: Decimal,
        #[serde(default)]
        incremental: bool,
    },
    MacdCrossover {
        #[serde(default = "default_macd_fast")]
        fast: usize,
        #[serde(default = "default_macd_slow")]
        slow: usize,
        #[serde(default = "default_macd_signal")]
        signal: usize,
        #[serde(default)]
        incremental: bool,
    },
    BollingerReversion {
        #[serde(default = "default_bb_period")]
        period: usize,
        #[serde(default = "default_bb_k")]
        k: Decimal,
        #[serde(default)]
        incremental: bool,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MaCrossover {
            fast: default_fast(),
            slow: default_slow(),
            incremental: false,
        }
    }
}

impl StrategyConfig {
    /// Construct the configured strategy, validating its parameters.
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(match *self {
            StrategyConfig::MaCrossover {
                fast,
                slow,
                incremental,
            } => Box::new(MaCrossover::new(fast, slow)?.incremental(incremental)?),
            StrategyConfig::RsiReversal {
                period,
                oversold,
                overbought,
                incremental,
            } => Box::new(
                RsiReversal::new(period, oversold, overbought)?.incremental(incremental)?,
            ),
            StrategyConfig::MacdCrossover {
                fast,
                slow,
                signal,
                incremental,
            } => Box::new(MacdCrossover::new(fast, slow, signal)?.incremental(incremental)?),
            StrategyConfig::BollingerReversion {
                period,
                k,
                incremental,
            } => Box::new(BollingerReversion::new(period, k)?.incremental(incremental)?),
        })
    }

    /// Same strategy, with the indicator mode switched.
    pub fn with_incremental(mut self, on: bool) -> Self {
        match &mut self {
            StrategyConfig::MaCrossover { incremental, .. }
            | StrategyConfig::RsiReversal { incremental, .. }
            | StrategyConfig::MacdCrossover { incremental, .. }
            | StrategyConfig::BollingerReversion { incremental, .. } => *incremental = on,
        }
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gap_strength_is_capped() {
        // |105 - 100| / 102.5 = 0.0488 -> 0.488
        assert_eq!(relative_gap_strength(dec!(105), dec!(100)), dec!(0.488));
        assert_eq!(relative_gap_strength(dec!(200), dec!(100)), Decimal::ONE);
        assert_eq!(relative_gap_strength(dec!(1), dec!(-1)), dec!(0.5));
    }

    #[test]
    fn cross_detection() {
        assert!(crossed_above((dec!(1), dec!(1)), (dec!(2), dec!(1))));
        assert!(!crossed_above((dec!(2), dec!(1)), (dec!(3), dec!(1))));
        assert!(crossed_below((dec!(1), dec!(1)), (dec!(0), dec!(1))));
        assert!(!crossed_below((dec!(1), dec!(1)), (dec!(1), dec!(1))));
    }

    #[test]
    fn config_parses_tagged_json_with_defaults() {
        let cfg: StrategyConfig = serde_json::from_str(r#"{"type":"rsi_reversal"}"#).unwrap();
        assert_eq!(
            cfg,
            StrategyConfig::RsiReversal {
                period: 14,
                oversold: dec!(30),
                overbought: dec!(70),
                incremental: false,
            }
        );
        let strategy = cfg.build().unwrap();
        assert_eq!(strategy.min_bars_required(), 16);
    }

    #[test]
    fn build_rejects_bad_parameters() {
        let bad = StrategyConfig::MaCrossover {
            fast: 20,
            slow: 10,
            incremental: false,
        };
        assert!(bad.build().is_err());
        let bad = StrategyConfig::BollingerReversion {
            period: 0,
            k: dec!(2),
            incremental: true,
        };
        assert!(bad.build().is_err());
    }

    #[test]
    fn with_incremental_toggles_mode() {
        let cfg = StrategyConfig::default().with_incremental(true);
        assert!(matches!(
            cfg,
            StrategyConfig::MaCrossover {
                incremental: true,
                ..
            }
        ));
    }

    #[test]
    fn short_window_is_an_error() {
        let mut strategy = MaCrossover::new(2, 3).unwrap();
        let bars = crate::indicators::bars_from_ints(&[1, 2]);
        let account = Account::new("a", dec!(1), "USD");
        let ctx = StrategyContext {
            symbol: "TEST",
            bars: &bars,
            account: &account,
            position: None,
        };
        assert!(matches!(
            strategy.generate_signal(&ctx),
            Err(StrategyError::InsufficientBars { required: 4, available: 2, .. })
        ));
    }
}
