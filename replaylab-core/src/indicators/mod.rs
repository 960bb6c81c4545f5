//! Technical indicators over ordered bar sequences.
//!
//! Every indicator is a pure function of the bar slice: same length out as in,
//! `None` wherever the lookback window is not yet full. Values are exact
//! decimals rounded half-up to a fixed published scale.
//!
//! Multi-series indicators (MACD, Bollinger) expose their full output through
//! `compute_points()` / `compute_bands()` and a single selected line through
//! the `Indicator` trait.
//!
//! [`incremental`] holds the streaming counterparts: one `update()` per bar,
//! identical output to recomputing the batch function over the growing prefix.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod incremental;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand, BollingerBands};
pub use ema::Ema;
pub use incremental::{
    stream_all, AtrState, BollingerState, EmaState, MacdState, RsiState, SmaState,
    StreamingIndicator, WindowTracker,
};
pub use macd::{Macd, MacdLine, MacdPoint};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::decimal::{DecimalExt, RATIO_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;
use thiserror::Error;

/// Aligned indicator output: `None` marks warm-up positions.
pub type Series = Vec<Option<Decimal>>;

/// Trait for single-series indicators.
///
/// # Look-ahead guard
/// The value at bar t depends only on bars `0..=t`. Truncating the input
/// never changes an already-computed value.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always `None`.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Series;
}

/// Invalid indicator parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("{indicator}: period must be >= 1")]
    ZeroPeriod { indicator: &'static str },

    #[error("{indicator}: fast period {fast} must be below slow period {slow}")]
    FastNotBelowSlow {
        indicator: &'static str,
        fast: usize,
        slow: usize,
    },

    #[error("{indicator}: multiplier {value} must be non-negative")]
    NegativeMultiplier {
        indicator: &'static str,
        value: Decimal,
    },
}

pub(crate) fn check_period(indicator: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod { indicator });
    }
    Ok(())
}

/// Close prices of a bar slice.
pub fn closes(bars: &[Bar]) -> Vec<Decimal> {
    bars.iter().map(|b| b.close).collect()
}

/// One EMA recurrence step: `(value − prev) × multiplier + prev`, carried at `RATIO_SCALE`.
pub(crate) fn ema_step(prev: Decimal, value: Decimal, multiplier: Decimal) -> Decimal {
    ((value - prev) * multiplier + prev).round_half_up(RATIO_SCALE)
}

/// One Wilder smoothing step: `(avg × (period − 1) + sample) / period`.
pub(crate) fn wilder_step(avg: Decimal, sample: Decimal, period: usize, scale: u32) -> Decimal {
    let p = crate::decimal::from_count(period);
    (avg * (p - Decimal::ONE) + sample)
        .div_half_up(p, scale)
        .unwrap_or(avg)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1, low = min(open,close) - 1, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[Decimal]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + Decimal::ONE,
                low: open.min(close) - Decimal::ONE,
                close,
                volume: Decimal::from(1000),
            }
        })
        .collect()
}

/// Bars from integer closes.
#[cfg(test)]
pub fn bars_from_ints(closes: &[i64]) -> Vec<Bar> {
    let closes: Vec<Decimal> = closes.iter().map(|&c| Decimal::from(c)).collect();
    make_bars(&closes)
}
