//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window, rounded half-up to
//! four places. Lookback: period - 1 (first valid value at index period-1).

use super::{check_period, Indicator, IndicatorError, Series};
use crate::decimal::{from_count, DecimalExt, PRICE_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("sma", period)?;
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// SMA over an arbitrary value series.
pub fn sma_of_series(values: &[Decimal], period: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let divisor = from_count(period);
    let mut sum: Decimal = values[..period].iter().copied().sum();
    result[period - 1] = sum.div_half_up(divisor, PRICE_SCALE);

    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = sum.div_half_up(divisor, PRICE_SCALE);
    }
    result
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Series {
        sma_of_series(&super::closes(bars), self.period)
    }
}
