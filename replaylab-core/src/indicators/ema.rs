//! Exponential Moving Average (EMA).
//!
//! Seed: EMA[period-1] = SMA of the first `period` values (4 places).
//! Recursive: EMA[t] = (close[t] - EMA[t-1]) * 2/(period+1) + EMA[t-1].
//! The carried state keeps 10 places; published values are rounded to 4.
//! Lookback: period - 1.

use super::{check_period, ema_step, Indicator, IndicatorError, Series};
use crate::decimal::{ema_multiplier, from_count, DecimalExt, PRICE_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("ema", period)?;
        Ok(Self {
            period,
            name: format!("ema_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// EMA over an arbitrary value series.
pub fn ema_of_series(values: &[Decimal], period: usize) -> Series {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let multiplier = ema_multiplier(period);
    let seed_sum: Decimal = values[..period].iter().copied().sum();
    let Some(seed) = seed_sum.div_half_up(from_count(period), PRICE_SCALE) else {
        return result;
    };
    result[period - 1] = Some(seed);

    let mut state = seed;
    for i in period..n {
        state = ema_step(state, values[i], multiplier);
        result[i] = Some(state.round_half_up(PRICE_SCALE));
    }
    result
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Series {
        ema_of_series(&super::closes(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::bars_from_ints;
    use rust_decimal_macros::dec;

    #[test]
    fn ema_period_1_equals_close() {
        let bars = bars_from_ints(&[10, 20, 30]);
        let result = Ema::new(1).unwrap().compute(&bars);
        assert_eq!(result, vec![Some(dec!(10)), Some(dec!(20)), Some(dec!(30))]);
    }

    #[test]
    fn ema_3_seed_then_recurrence() {
        // multiplier = 2 / 4 = 0.5
        let bars = bars_from_ints(&[2, 4, 6, 8, 12]);
        let result = Ema::new(3).unwrap().compute(&bars);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        // seed = mean(2, 4, 6) = 4
        assert_eq!(result[2], Some(dec!(4)));
        // (8 - 4) * 0.5 + 4 = 6
        assert_eq!(result[3], Some(dec!(6)));
        // (12 - 6) * 0.5 + 6 = 9
        assert_eq!(result[4], Some(dec!(9)));
    }

    #[test]
    fn ema_publishes_four_places() {
        // multiplier = 2 / 3 = 0.6666666667
        let bars = bars_from_ints(&[10, 11]);
        let result = Ema::new(2).unwrap().compute(&bars);
        assert_eq!(result[1], Some(dec!(10.5)));
        let bars = bars_from_ints(&[10, 11, 13]);
        let result = Ema::new(2).unwrap().compute(&bars);
        // (13 - 10.5) * 0.6666666667 + 10.5 = 12.16666666675 -> 12.1666666668
        assert_eq!(result[2], Some(dec!(12.1667)));
    }

    #[test]
    fn ema_warmup_is_period_minus_one() {
        let bars = bars_from_ints(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let ema = Ema::new(4).unwrap();
        let result = ema.compute(&bars);
        let leading = result.iter().take_while(|v| v.is_none()).count();
        assert_eq!(leading, 3);
        assert_eq!(ema.lookback(), 3);
    }

    #[test]
    fn ema_too_few_bars() {
        let bars = bars_from_ints(&[1, 2]);
        assert!(Ema::new(3).unwrap().compute(&bars).iter().all(Option::is_none));
        assert!(Ema::new(0).is_err());
    }
}
