//! Average True Range (ATR) with Wilder smoothing.
//!
//! True range starts at bar 1 (it needs a previous close). The first ATR, at
//! index `period`, is the plain mean of `period` true ranges; after that
//! `atr = (atr × (period − 1) + tr) / period`, all at 4 places.
//! Lookback: period.

use super::{check_period, wilder_step, Indicator, IndicatorError, Series};
use crate::decimal::{from_count, DecimalExt, PRICE_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("atr", period)?;
        Ok(Self {
            period,
            name: format!("atr_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Series {
        let n = bars.len();
        let p = self.period;
        let mut result = vec![None; n];
        if n <= p {
            return result;
        }

        let tr: Vec<Decimal> = bars
            .windows(2)
            .map(|w| w[1].true_range(w[0].close))
            .collect();

        let seed: Decimal = tr[..p].iter().copied().sum();
        let Some(mut atr) = seed.div_half_up(from_count(p), PRICE_SCALE) else {
            return result;
        };
        result[p] = Some(atr);

        // tr[i - 1] is the true range of bar i
        for i in (p + 1)..n {
            atr = wilder_step(atr, tr[i - 1], p, PRICE_SCALE);
            result[i] = Some(atr);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{bars_from_ints, make_bars};
    use rust_decimal_macros::dec;

    #[test]
    fn constant_range_gives_constant_atr() {
        // make_bars: flat closes give h - l = 2 on every bar
        let bars = bars_from_ints(&[100; 8]);
        let result = Atr::new(3).unwrap().compute(&bars);
        assert!(result[..3].iter().all(Option::is_none));
        for v in &result[3..] {
            assert_eq!(*v, Some(dec!(2)));
        }
    }

    #[test]
    fn seed_then_wilder() {
        // closes 10, 12, 11, 15: true ranges 4, 3, 6
        let bars = make_bars(&[dec!(10), dec!(12), dec!(11), dec!(15)]);
        assert_eq!(bars[1].true_range(bars[0].close), dec!(4));
        assert_eq!(bars[2].true_range(bars[1].close), dec!(3));
        assert_eq!(bars[3].true_range(bars[2].close), dec!(6));

        let result = Atr::new(2).unwrap().compute(&bars);
        assert_eq!(result[1], None);
        // (4 + 3) / 2
        assert_eq!(result[2], Some(dec!(3.5)));
        // (3.5 * 1 + 6) / 2
        assert_eq!(result[3], Some(dec!(4.75)));
    }

    #[test]
    fn atr_lookback_and_short_input() {
        let atr = Atr::new(14).unwrap();
        assert_eq!(atr.lookback(), 14);
        let bars = bars_from_ints(&[1; 14]);
        assert!(atr.compute(&bars).iter().all(Option::is_none));
        assert!(Atr::new(0).is_err());
    }
}
