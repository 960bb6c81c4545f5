//! Relative Strength Index (RSI) with Wilder smoothing.
//!
//! Gains and losses are close-to-close changes. The first averages are simple
//! means of the first `period` changes; after that
//! `avg = (avg × (period − 1) + sample) / period` at 10 places.
//! RSI = 100 when the average loss is zero, else `100 − 100 / (1 + RS)`,
//! published at 2 places.
//! Lookback: period (the first value needs `period` changes).

use super::{check_period, wilder_step, Indicator, IndicatorError, Series};
use crate::decimal::{from_count, DecimalExt, PRICE_SCALE, RATIO_SCALE, RSI_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("rsi", period)?;
        Ok(Self {
            period,
            name: format!("rsi_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Split a close-to-close change into (gain, loss), both non-negative.
pub(crate) fn gain_loss(prev_close: Decimal, close: Decimal) -> (Decimal, Decimal) {
    let change = close - prev_close;
    if change > Decimal::ZERO {
        (change, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -change)
    }
}

/// RSI from smoothed averages. A zero average loss yields 100.
pub(crate) fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    let Some(rs) = avg_gain.div_half_up(avg_loss, RATIO_SCALE) else {
        return Decimal::ONE_HUNDRED;
    };
    let scaled = Decimal::ONE_HUNDRED
        .div_half_up(Decimal::ONE + rs, PRICE_SCALE)
        .unwrap_or(Decimal::ZERO);
    (Decimal::ONE_HUNDRED - scaled).round_half_up(RSI_SCALE)
}

impl Indicator for Rsi {
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

        let changes: Vec<(Decimal, Decimal)> = bars
            .windows(2)
            .map(|w| gain_loss(w[0].close, w[1].close))
            .collect();

        let divisor = from_count(p);
        let (gain_sum, loss_sum) = changes[..p]
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(g, l), &(cg, cl)| {
                (g + cg, l + cl)
            });
        let (Some(mut avg_gain), Some(mut avg_loss)) = (
            gain_sum.div_half_up(divisor, RATIO_SCALE),
            loss_sum.div_half_up(divisor, RATIO_SCALE),
        ) else {
            return result;
        };
        result[p] = Some(rsi_value(avg_gain, avg_loss));

        // changes[i - 1] is the change into bar i
        for i in (p + 1)..n {
            let (gain, loss) = changes[i - 1];
            avg_gain = wilder_step(avg_gain, gain, p, RATIO_SCALE);
            avg_loss = wilder_step(avg_loss, loss, p, RATIO_SCALE);
            result[i] = Some(rsi_value(avg_gain, avg_loss));
        }
        result
    }
}
