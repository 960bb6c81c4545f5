//! MACD (moving average convergence/divergence).
//!
//! DIF = EMA(fast) − EMA(slow).
//! DEA is seeded with the plain mean of the first `signal` defined DIF values
//! (not with EMA's own seeding rule), then follows the EMA recurrence with
//! multiplier 2/(signal+1). The carried DEA is unrounded; only published
//! values are rounded to 4 places.
//! Histogram = (DIF − DEA) × 2.

use super::ema::ema_of_series;
use super::{check_period, Indicator, IndicatorError, Series};
use crate::decimal::{ema_multiplier, mean, DecimalExt, PRICE_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One MACD output point. Fields fill in as their warm-up completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub dif: Option<Decimal>,
    pub dea: Option<Decimal>,
    pub histogram: Option<Decimal>,
}

/// Which MACD line the `Indicator` impl publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdLine {
    Dif,
    Dea,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, IndicatorError> {
        check_period("macd", fast)?;
        check_period("macd", slow)?;
        check_period("macd", signal)?;
        if fast >= slow {
            return Err(IndicatorError::FastNotBelowSlow {
                indicator: "macd",
                fast,
                slow,
            });
        }
        Ok(Self {
            fast,
            slow,
            signal,
            line: MacdLine::Histogram,
            name: format!("macd_{fast}_{slow}_{signal}_histogram"),
        })
    }

    /// Select the line published through `Indicator::compute`.
    pub fn with_line(mut self, line: MacdLine) -> Self {
        let suffix = match line {
            MacdLine::Dif => "dif",
            MacdLine::Dea => "dea",
            MacdLine::Histogram => "histogram",
        };
        self.line = line;
        self.name = format!("macd_{}_{}_{}_{suffix}", self.fast, self.slow, self.signal);
        self
    }

    pub fn periods(&self) -> (usize, usize, usize) {
        (self.fast, self.slow, self.signal)
    }

    /// Full DIF/DEA/histogram output, aligned with `bars`.
    pub fn compute_points(&self, bars: &[Bar]) -> Vec<MacdPoint> {
        let closes = super::closes(bars);
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let dif: Series = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let dea = signal_line(&dif, self.signal);

        dif.iter()
            .zip(&dea)
            .map(|(&dif, &dea)| MacdPoint {
                dif,
                dea,
                histogram: histogram(dif, dea),
            })
            .collect()
    }
}

pub(crate) fn histogram(dif: Option<Decimal>, dea: Option<Decimal>) -> Option<Decimal> {
    Some((dif? - dea?) * Decimal::TWO)
}

/// One DEA recurrence step after the seed. The result is carried as is.
pub(crate) fn dea_step(prev: Decimal, dif: Decimal, multiplier: Decimal) -> Decimal {
    (dif - prev) * multiplier + prev
}

pub(crate) fn publish_dea(carried: Option<Decimal>) -> Option<Decimal> {
    carried.map(|dea| dea.round_half_up(PRICE_SCALE))
}

/// DEA over a DIF series: mean-seeded, then EMA-smoothed.
fn signal_line(dif: &Series, signal: usize) -> Series {
    let mut result = vec![None; dif.len()];
    let multiplier = ema_multiplier(signal);
    let mut seed: Vec<Decimal> = Vec::with_capacity(signal);
    let mut dea: Option<Decimal> = None;

    for (i, value) in dif.iter().enumerate() {
        let Some(value) = *value else { continue };
        dea = match dea {
            Some(prev) => Some(dea_step(prev, value, multiplier)),
            None => {
                seed.push(value);
                if seed.len() == signal {
                    mean(&seed, PRICE_SCALE)
                } else {
                    None
                }
            }
        };
        result[i] = publish_dea(dea);
    }
    result
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Dif => self.slow - 1,
            MacdLine::Dea | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Series {
        self.compute_points(bars)
            .into_iter()
            .map(|p| match self.line {
                MacdLine::Dif => p.dif,
                MacdLine::Dea => p.dea,
                MacdLine::Histogram => p.histogram,
            })
            .collect()
    }
}
