//! Bollinger Bands.
//!
//! Middle = SMA(period) at 4 places. Variance is the population variance of
//! the window around the middle (10 places); the band is `k × sqrt(variance)`.
//! Upper/lower = middle ± band, rounded to 4 places.
//! Lookback: period - 1.

use super::{check_period, Indicator, IndicatorError, Series};
use crate::decimal::{from_count, DecimalExt, PRICE_SCALE, RATIO_SCALE};
use crate::domain::Bar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BollingerBands {
    pub fn bandwidth(&self) -> Decimal {
        self.upper - self.lower
    }
}

/// Which band the `Indicator` impl publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: Decimal,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: Decimal) -> Result<Self, IndicatorError> {
        check_period("bollinger", period)?;
        if multiplier.is_sign_negative() && !multiplier.is_zero() {
            return Err(IndicatorError::NegativeMultiplier {
                indicator: "bollinger",
                value: multiplier,
            });
        }
        Ok(Self {
            period,
            multiplier,
            band: BollingerBand::Middle,
            name: format!("bollinger_middle_{period}_{multiplier}"),
        })
    }

    pub fn with_band(mut self, band: BollingerBand) -> Self {
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        self.band = band;
        self.name = format!("bollinger_{label}_{}_{}", self.period, self.multiplier);
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }

    /// All three bands, aligned with `bars`.
    pub fn compute_bands(&self, bars: &[Bar]) -> Vec<Option<BollingerBands>> {
        let closes = super::closes(bars);
        let mut result = vec![None; closes.len()];
        if closes.len() < self.period {
            return result;
        }
        for i in (self.period - 1)..closes.len() {
            let window = &closes[i + 1 - self.period..=i];
            result[i] = bands_of_window(window, self.multiplier);
        }
        result
    }
}

/// Bands for one full window of closes.
pub(crate) fn bands_of_window(window: &[Decimal], multiplier: Decimal) -> Option<BollingerBands> {
    let n = from_count(window.len());
    let sum: Decimal = window.iter().copied().sum();
    let middle = sum.div_half_up(n, PRICE_SCALE)?;
    let squares: Decimal = window
        .iter()
        .map(|c| {
            let d = *c - middle;
            d * d
        })
        .sum();
    let variance = squares.div_half_up(n, RATIO_SCALE)?;
    let std_dev = variance.sqrt_half_up(RATIO_SCALE)?;
    let band = std_dev * multiplier;
    Some(BollingerBands {
        upper: (middle + band).round_half_up(PRICE_SCALE),
        middle,
        lower: (middle - band).round_half_up(PRICE_SCALE),
    })
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Series {
        self.compute_bands(bars)
            .into_iter()
            .map(|b| {
                b.map(|b| match self.band {
                    BollingerBand::Upper => b.upper,
                    BollingerBand::Middle => b.middle,
                    BollingerBand::Lower => b.lower,
                })
            })
            .collect()
    }
}
