//! Deterministic synthetic bars for demos and tests.
//!
//! A seeded random walk: each daily bar opens at the previous close, moves by
//! up to ±2.00, and gets wicks of up to 2.00 on either side. All prices are
//! whole cents; the walk never goes below 0.01.

use super::{BarQuery, BarSource, DataError};
use crate::domain::Bar;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const MIN_PRICE_CENTS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSource {
    seed: u64,
    base_price: Decimal,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(42)
    }
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base_price: Decimal::ONE_HUNDRED,
        }
    }

    /// Starting open; rounded to cents.
    pub fn with_base_price(mut self, base_price: Decimal) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn historical_bars(&self, query: &BarQuery) -> Result<Vec<Bar>, DataError> {
        let (Some(start), Some(end)) = (query.start, query.end) else {
            return Err(DataError::RangeRequired {
                source_name: "synthetic",
            });
        };
        if end < start {
            return Err(DataError::InvalidRange { start, end });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let base = (self.base_price * Decimal::ONE_HUNDRED).round();
        let mut open = base.to_i64().unwrap_or(10_000).max(MIN_PRICE_CENTS);
        let mut bars = Vec::new();
        let mut t = start;

        while t < end {
            let change: i64 = rng.gen_range(-200..=200);
            let close = (open + change).max(MIN_PRICE_CENTS);
            let high = open.max(close) + rng.gen_range(0..=200);
            let low = (open.min(close) - rng.gen_range(0..=200)).max(MIN_PRICE_CENTS);
            let volume: i64 = 1_000_000 + rng.gen_range(0..5_000_000);

            let bar = Bar::new(
                query.symbol.clone(),
                t,
                cents(open),
                cents(high),
                cents(low),
                cents(close),
                Decimal::from(volume),
            )
            .map_err(|e| DataError::Backend(e.to_string()))?;
            bars.push(bar);

            open = close;
            t += Duration::days(1);
        }
        Ok(bars)
    }
}
