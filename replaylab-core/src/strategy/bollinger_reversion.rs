//! Bollinger band mean reversion.
//!
//! BUY when the close breaks below the lower band, SELL when it breaks above
//! the upper band. Both signals carry the middle band as take-profit.

use super::{require_window, Strategy, StrategyContext, StrategyError, NEUTRAL_STRENGTH};
use crate::decimal::{DecimalExt, PRICE_SCALE};
use crate::domain::TradingSignal;
use crate::indicators::{Bollinger, BollingerBands, BollingerState, WindowTracker};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Bands {
    Recompute(Bollinger),
    Streaming(WindowTracker<BollingerState>),
}

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    period: usize,
    k: Decimal,
    description: String,
    bands: Bands,
}

impl BollingerReversion {
    pub fn new(period: usize, k: Decimal) -> Result<Self, StrategyError> {
        Ok(Self {
            period,
            k,
            description: format!("Bollinger reversion, period={period}, k={k}"),
            bands: Bands::Recompute(Bollinger::new(period, k)?),
        })
    }

    pub fn incremental(mut self, on: bool) -> Result<Self, StrategyError> {
        self.bands = if on {
            Bands::Streaming(WindowTracker::new(BollingerState::new(self.period, self.k)?))
        } else {
            Bands::Recompute(Bollinger::new(self.period, self.k)?)
        };
        Ok(self)
    }
}

/// `clamp(distance / bandwidth × 2)`; neutral when the bands have collapsed.
fn breakout_strength(distance: Decimal, bands: &BollingerBands) -> Decimal {
    distance
        .div_half_up(bands.bandwidth(), PRICE_SCALE)
        .map_or(NEUTRAL_STRENGTH, |ratio| (ratio * Decimal::TWO).clamp_unit())
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger_reversion"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn min_bars_required(&self) -> usize {
        self.period
    }

    fn generate_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
    ) -> Result<Option<TradingSignal>, StrategyError> {
        let bar = require_window(self.name(), self.min_bars_required(), ctx)?;
        let latest = match &mut self.bands {
            Bands::Recompute(bb) => bb.compute_bands(ctx.bars).last().copied().flatten(),
            Bands::Streaming(tracker) => tracker.sync(ctx.bars).1,
        };
        let Some(bands) = latest else {
            return Ok(None);
        };
        let close = bar.close;

        if close < bands.lower {
            let reason = format!("close {close:.2} below lower band {:.2}", bands.lower);
            return Ok(Some(
                TradingSignal::buy(bar, reason)
                    .with_strength(breakout_strength(bands.lower - close, &bands))
                    .with_take_profit(bands.middle),
            ));
        }
        if close > bands.upper {
            let reason = format!("close {close:.2} above upper band {:.2}", bands.upper);
            return Ok(Some(
                TradingSignal::sell(bar, reason)
                    .with_strength(breakout_strength(close - bands.upper, &bands))
                    .with_take_profit(bands.middle),
            ));
        }
        Ok(None)
    }
}
