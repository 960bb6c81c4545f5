//! RSI overbought/oversold reversal.
//!
//! BUY while RSI is below the oversold level, SELL while it is above the
//! overbought level. Strength is the relative depth into the zone.

use super::{require_window, Strategy, StrategyContext, StrategyError};
use crate::decimal::{DecimalExt, PRICE_SCALE};
use crate::domain::TradingSignal;
use crate::indicators::{Indicator, Rsi, RsiState, WindowTracker};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Line {
    Recompute(Rsi),
    Streaming(WindowTracker<RsiState>),
}

#[derive(Debug, Clone)]
pub struct RsiReversal {
    period: usize,
    oversold: Decimal,
    overbought: Decimal,
    description: String,
    line: Line,
}

impl RsiReversal {
    pub fn new(period: usize, oversold: Decimal, overbought: Decimal) -> Result<Self, StrategyError> {
        let hundred = Decimal::ONE_HUNDRED;
        if oversold <= Decimal::ZERO || oversold >= overbought || overbought >= hundred {
            return Err(StrategyError::InvalidParameter(format!(
                "rsi levels must satisfy 0 < oversold < overbought < 100, got {oversold} / {overbought}"
            )));
        }
        Ok(Self {
            period,
            oversold,
            overbought,
            description: format!(
                "RSI reversal, period={period}, oversold={oversold}, overbought={overbought}"
            ),
            line: Line::Recompute(Rsi::new(period)?),
        })
    }

    pub fn incremental(mut self, on: bool) -> Result<Self, StrategyError> {
        self.line = if on {
            Line::Streaming(WindowTracker::new(RsiState::new(self.period)?))
        } else {
            Line::Recompute(Rsi::new(self.period)?)
        };
        Ok(self)
    }

    fn oversold_strength(&self, rsi: Decimal) -> Decimal {
        (self.oversold - rsi)
            .div_half_up(self.oversold, PRICE_SCALE)
            .unwrap_or_default()
    }

    fn overbought_strength(&self, rsi: Decimal) -> Decimal {
        (rsi - self.overbought)
            .div_half_up(Decimal::ONE_HUNDRED - self.overbought, PRICE_SCALE)
            .unwrap_or_default()
    }
}

impl Strategy for RsiReversal {
    fn name(&self) -> &str {
        "rsi_reversal"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn min_bars_required(&self) -> usize {
        self.period + 2
    }

    fn generate_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
    ) -> Result<Option<TradingSignal>, StrategyError> {
        let bar = require_window(self.name(), self.min_bars_required(), ctx)?;
        let latest = match &mut self.line {
            Line::Recompute(rsi) => rsi.compute(ctx.bars).last().copied().flatten(),
            Line::Streaming(tracker) => tracker.sync(ctx.bars).1,
        };
        let Some(rsi) = latest else {
            return Ok(None);
        };

        if rsi < self.oversold {
            let reason = format!("rsi oversold: {rsi:.2} < {:.2}", self.oversold);
            return Ok(Some(
                TradingSignal::buy(bar, reason).with_strength(self.oversold_strength(rsi)),
            ));
        }
        if rsi > self.overbought {
            let reason = format!("rsi overbought: {rsi:.2} > {:.2}", self.overbought);
            return Ok(Some(
                TradingSignal::sell(bar, reason).with_strength(self.overbought_strength(rsi)),
            ));
        }
        Ok(None)
    }
}
