//! Dual simple-moving-average crossover.
//!
//! BUY on a golden cross (fast SMA moves from at-or-below the slow SMA to
//! strictly above it), SELL on a death cross. Strength grows with the gap
//! between the two averages.

use super::{
    crossed_above, crossed_below, relative_gap_strength, require_window, Strategy,
    StrategyContext, StrategyError,
};
use crate::domain::{Bar, TradingSignal};
use crate::indicators::{Indicator, IndicatorError, Sma, SmaState, WindowTracker};
use rust_decimal::Decimal;

type Pair = (Decimal, Decimal);

#[derive(Debug, Clone)]
enum Lines {
    Recompute { fast: Sma, slow: Sma },
    Streaming {
        fast: WindowTracker<SmaState>,
        slow: WindowTracker<SmaState>,
    },
}

#[derive(Debug, Clone)]
pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
    description: String,
    lines: Lines,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, StrategyError> {
        if fast_period >= slow_period {
            return Err(IndicatorError::FastNotBelowSlow {
                indicator: "ma_crossover",
                fast: fast_period,
                slow: slow_period,
            }
            .into());
        }
        Ok(Self {
            fast_period,
            slow_period,
            description: format!("SMA crossover, fast={fast_period}, slow={slow_period}"),
            lines: Lines::Recompute {
                fast: Sma::new(fast_period)?,
                slow: Sma::new(slow_period)?,
            },
        })
    }

    /// Switch between streaming trackers and full recomputation.
    pub fn incremental(mut self, on: bool) -> Result<Self, StrategyError> {
        self.lines = if on {
            Lines::Streaming {
                fast: WindowTracker::new(SmaState::new(self.fast_period)?),
                slow: WindowTracker::new(SmaState::new(self.slow_period)?),
            }
        } else {
            Lines::Recompute {
                fast: Sma::new(self.fast_period)?,
                slow: Sma::new(self.slow_period)?,
            }
        };
        Ok(self)
    }

    pub fn periods(&self) -> (usize, usize) {
        (self.fast_period, self.slow_period)
    }

    /// (fast, slow) at the previous and the latest bar.
    fn last_two(&mut self, bars: &[Bar]) -> Option<(Pair, Pair)> {
        match &mut self.lines {
            Lines::Recompute { fast, slow } => {
                let f = fast.compute(bars);
                let s = slow.compute(bars);
                let n = bars.len();
                if n < 2 {
                    return None;
                }
                Some(((f[n - 2]?, s[n - 2]?), (f[n - 1]?, s[n - 1]?)))
            }
            Lines::Streaming { fast, slow } => {
                let (f_prev, f_cur) = fast.sync(bars);
                let (s_prev, s_cur) = slow.sync(bars);
                Some(((f_prev?, s_prev?), (f_cur?, s_cur?)))
            }
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn min_bars_required(&self) -> usize {
        self.slow_period + 1
    }

    fn generate_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
    ) -> Result<Option<TradingSignal>, StrategyError> {
        let bar = require_window(self.name(), self.min_bars_required(), ctx)?;
        let Some((prev, cur)) = self.last_two(ctx.bars) else {
            return Ok(None);
        };
        let (fast, slow) = cur;

        if crossed_above(prev, cur) {
            let reason = format!("golden cross: fast {fast:.2} above slow {slow:.2}");
            return Ok(Some(
                TradingSignal::buy(bar, reason).with_strength(relative_gap_strength(fast, slow)),
            ));
        }
        if crossed_below(prev, cur) {
            let reason = format!("death cross: fast {fast:.2} below slow {slow:.2}");
            return Ok(Some(
                TradingSignal::sell(bar, reason).with_strength(relative_gap_strength(slow, fast)),
            ));
        }
        Ok(None)
    }
}
