//! MACD signal-line crossover.
//!
//! BUY when DIF crosses above DEA, SELL when it crosses below. Strength is
//! `min(1, |histogram| × 10)`.

use super::{
    crossed_above, crossed_below, require_window, Strategy, StrategyContext, StrategyError,
    NEUTRAL_STRENGTH,
};
use crate::domain::{Bar, TradingSignal};
use crate::indicators::{Macd, MacdPoint, MacdState, WindowTracker};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Lines {
    Recompute(Macd),
    Streaming(WindowTracker<MacdState>),
}

#[derive(Debug, Clone)]
pub struct MacdCrossover {
    fast: usize,
    slow: usize,
    signal: usize,
    description: String,
    lines: Lines,
}

impl MacdCrossover {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, StrategyError> {
        Ok(Self {
            fast,
            slow,
            signal,
            description: format!("MACD crossover, fast={fast}, slow={slow}, signal={signal}"),
            lines: Lines::Recompute(Macd::new(fast, slow, signal)?),
        })
    }

    pub fn incremental(mut self, on: bool) -> Result<Self, StrategyError> {
        self.lines = if on {
            Lines::Streaming(WindowTracker::new(MacdState::new(
                self.fast,
                self.slow,
                self.signal,
            )?))
        } else {
            Lines::Recompute(Macd::new(self.fast, self.slow, self.signal)?)
        };
        Ok(self)
    }

    fn last_two(&mut self, bars: &[Bar]) -> (Option<MacdPoint>, Option<MacdPoint>) {
        match &mut self.lines {
            Lines::Recompute(macd) => {
                let points = macd.compute_points(bars);
                let n = points.len();
                if n < 2 {
                    return (None, None);
                }
                (Some(points[n - 2]), Some(points[n - 1]))
            }
            Lines::Streaming(tracker) => tracker.sync(bars),
        }
    }
}

fn dif_dea(point: Option<MacdPoint>) -> Option<(Decimal, Decimal)> {
    let point = point?;
    Some((point.dif?, point.dea?))
}

fn histogram_strength(point: &MacdPoint) -> Decimal {
    point
        .histogram
        .map_or(NEUTRAL_STRENGTH, |h| (h.abs() * Decimal::TEN).min(Decimal::ONE))
}

impl Strategy for MacdCrossover {
    fn name(&self) -> &str {
        "macd_crossover"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn min_bars_required(&self) -> usize {
        self.slow + self.signal
    }

    fn generate_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
    ) -> Result<Option<TradingSignal>, StrategyError> {
        let bar = require_window(self.name(), self.min_bars_required(), ctx)?;
        let (prev_point, cur_point) = self.last_two(ctx.bars);
        let (Some(prev), Some(cur), Some(point)) =
            (dif_dea(prev_point), dif_dea(cur_point), cur_point)
        else {
            return Ok(None);
        };
        let (dif, dea) = cur;

        if crossed_above(prev, cur) {
            let reason = format!("macd golden cross: dif {dif:.4} above dea {dea:.4}");
            return Ok(Some(
                TradingSignal::buy(bar, reason).with_strength(histogram_strength(&point)),
            ));
        }
        if crossed_below(prev, cur) {
            let reason = format!("macd death cross: dif {dif:.4} below dea {dea:.4}");
            return Ok(Some(
                TradingSignal::sell(bar, reason).with_strength(histogram_strength(&point)),
            ));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalType;
    use crate::strategy::test_support::signals_over;
    use rust_decimal_macros::dec;

    fn closes(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    #[test]
    fn reversal_after_decline_is_a_buy() {
        let series = closes(&[20, 19, 18, 17, 16, 15, 14, 13, 15, 18, 22]);
        let signals = signals_over(&mut MacdCrossover::new(2, 4, 2).unwrap(), &series);
        let first = signals.iter().flatten().next().unwrap();
        assert_eq!(first.signal_type, SignalType::Buy);
        assert_eq!(first.strength, Decimal::ONE);
    }

    #[test]
    fn reversal_after_rally_is_a_sell() {
        let series = closes(&[10, 11, 12, 13, 14, 15, 16, 17, 15, 12, 8]);
        let signals = signals_over(&mut MacdCrossover::new(2, 4, 2).unwrap(), &series);
        let first = signals.iter().flatten().next().unwrap();
        assert_eq!(first.signal_type, SignalType::Sell);
    }

    #[test]
    fn histogram_strength_scales_and_caps() {
        let point = |h: Option<Decimal>| MacdPoint {
            dif: Some(dec!(1)),
            dea: Some(dec!(1)),
            histogram: h,
        };
        assert_eq!(histogram_strength(&point(Some(dec!(-0.03)))), dec!(0.3));
        assert_eq!(histogram_strength(&point(Some(dec!(0.5)))), Decimal::ONE);
        assert_eq!(histogram_strength(&point(None)), dec!(0.5));
    }

    #[test]
    fn streaming_mode_matches_recompute() {
        let series = closes(&[
            40, 41, 43, 42, 40, 38, 37, 39, 42, 45, 44, 41, 38, 36, 37, 40, 43, 46, 44, 41, 39,
        ]);
        let batch = signals_over(&mut MacdCrossover::new(3, 6, 3).unwrap(), &series);
        let mut streaming = MacdCrossover::new(3, 6, 3)
            .unwrap()
            .incremental(true)
            .unwrap();
        assert_eq!(signals_over(&mut streaming, &series), batch);
        assert!(batch.iter().any(Option::is_some));
    }

    #[test]
    fn warm_up_covers_signal_line() {
        assert_eq!(MacdCrossover::new(12, 26, 9).unwrap().min_bars_required(), 35);
        assert!(MacdCrossover::new(26, 12, 9).is_err());
    }
}
