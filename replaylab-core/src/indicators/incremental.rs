//! Streaming indicator state.
//!
//! Each state consumes one bar per `update()` and carries forward whatever the
//! batch computation would recompute: the rolling window sum, the last EMA,
//! the Wilder averages, the last ATR. Feeding bars `0..=i` returns exactly the
//! value the batch indicator yields at index `i`; the arithmetic steps are
//! shared with the batch code so the two cannot drift apart.
//!
//! [`WindowTracker`] adapts a state to the engine's calling pattern, where a
//! strategy sees the whole visible prefix on every bar.

use super::bollinger::{bands_of_window, BollingerBands};
use super::macd::{dea_step, histogram, publish_dea, MacdPoint};
use super::rsi::{gain_loss, rsi_value};
use super::{check_period, ema_step, wilder_step, IndicatorError};
use crate::decimal::{ema_multiplier, from_count, mean, DecimalExt, PRICE_SCALE, RATIO_SCALE};
use crate::domain::Bar;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::fmt::Debug;

/// One-bar-at-a-time indicator.
pub trait StreamingIndicator {
    type Output: Copy + Debug + PartialEq;

    /// Consume the next bar; `None` while warming up.
    fn update(&mut self, bar: &Bar) -> Option<Self::Output>;

    /// Forget all history.
    fn reset(&mut self);
}

/// Feed every bar through `state`, collecting the aligned outputs.
pub fn stream_all<S: StreamingIndicator>(state: &mut S, bars: &[Bar]) -> Vec<Option<S::Output>> {
    bars.iter().map(|bar| state.update(bar)).collect()
}

// ── SMA ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SmaState {
    period: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
}

impl SmaState {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("sma", period)?;
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: Decimal::ZERO,
        })
    }
}

impl StreamingIndicator for SmaState {
    type Output = Decimal;

    fn update(&mut self, bar: &Bar) -> Option<Decimal> {
        self.window.push_back(bar.close);
        self.sum += bar.close;
        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }
        if self.window.len() < self.period {
            return None;
        }
        self.sum.div_half_up(from_count(self.period), PRICE_SCALE)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = Decimal::ZERO;
    }
}

// ── EMA ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    multiplier: Decimal,
    count: usize,
    seed_sum: Decimal,
    state: Option<Decimal>,
}

impl EmaState {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("ema", period)?;
        Ok(Self {
            period,
            multiplier: ema_multiplier(period),
            count: 0,
            seed_sum: Decimal::ZERO,
            state: None,
        })
    }

    /// Consume a raw value rather than a bar close.
    pub fn push(&mut self, value: Decimal) -> Option<Decimal> {
        self.count += 1;
        match self.state {
            Some(prev) => {
                let next = ema_step(prev, value, self.multiplier);
                self.state = Some(next);
                Some(next.round_half_up(PRICE_SCALE))
            }
            None => {
                self.seed_sum += value;
                if self.count < self.period {
                    return None;
                }
                let seed = self
                    .seed_sum
                    .div_half_up(from_count(self.period), PRICE_SCALE)?;
                self.state = Some(seed);
                Some(seed)
            }
        }
    }
}

impl StreamingIndicator for EmaState {
    type Output = Decimal;

    fn update(&mut self, bar: &Bar) -> Option<Decimal> {
        self.push(bar.close)
    }

    fn reset(&mut self) {
        self.count = 0;
        self.seed_sum = Decimal::ZERO;
        self.state = None;
    }
}

// ── RSI ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_close: Option<Decimal>,
    changes: usize,
    gain_sum: Decimal,
    loss_sum: Decimal,
    averages: Option<(Decimal, Decimal)>,
}

impl RsiState {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("rsi", period)?;
        Ok(Self {
            period,
            prev_close: None,
            changes: 0,
            gain_sum: Decimal::ZERO,
            loss_sum: Decimal::ZERO,
            averages: None,
        })
    }
}

impl StreamingIndicator for RsiState {
    type Output = Decimal;

    fn update(&mut self, bar: &Bar) -> Option<Decimal> {
        let prev = self.prev_close.replace(bar.close)?;
        let (gain, loss) = gain_loss(prev, bar.close);
        let p = self.period;

        let (avg_gain, avg_loss) = match self.averages {
            Some((g, l)) => (
                wilder_step(g, gain, p, RATIO_SCALE),
                wilder_step(l, loss, p, RATIO_SCALE),
            ),
            None => {
                self.changes += 1;
                self.gain_sum += gain;
                self.loss_sum += loss;
                if self.changes < p {
                    return None;
                }
                let divisor = from_count(p);
                (
                    self.gain_sum.div_half_up(divisor, RATIO_SCALE)?,
                    self.loss_sum.div_half_up(divisor, RATIO_SCALE)?,
                )
            }
        };
        self.averages = Some((avg_gain, avg_loss));
        Some(rsi_value(avg_gain, avg_loss))
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.changes = 0;
        self.gain_sum = Decimal::ZERO;
        self.loss_sum = Decimal::ZERO;
        self.averages = None;
    }
}

// ── MACD ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: usize,
    multiplier: Decimal,
    seed: Vec<Decimal>,
    /// Unrounded signal line.
    dea: Option<Decimal>,
}

impl MacdState {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, IndicatorError> {
        check_period("macd", signal)?;
        if fast >= slow {
            return Err(IndicatorError::FastNotBelowSlow {
                indicator: "macd",
                fast,
                slow,
            });
        }
        Ok(Self {
            fast: EmaState::new(fast)?,
            slow: EmaState::new(slow)?,
            signal,
            multiplier: ema_multiplier(signal),
            seed: Vec::with_capacity(signal),
            dea: None,
        })
    }
}

impl StreamingIndicator for MacdState {
    type Output = MacdPoint;

    /// `None` until DIF is defined; DEA and histogram fill in later.
    fn update(&mut self, bar: &Bar) -> Option<MacdPoint> {
        let fast = self.fast.push(bar.close);
        let slow = self.slow.push(bar.close);
        let dif = fast? - slow?;

        self.dea = match self.dea {
            Some(prev) => Some(dea_step(prev, dif, self.multiplier)),
            None => {
                self.seed.push(dif);
                if self.seed.len() == self.signal {
                    mean(&self.seed, PRICE_SCALE)
                } else {
                    None
                }
            }
        };
        let dea = publish_dea(self.dea);
        Some(MacdPoint {
            dif: Some(dif),
            dea,
            histogram: histogram(Some(dif), dea),
        })
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.seed.clear();
        self.dea = None;
    }
}

// ── Bollinger ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BollingerState {
    period: usize,
    multiplier: Decimal,
    window: VecDeque<Decimal>,
}

impl BollingerState {
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
            window: VecDeque::with_capacity(period + 1),
        })
    }
}

impl StreamingIndicator for BollingerState {
    type Output = BollingerBands;

    fn update(&mut self, bar: &Bar) -> Option<BollingerBands> {
        self.window.push_back(bar.close);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }
        bands_of_window(self.window.make_contiguous(), self.multiplier)
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

// ── ATR ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AtrState {
    period: usize,
    prev_close: Option<Decimal>,
    count: usize,
    tr_sum: Decimal,
    atr: Option<Decimal>,
}

impl AtrState {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("atr", period)?;
        Ok(Self {
            period,
            prev_close: None,
            count: 0,
            tr_sum: Decimal::ZERO,
            atr: None,
        })
    }
}

impl StreamingIndicator for AtrState {
    type Output = Decimal;

    fn update(&mut self, bar: &Bar) -> Option<Decimal> {
        let prev = self.prev_close.replace(bar.close)?;
        let tr = bar.true_range(prev);
        let next = match self.atr {
            Some(atr) => wilder_step(atr, tr, self.period, PRICE_SCALE),
            None => {
                self.count += 1;
                self.tr_sum += tr;
                if self.count < self.period {
                    return None;
                }
                self.tr_sum
                    .div_half_up(from_count(self.period), PRICE_SCALE)?
            }
        };
        self.atr = Some(next);
        Some(next)
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.count = 0;
        self.tr_sum = Decimal::ZERO;
        self.atr = None;
    }
}

// ── Window tracking ──────────────────────────────────────────────────

/// Keeps a streaming state in step with a growing window of bars.
///
/// The engine hands strategies `bars[0..=i]` for increasing `i`. `sync()`
/// feeds only the bars not yet seen and reports the outputs for the last two
/// bars of the window. If the window shrinks or its already-seen part no
/// longer ends on the same timestamp, the state is rebuilt from scratch.
#[derive(Debug, Clone)]
pub struct WindowTracker<S: StreamingIndicator> {
    state: S,
    seen: usize,
    last_timestamp: Option<NaiveDateTime>,
    previous: Option<S::Output>,
    latest: Option<S::Output>,
}

impl<S: StreamingIndicator> WindowTracker<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            seen: 0,
            last_timestamp: None,
            previous: None,
            latest: None,
        }
    }

    /// Advance to the end of `window`; returns `(value at len-2, value at len-1)`.
    pub fn sync(&mut self, window: &[Bar]) -> (Option<S::Output>, Option<S::Output>) {
        let continues = window.len() >= self.seen
            && (self.seen == 0
                || Some(window[self.seen - 1].timestamp) == self.last_timestamp);
        if !continues {
            self.state.reset();
            self.seen = 0;
            self.previous = None;
            self.latest = None;
        }

        for bar in &window[self.seen..] {
            self.previous = self.latest;
            self.latest = self.state.update(bar);
        }
        self.seen = window.len();
        self.last_timestamp = window.last().map(|b| b.timestamp);
        (self.previous, self.latest)
    }
}
