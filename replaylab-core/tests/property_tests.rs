//! Property tests for replay invariants.
//!
//! Uses proptest to verify:
//! 1. Streaming indicators equal their batch counterparts at every index
//! 2. Cash conservation: final capital = initial capital + Σ trade P&L
//! 3. Trade log: one record per successful open, P&L by the side formula
//! 4. Curve bookkeeping: one equity point per replayed bar, drawdown in [0, 100]
//! 5. Metrics recomputed from a result equal the stored metrics
//! 6. Incremental strategies produce the same run as recomputing ones

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use replaylab_core::domain::{Bar, PositionSide, SignalType, TradingSignal};
use replaylab_core::engine::{BacktestEngine, EngineConfig};
use replaylab_core::indicators::{
    stream_all, Bollinger, BollingerState, Ema, EmaState, Indicator, Macd, MacdState, Rsi,
    RsiState, Sma, SmaState,
};
use replaylab_core::strategy::{self, StrategyConfig, StrategyContext, StrategyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Close prices in whole cents between 1.00 and 500.00.
fn arb_closes(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(100i64..50_000, len)
        .prop_map(|cents| cents.into_iter().map(|c| Decimal::new(c, 2)).collect())
}

/// 0 = nothing, 1 = buy, 2 = sell, 3 = close.
fn arb_script(len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, len)
}

fn arb_engine_config() -> impl Strategy<Value = EngineConfig> {
    (
        1_000i64..1_000_000,
        0u32..=50,
        1u32..=100,
        0i64..=10,
        any::<bool>(),
    )
        .prop_map(|(capital, commission_bp, ratio_pct, slippage_cents, allow_short)| {
            EngineConfig {
                initial_capital: Decimal::from(capital),
                commission_rate: Decimal::new(commission_bp.into(), 4),
                position_size_ratio: Decimal::new(ratio_pct.into(), 2),
                slippage: Decimal::new(slippage_cents, 2),
                allow_short,
                ..EngineConfig::default()
            }
        })
}

fn to_bars(closes: &[Decimal]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Bar::new("PROP", start + Duration::days(i as i64), c, c, c, c, dec!(100)).unwrap()
        })
        .collect()
}

/// Replays a fixed action per bar index and records whether a position was
/// open when each bar was shown.
struct Script {
    actions: Vec<u8>,
    holding: Vec<bool>,
}

impl Script {
    fn new(actions: Vec<u8>) -> Self {
        Self {
            actions,
            holding: Vec::new(),
        }
    }

    /// Flat-to-open transitions seen by the strategy.
    fn observed_opens(&self) -> usize {
        let mut held = false;
        let mut opens = 0;
        for &now in &self.holding {
            if now && !held {
                opens += 1;
            }
            held = now;
        }
        opens
    }
}

impl strategy::Strategy for Script {
    fn name(&self) -> &str {
        "script"
    }

    fn description(&self) -> &str {
        "random actions"
    }

    fn min_bars_required(&self) -> usize {
        1
    }

    fn generate_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
    ) -> Result<Option<TradingSignal>, StrategyError> {
        let bar = ctx.latest_bar().unwrap();
        self.holding.push(ctx.position.is_some());
        let kind = match self.actions.get(ctx.bars.len() - 1) {
            Some(1) => SignalType::Buy,
            Some(2) => SignalType::Sell,
            Some(3) => SignalType::Close,
            _ => return Ok(None),
        };
        Ok(Some(TradingSignal::at_close(kind, bar, "scripted")))
    }
}

// ── 1. Streaming == batch ────────────────────────────────────────────

proptest! {
    #[test]
    fn streaming_sma_ema_rsi_match_batch(
        closes in arb_closes(1..80),
        period in 1usize..15,
    ) {
        let bars = to_bars(&closes);
        prop_assert_eq!(
            stream_all(&mut SmaState::new(period).unwrap(), &bars),
            Sma::new(period).unwrap().compute(&bars)
        );
        prop_assert_eq!(
            stream_all(&mut EmaState::new(period).unwrap(), &bars),
            Ema::new(period).unwrap().compute(&bars)
        );
        prop_assert_eq!(
            stream_all(&mut RsiState::new(period).unwrap(), &bars),
            Rsi::new(period).unwrap().compute(&bars)
        );
    }

    #[test]
    fn streaming_macd_and_bollinger_match_batch(
        closes in arb_closes(1..80),
        fast in 2usize..8,
        extra in 1usize..10,
        signal in 2usize..6,
        k_tenths in 5i64..30,
    ) {
        let bars = to_bars(&closes);
        let slow = fast + extra;
        let batch_macd = Macd::new(fast, slow, signal).unwrap().compute_points(&bars);
        let stream_macd: Vec<_> = stream_all(&mut MacdState::new(fast, slow, signal).unwrap(), &bars)
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        prop_assert_eq!(stream_macd, batch_macd);

        let k = Decimal::new(k_tenths, 1);
        prop_assert_eq!(
            stream_all(&mut BollingerState::new(slow, k).unwrap(), &bars),
            Bollinger::new(slow, k).unwrap().compute_bands(&bars)
        );
    }
}

// ── 2-5. Ledger and curve invariants ─────────────────────────────────

proptest! {
    #[test]
    fn scripted_runs_conserve_cash(
        config in arb_engine_config(),
        (closes, script) in arb_closes(2..60)
            .prop_flat_map(|c| { let n = c.len(); (Just(c), arb_script(n)) }),
    ) {
        let bars = to_bars(&closes);
        let initial = config.initial_capital;
        let result = BacktestEngine::new(config)
            .run(&mut Script::new(script), "PROP", &bars)
            .unwrap();

        let realized: Decimal = result.trades.iter().map(|t| t.profit_loss).sum();
        prop_assert_eq!(result.metrics.final_capital, initial + realized);
        prop_assert_eq!(result.final_account.available_balance, initial + realized);
        prop_assert_eq!(result.final_account.frozen_balance, Decimal::ZERO);
        prop_assert!(result.final_account.positions.is_empty());
    }

    #[test]
    fn trade_log_matches_opens_and_side_formula(
        config in arb_engine_config(),
        (closes, script) in arb_closes(2..60)
            .prop_flat_map(|c| { let n = c.len(); (Just(c), arb_script(n)) }),
    ) {
        let bars = to_bars(&closes);
        let allow_short = config.allow_short;
        let mut strategy = Script::new(script);
        let result = BacktestEngine::new(config)
            .run(&mut strategy, "PROP", &bars)
            .unwrap();

        // an open on the last bar is force-closed before any strategy sees it
        let last = bars.last().unwrap().timestamp;
        let unseen = result
            .trades
            .iter()
            .filter(|t| t.entry_time == last)
            .count();
        prop_assert_eq!(result.trades.len(), strategy.observed_opens() + unseen);

        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_time <= pair[1].entry_time);
        }
        for trade in &result.trades {
            let per_unit = match trade.side {
                PositionSide::Long => trade.exit_price - trade.entry_price,
                PositionSide::Short => trade.entry_price - trade.exit_price,
                PositionSide::Flat => unreachable!("flat trade in log"),
            };
            prop_assert_eq!(
                trade.profit_loss,
                per_unit * trade.quantity - trade.commission
            );
            if !allow_short {
                prop_assert_eq!(trade.side, PositionSide::Long);
            }
        }
    }

    #[test]
    fn curve_and_metrics_bookkeeping(
        config in arb_engine_config(),
        (closes, script) in arb_closes(2..60)
            .prop_flat_map(|c| { let n = c.len(); (Just(c), arb_script(n)) }),
    ) {
        let bars = to_bars(&closes);
        let result = BacktestEngine::new(config)
            .run(&mut Script::new(script), "PROP", &bars)
            .unwrap();

        prop_assert_eq!(result.equity_curve.len(), result.bars_processed);
        prop_assert_eq!(result.bars_processed, bars.len() - 1);
        prop_assert!(result.metrics.max_drawdown >= Decimal::ZERO);
        prop_assert!(result.metrics.max_drawdown <= Decimal::ONE_HUNDRED);
        prop_assert!(
            result.metrics.winning_trades + result.metrics.losing_trades
                <= result.metrics.total_trades
        );
        for trade in &result.trades {
            prop_assert!(trade.quantity > Decimal::ZERO);
            prop_assert!(trade.exit_time >= trade.entry_time);
        }
        prop_assert_eq!(result.recompute_metrics(), result.metrics.clone());
    }
}

// ── 6. Incremental == recompute ──────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn incremental_strategies_replay_identically(
        closes in arb_closes(40..120),
        which in 0usize..4,
    ) {
        let bars = to_bars(&closes);
        let config = match which {
            0 => StrategyConfig::MaCrossover { fast: 3, slow: 8, incremental: false },
            1 => StrategyConfig::RsiReversal {
                period: 6,
                oversold: dec!(30),
                overbought: dec!(70),
                incremental: false,
            },
            2 => StrategyConfig::MacdCrossover { fast: 4, slow: 9, signal: 3, incremental: false },
            _ => StrategyConfig::BollingerReversion { period: 10, k: dec!(1.5), incremental: false },
        };
        let engine = BacktestEngine::new(EngineConfig::default());
        let a = engine.run(config.build().unwrap().as_mut(), "PROP", &bars).unwrap();
        let b = engine
            .run(config.with_incremental(true).build().unwrap().as_mut(), "PROP", &bars)
            .unwrap();
        prop_assert_eq!(a.trades, b.trades);
        prop_assert_eq!(a.equity_curve, b.equity_curve);
        prop_assert_eq!(a.warnings, b.warnings);
    }
}
