//! The replay loop.

use super::state::{EngineConfig, ReplayState};
use super::{EngineError, StrategyWarning, END_OF_BACKTEST};
use crate::data::{BarQuery, BarSource};
use crate::domain::{Bar, PositionSide, SignalType, TradingSignal};
use crate::ledger::{CloseOutcome, Ledger, OpenOutcome};
use crate::metrics::PerformanceMetrics;
use crate::result::{BacktestResult, SCHEMA_VERSION};
use crate::strategy::{Strategy, StrategyContext};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

/// Runs backtests under one configuration.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: EngineConfig,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch bars for `symbol` in the configured window, then replay them.
    pub fn run_from_source(
        &self,
        strategy: &mut dyn Strategy,
        source: &dyn BarSource,
        symbol: &str,
    ) -> Result<BacktestResult, EngineError> {
        self.config.validate()?;
        let query = BarQuery {
            symbol: symbol.to_string(),
            start: self.config.start,
            end: self.config.end,
        };
        let bars = source.historical_bars(&query)?;
        debug!(source = source.name(), symbol, bars = bars.len(), "bars loaded");
        self.run(strategy, symbol, &bars)
    }

    /// Replay `bars` (ascending by time) against `strategy`. Every bar must
    /// belong to `symbol`.
    pub fn run(
        &self,
        strategy: &mut dyn Strategy,
        symbol: &str,
        bars: &[Bar],
    ) -> Result<BacktestResult, EngineError> {
        self.config.validate()?;
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(EngineError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        };
        if let Some((index, bar)) = bars.iter().enumerate().find(|(_, b)| b.symbol != symbol) {
            return Err(EngineError::SymbolMismatch {
                expected: symbol.to_string(),
                found: bar.symbol.clone(),
                index,
            });
        }

        let warmup = strategy.min_bars_required();
        info!(
            symbol,
            strategy = strategy.name(),
            bars = bars.len(),
            warmup,
            "backtest started"
        );

        let mut state = ReplayState::new(&self.config, bars.len().saturating_sub(warmup));
        for i in warmup..bars.len() {
            self.step(&mut state, strategy, symbol, bars, i);
        }

        if let CloseOutcome::Closed(trade) = state.ledger.close(last, END_OF_BACKTEST) {
            debug!(trade = %trade.id, "open position force-closed");
        }

        let result = self.finish(state, strategy, symbol, bars, first.timestamp, last.timestamp);
        info!(
            symbol,
            trades = result.trades.len(),
            final_capital = %result.metrics.final_capital,
            total_return = %result.metrics.total_return,
            warnings = result.warnings.len(),
            "backtest finished"
        );
        Ok(result)
    }

    fn step(
        &self,
        state: &mut ReplayState,
        strategy: &mut dyn Strategy,
        symbol: &str,
        bars: &[Bar],
        i: usize,
    ) {
        let bar = &bars[i];
        state.ledger.mark_to_market(symbol, bar.close);
        state.equity.push(bar.timestamp, state.ledger.total_assets());
        state.bars_processed += 1;

        let ctx = StrategyContext {
            symbol,
            bars: &bars[..=i],
            account: state.ledger.account(),
            position: state.ledger.position(symbol),
        };
        let signal = match strategy.generate_signal(&ctx) {
            Ok(signal) => signal,
            Err(err) => {
                warn!(bar = i, timestamp = %bar.timestamp, error = %err, "strategy failed, no signal");
                state.warnings.push(StrategyWarning {
                    bar_index: i,
                    timestamp: bar.timestamp,
                    message: err.to_string(),
                });
                None
            }
        };

        if let Some(signal) = signal {
            debug!(
                bar = i,
                signal = %signal.signal_type,
                strength = %signal.strength,
                reason = %signal.reason,
                "signal"
            );
            self.execute(&mut state.ledger, &signal, bar);
        }
    }

    /// Map a signal onto the ledger given the current position.
    fn execute(&self, ledger: &mut Ledger, signal: &TradingSignal, bar: &Bar) {
        let held = ledger.position(&bar.symbol).map(|p| p.side);
        match (signal.signal_type, held) {
            (SignalType::Buy, None) => {
                log_open(ledger.open(signal, bar, PositionSide::Long));
            }
            (SignalType::Sell, None) if self.config.allow_short => {
                log_open(ledger.open(signal, bar, PositionSide::Short));
            }
            (SignalType::Sell, Some(PositionSide::Long))
            | (SignalType::Buy, Some(PositionSide::Short))
            | (SignalType::Close, Some(_)) => {
                ledger.close(bar, &signal.reason);
            }
            _ => {}
        }
    }

    fn finish(
        &self,
        state: ReplayState,
        strategy: &dyn Strategy,
        symbol: &str,
        bars: &[Bar],
        first_bar: NaiveDateTime,
        last_bar: NaiveDateTime,
    ) -> BacktestResult {
        let ReplayState {
            ledger,
            equity,
            warnings,
            bars_processed,
        } = state;
        let (account, trades) = ledger.into_parts();
        let metrics = PerformanceMetrics::compute(
            self.config.initial_capital,
            account.total_assets(),
            &trades,
            &equity.values(),
            self.config.elapsed_days(first_bar, last_bar),
        );

        BacktestResult {
            schema_version: SCHEMA_VERSION,
            config: self.config.clone(),
            strategy_name: strategy.name().to_string(),
            strategy_description: strategy.description().to_string(),
            symbol: symbol.to_string(),
            first_bar,
            last_bar,
            total_bars: bars.len(),
            bars_processed,
            warmup_bars: strategy.min_bars_required(),
            final_account: account,
            trades,
            equity_curve: equity,
            metrics,
            warnings,
        }
    }
}

fn log_open(outcome: OpenOutcome) {
    if let OpenOutcome::AlreadyOpen | OpenOutcome::InvalidSide = outcome {
        debug!(?outcome, "open ignored");
    }
}
