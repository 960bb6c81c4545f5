//! ReplayLab Core: fixed-point ledger, indicators, strategies, bar-replay engine.
//!
//! This crate contains the simulation core:
//! - Decimal helpers with explicit scale and half-up rounding
//! - Domain types (bars, signals, account, positions, trades)
//! - Batch and streaming technical indicators
//! - The ledger that turns signals into fills
//! - The strategy contract and four classic strategies
//! - Bar sources (in-memory, synthetic)
//! - The replay engine, performance metrics and the result bundle

pub mod data;
pub mod decimal;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod ledger;
pub mod metrics;
pub mod result;
pub mod strategy;

pub use data::{BarQuery, BarSource, DataError, InMemorySource, SyntheticSource};
pub use domain::{Account, Bar, Position, PositionSide, SignalType, TradeRecord, TradingSignal};
pub use engine::{BacktestEngine, EngineConfig, EngineError, EquityCurve, StrategyWarning};
pub use ledger::{Ledger, LedgerConfig};
pub use metrics::PerformanceMetrics;
pub use result::BacktestResult;
pub use strategy::{Strategy, StrategyConfig, StrategyContext, StrategyError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: domain, engine and result types are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Account>();
        require_sync::<domain::Account>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::OpenTrade>();
        require_sync::<domain::OpenTrade>();
        require_send::<domain::TradingSignal>();
        require_sync::<domain::TradingSignal>();

        // Ledger and engine types
        require_send::<ledger::Ledger>();
        require_sync::<ledger::Ledger>();
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::BacktestEngine>();
        require_sync::<engine::BacktestEngine>();
        require_send::<engine::EquityCurve>();
        require_sync::<engine::EquityCurve>();
        require_send::<result::BacktestResult>();
        require_sync::<result::BacktestResult>();
        require_send::<metrics::PerformanceMetrics>();
        require_sync::<metrics::PerformanceMetrics>();

        // Strategies and sources
        require_send::<Box<dyn strategy::Strategy>>();
        require_sync::<Box<dyn strategy::Strategy>>();
        require_send::<strategy::MaCrossover>();
        require_sync::<strategy::MaCrossover>();
        require_send::<strategy::RsiReversal>();
        require_sync::<strategy::RsiReversal>();
        require_send::<strategy::MacdCrossover>();
        require_sync::<strategy::MacdCrossover>();
        require_send::<strategy::BollingerReversion>();
        require_sync::<strategy::BollingerReversion>();
        require_send::<data::InMemorySource>();
        require_sync::<data::InMemorySource>();
        require_send::<data::SyntheticSource>();
        require_sync::<data::SyntheticSource>();
    }

    /// Architecture contract: strategies get a read-only view of the ledger.
    #[test]
    fn strategy_context_is_read_only() {
        fn _check<'a>(ctx: &'a StrategyContext<'a>) -> Option<&'a Account> {
            Some(ctx.account)
        }
    }
}
