//! Backtest runner: wires together config, data loading, the engine, and
//! run fingerprinting.
//!
//! Two entry points:
//! - `run_backtest()`: resolves the configured source, then runs. Used by the CLI.
//! - `run_backtest_with_source()`: takes any `BarSource`. Used by tests and
//!   callers that already hold bars.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use replaylab_core::data::{BarQuery, BarSource, DataError};
use replaylab_core::engine::{BacktestEngine, EngineError};
use replaylab_core::strategy::StrategyError;
use replaylab_core::BacktestResult;

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{dataset_hash, source_for};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// A finished run plus the fingerprints that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    /// BLAKE3 over `config_hash` and `dataset_hash`.
    pub run_id: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub result: BacktestResult,
}

/// Run the backtest a config describes, on the data it names.
pub fn run_backtest(config: &BacktestConfig) -> Result<RunOutput, RunError> {
    let source = source_for(&config.data);
    run_backtest_with_source(config, source.as_ref())
}

/// Run the configured backtest against an explicit bar source.
pub fn run_backtest_with_source(
    config: &BacktestConfig,
    source: &dyn BarSource,
) -> Result<RunOutput, RunError> {
    config.validate()?;
    let config_hash = config.config_hash()?;

    let engine_config = config.engine_config();
    let query = BarQuery {
        symbol: config.backtest.symbol.clone(),
        start: engine_config.start,
        end: engine_config.end,
    };
    let bars = source.historical_bars(&query)?;
    let dataset_hash = dataset_hash(&bars);
    info!(
        source = source.name(),
        symbol = %query.symbol,
        bars = bars.len(),
        %dataset_hash,
        "dataset loaded"
    );

    let mut strategy = config.strategy.build()?;
    let result = BacktestEngine::new(engine_config).run(
        strategy.as_mut(),
        &config.backtest.symbol,
        &bars,
    )?;

    let run_id = run_id(&config_hash, &dataset_hash);
    info!(%run_id, "run complete");
    Ok(RunOutput {
        run_id,
        config_hash,
        dataset_hash,
        result,
    })
}

/// Identity of a run: the same config on the same bars gives the same id.
pub fn run_id(config_hash: &str, dataset_hash: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(config_hash.as_bytes());
    hasher.update(b":");
    hasher.update(dataset_hash.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use replaylab_core::data::InMemorySource;
    use replaylab_core::domain::Bar;
    use rust_decimal::Decimal;

    const CONFIG: &str = r#"
[backtest]
symbol = "SYN"
start = "2024-01-01T00:00:00"
end = "2024-05-01T00:00:00"

[strategy]
type = "ma_crossover"
fast = 5
slow = 15
"#;

    #[test]
    fn run_id_depends_on_both_hashes() {
        assert_eq!(run_id("a", "b"), run_id("a", "b"));
        assert_ne!(run_id("a", "b"), run_id("a", "c"));
        assert_ne!(run_id("a", "b"), run_id("b", "b"));
    }

    #[test]
    fn synthetic_run_is_reproducible() {
        let config = BacktestConfig::from_toml(CONFIG).unwrap();
        let a = run_backtest(&config).unwrap();
        let b = run_backtest(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.result.total_bars, 121);
        assert_eq!(a.result.strategy_name, "ma_crossover");
    }

    #[test]
    fn seed_changes_dataset_and_run_id() {
        let a = BacktestConfig::from_toml(CONFIG).unwrap();
        let b = BacktestConfig::from_toml(&format!("{CONFIG}\n[data]\nsource = \"synthetic\"\nseed = 9\n"))
            .unwrap();
        let ra = run_backtest(&a).unwrap();
        let rb = run_backtest(&b).unwrap();
        assert_ne!(ra.dataset_hash, rb.dataset_hash);
        assert_ne!(ra.run_id, rb.run_id);
    }

    #[test]
    fn missing_symbol_is_a_data_error() {
        let config = BacktestConfig::from_toml(CONFIG).unwrap();
        let err = run_backtest_with_source(&config, &InMemorySource::new()).unwrap_err();
        assert!(matches!(err, RunError::Data(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn empty_window_is_an_engine_error() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bar = Bar::new(
            "SYN",
            start + Duration::days(1),
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ONE,
        )
        .unwrap();
        let mut source = InMemorySource::new();
        source.insert("SYN", vec![bar]).unwrap();

        let config = BacktestConfig::from_toml(CONFIG).unwrap();
        let err = run_backtest_with_source(&config, &source).unwrap_err();
        assert!(matches!(
            err,
            RunError::Engine(EngineError::DataUnavailable { .. })
        ));
    }
}
