//! Serializable run configuration, read from TOML.
//!
//! ```toml
//! [backtest]
//! symbol = "DEMO"
//! start = "2024-01-01T00:00:00"
//! end = "2024-12-31T00:00:00"
//! initial_capital = "100000"
//! position_size_ratio = "0.95"
//!
//! [strategy]
//! type = "ma_crossover"
//! fast = 10
//! slow = 20
//!
//! [data]
//! source = "synthetic"
//! seed = 42
//! ```

use chrono::NaiveDateTime;
use replaylab_core::engine::{EngineConfig, EngineError};
use replaylab_core::strategy::{StrategyConfig, StrategyError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid strategy parameters: {0}")]
    Strategy(#[from] StrategyError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<EngineError> for ConfigError {
    fn from(err: EngineError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// A complete, reproducible backtest: what to replay, how, and on which data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// The `[backtest]` table. Anything omitted takes the engine default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestSection {
    pub symbol: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    #[serde(default)]
    pub slippage: Decimal,
    #[serde(default = "default_position_size_ratio")]
    pub position_size_ratio: Decimal,
    #[serde(default)]
    pub allow_short: bool,
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_initial_capital() -> Decimal {
    EngineConfig::default().initial_capital
}

fn default_commission_rate() -> Decimal {
    EngineConfig::default().commission_rate
}

fn default_position_size_ratio() -> Decimal {
    EngineConfig::default().position_size_ratio
}

fn default_max_positions() -> usize {
    EngineConfig::default().max_positions
}

fn default_currency() -> String {
    EngineConfig::default().currency
}

/// The `[data]` table: where bars come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// Seeded random walk; needs both `start` and `end`.
    Synthetic {
        #[serde(default = "default_seed")]
        seed: u64,
        #[serde(default = "default_base_price")]
        base_price: Decimal,
    },
    /// `timestamp,open,high,low,close,volume` file. Relative paths resolve
    /// against the config file's directory when loaded with `from_file`.
    Csv { path: PathBuf },
}

fn default_seed() -> u64 {
    42
}

fn default_base_price() -> Decimal {
    Decimal::ONE_HUNDRED
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::Synthetic {
            seed: default_seed(),
            base_price: default_base_price(),
        }
    }
}

impl BacktestConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (DataConfig::Csv { path: csv }, Some(dir)) = (&mut config.data, path.parent()) {
            if csv.is_relative() {
                *csv = dir.join(&*csv);
            }
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check every section before anything runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("backtest.symbol must not be empty".into()));
        }
        self.engine_config().validate()?;
        self.strategy.build()?;

        let has_window = self.backtest.start.is_some() && self.backtest.end.is_some();
        if matches!(self.data, DataConfig::Synthetic { .. }) && !has_window {
            return Err(ConfigError::Invalid(
                "synthetic data requires backtest.start and backtest.end".into(),
            ));
        }
        if let DataConfig::Synthetic { base_price, .. } = self.data {
            if base_price <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "data.base_price must be > 0, got {base_price}"
                )));
            }
        }
        Ok(())
    }

    /// The engine's view of the `[backtest]` table.
    pub fn engine_config(&self) -> EngineConfig {
        let b = &self.backtest;
        EngineConfig {
            initial_capital: b.initial_capital,
            start: b.start,
            end: b.end,
            commission_rate: b.commission_rate,
            slippage: b.slippage,
            position_size_ratio: b.position_size_ratio,
            allow_short: b.allow_short,
            max_positions: b.max_positions,
            currency: b.currency.clone(),
        }
    }

    /// BLAKE3 over the canonical JSON form. Equal configs hash equal
    /// regardless of TOML formatting or omitted defaults.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FULL: &str = r#"
[backtest]
symbol = "DEMO"
start = "2024-01-01T00:00:00"
end = "2024-07-01T00:00:00"
initial_capital = "50000"
commission_rate = "0.002"
position_size_ratio = "0.95"
allow_short = true

[strategy]
type = "rsi_reversal"
period = 10
oversold = 25
incremental = true

[data]
source = "synthetic"
seed = 7
"#;

    #[test]
    fn parses_full_config() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        assert_eq!(config.backtest.symbol, "DEMO");
        assert_eq!(config.backtest.initial_capital, dec!(50000));
        assert_eq!(config.backtest.slippage, Decimal::ZERO);
        assert_eq!(config.backtest.max_positions, 1);
        assert_eq!(
            config.strategy,
            StrategyConfig::RsiReversal {
                period: 10,
                oversold: dec!(25),
                overbought: dec!(70),
                incremental: true,
            }
        );
        assert_eq!(
            config.data,
            DataConfig::Synthetic {
                seed: 7,
                base_price: dec!(100),
            }
        );

        let engine = config.engine_config();
        assert_eq!(engine.commission_rate, dec!(0.002));
        assert!(engine.allow_short);
        assert_eq!(engine.currency, "USD");
    }

    #[test]
    fn strategy_and_data_default_when_omitted() {
        let config = BacktestConfig::from_toml(
            "[backtest]\nsymbol = \"X\"\nstart = \"2024-01-01T00:00:00\"\nend = \"2024-02-01T00:00:00\"\n",
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyConfig::default());
        assert_eq!(config.data, DataConfig::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = BacktestConfig::from_toml("[backtest]\nsymbol = \"X\"\ncapital = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_bad_engine_values() {
        let toml = FULL.replace("\"0.95\"", "\"1.5\"");
        let err = BacktestConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("position_size_ratio"));
    }

    #[test]
    fn rejects_bad_strategy_parameters() {
        let toml = FULL.replace("oversold = 25", "oversold = 80");
        assert!(matches!(
            BacktestConfig::from_toml(&toml),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn synthetic_source_needs_a_window() {
        let err = BacktestConfig::from_toml("[backtest]\nsymbol = \"X\"\n").unwrap_err();
        assert!(err.to_string().contains("requires backtest.start"));
    }

    #[test]
    fn csv_source_needs_no_window() {
        let config = BacktestConfig::from_toml(
            "[backtest]\nsymbol = \"X\"\n[data]\nsource = \"csv\"\npath = \"bars.csv\"\n",
        )
        .unwrap();
        assert_eq!(
            config.data,
            DataConfig::Csv {
                path: PathBuf::from("bars.csv")
            }
        );
    }

    #[test]
    fn config_hash_is_stable_across_formatting() {
        let a = BacktestConfig::from_toml(FULL).unwrap();
        let b = BacktestConfig::from_toml(&FULL.replace("seed = 7", "seed   =   7")).unwrap();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_eq!(a.config_hash().unwrap().len(), 64);

        let c = BacktestConfig::from_toml(&FULL.replace("seed = 7", "seed = 8")).unwrap();
        assert_ne!(a.config_hash().unwrap(), c.config_hash().unwrap());
    }

    #[test]
    fn toml_round_trip() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        let back = BacktestConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
