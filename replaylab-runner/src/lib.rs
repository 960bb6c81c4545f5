//! ReplayLab runner: run configuration, data loading, reports and artifacts.
//!
//! This crate builds on `replaylab-core` to provide:
//! - TOML run configuration with validation and BLAKE3 fingerprints
//! - CSV and synthetic bar loading
//! - Single-run orchestration with a reproducible run id
//! - The plain-text report
//! - JSON/CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod report;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError, DataConfig};
pub use data_loader::{dataset_hash, CsvSource, LoadError};
pub use export::{export_run, load_result, ExportError, ExportedPaths, RunManifest};
pub use report::render_report;
pub use runner::{run_backtest, run_backtest_with_source, RunError, RunOutput};
