//! Artifact export: JSON, CSV and the text report for one run.
//!
//! A run directory holds:
//! - `result.json`: the full `BacktestResult`, round-trippable
//! - `manifest.json`: run id and the config/dataset fingerprints
//! - `trades.csv`: the trade log
//! - `equity.csv`: start-of-bar total assets
//! - `report.txt`: the rendered summary
//!
//! Persisted results carry `schema_version`; newer versions are rejected on load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use replaylab_core::domain::TradeRecord;
use replaylab_core::engine::EquityCurve;
use replaylab_core::result::SCHEMA_VERSION;
use replaylab_core::BacktestResult;

use crate::report::render_report;
use crate::runner::RunOutput;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error at {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> ExportError + '_ {
    move |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Fingerprints written next to the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub strategy: String,
    pub symbol: String,
}

/// Paths of everything `export_run` wrote.
#[derive(Debug, Clone)]
pub struct ExportedPaths {
    pub dir: PathBuf,
    pub result_json: PathBuf,
    pub manifest_json: PathBuf,
    pub trades_csv: PathBuf,
    pub equity_csv: PathBuf,
    pub report_txt: PathBuf,
}

/// Write every artifact of a run into `dir/<run_id>/`.
pub fn export_run(dir: &Path, output: &RunOutput) -> Result<ExportedPaths, ExportError> {
    let run_dir = dir.join(&output.run_id);
    fs::create_dir_all(&run_dir).map_err(io_err(&run_dir))?;

    let paths = ExportedPaths {
        result_json: run_dir.join("result.json"),
        manifest_json: run_dir.join("manifest.json"),
        trades_csv: run_dir.join("trades.csv"),
        equity_csv: run_dir.join("equity.csv"),
        report_txt: run_dir.join("report.txt"),
        dir: run_dir,
    };

    let result = &output.result;
    write_file(&paths.result_json, &serde_json::to_string_pretty(result)?)?;
    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: output.run_id.clone(),
        config_hash: output.config_hash.clone(),
        dataset_hash: output.dataset_hash.clone(),
        strategy: result.strategy_name.clone(),
        symbol: result.symbol.clone(),
    };
    write_file(&paths.manifest_json, &serde_json::to_string_pretty(&manifest)?)?;
    write_trades_csv(&paths.trades_csv, &result.trades)?;
    write_equity_csv(&paths.equity_csv, &result.equity_curve)?;
    write_file(&paths.report_txt, &render_report(result))?;

    info!(dir = %paths.dir.display(), "artifacts written");
    Ok(paths)
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(io_err(path))
}

/// Trade log, one row per round trip.
pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<(), ExportError> {
    let to_err = csv_err(path);
    let mut wtr = csv::Writer::from_path(path).map_err(&to_err)?;
    wtr.write_record([
        "id",
        "symbol",
        "side",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "quantity",
        "commission",
        "profit_loss",
        "profit_loss_percent",
        "holding_secs",
        "entry_reason",
        "exit_reason",
    ])
    .map_err(&to_err)?;

    for t in trades {
        wtr.write_record([
            t.id.to_string(),
            t.symbol.clone(),
            t.side.to_string(),
            t.entry_time.to_string(),
            t.entry_price.to_string(),
            t.exit_time.to_string(),
            t.exit_price.to_string(),
            t.quantity.to_string(),
            t.commission.to_string(),
            t.profit_loss.to_string(),
            t.profit_loss_percent.to_string(),
            t.holding_duration_secs.to_string(),
            t.entry_reason.clone(),
            t.exit_reason.clone(),
        ])
        .map_err(&to_err)?;
    }
    wtr.flush().map_err(io_err(path))
}

/// Equity curve as `timestamp,total_assets`.
pub fn write_equity_csv(path: &Path, curve: &EquityCurve) -> Result<(), ExportError> {
    let to_err = csv_err(path);
    let mut wtr = csv::Writer::from_path(path).map_err(&to_err)?;
    wtr.write_record(["timestamp", "total_assets"]).map_err(&to_err)?;
    for point in curve.points() {
        wtr.write_record([point.timestamp.to_string(), point.total_assets.to_string()])
            .map_err(&to_err)?;
    }
    wtr.flush().map_err(io_err(path))
}

/// Load a saved `result.json`, rejecting schema versions from the future.
pub fn load_result(path: &Path) -> Result<BacktestResult, ExportError> {
    let json = fs::read_to_string(path).map_err(io_err(path))?;
    let result = BacktestResult::from_json(&json)?;
    if result.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: result.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(result)
}
