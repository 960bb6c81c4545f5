//! ReplayLab CLI: run, validate and report commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and print the report
//! - `validate`: parse and validate a config, print its fingerprint
//! - `report`: re-render the report of a saved `result.json`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use replaylab_core::strategy::Strategy;
use replaylab_runner::{
    export_run, load_result, render_report, run_backtest, BacktestConfig, DataConfig,
};

/// Environment variable that overrides `--log-level`.
const LOG_ENV: &str = "REPLAYLAB_LOG";

#[derive(Parser)]
#[command(
    name = "replaylab",
    version,
    about = "Deterministic single-asset backtests"
)]
struct Cli {
    /// Log filter, e.g. `info` or `replaylab_core=debug`. REPLAYLAB_LOG wins if set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV file of bars; replaces the config's [data] section.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the report only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_export: bool,

        /// Print metrics as JSON instead of the text report.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Parse and validate a config file.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Re-render the report of a saved result.
    Report {
        /// Path to a result.json written by `run`.
        #[arg(long)]
        result: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            data,
            output_dir,
            no_export,
            json,
        } => run_cmd(&config, data, &output_dir, no_export, json),
        Commands::Validate { config } => validate_cmd(&config),
        Commands::Report { result } => report_cmd(&result),
    }
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn run_cmd(
    config_path: &Path,
    data: Option<PathBuf>,
    output_dir: &Path,
    no_export: bool,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(path) = data {
        if !path.exists() {
            bail!("data file does not exist: {}", path.display());
        }
        info!(data = %path.display(), "data source overridden");
        config.data = DataConfig::Csv { path };
        config
            .validate()
            .context("config is invalid with the --data override")?;
    }

    let output = run_backtest(&config)
        .with_context(|| format!("backtest failed for {}", config.backtest.symbol))?;

    if json {
        let metrics = serde_json::to_string_pretty(&output.result.metrics)
            .context("failed to serialize metrics")?;
        println!("{metrics}");
    } else {
        print!("{}", render_report(&output.result));
    }

    if !no_export {
        let paths = export_run(output_dir, &output)
            .with_context(|| format!("failed to export to {}", output_dir.display()))?;
        eprintln!("Artifacts saved to: {}", paths.dir.display());
    }
    eprintln!("Run id: {}", output.run_id);
    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let strategy = config
        .strategy
        .build()
        .context("failed to build strategy")?;
    let hash = config.config_hash().context("failed to hash config")?;

    println!("Config OK: {}", config_path.display());
    println!("  symbol:    {}", config.backtest.symbol);
    println!("  strategy:  {} (warm-up {} bars)", strategy.name(), strategy.min_bars_required());
    println!("  data:      {}", describe_data(&config.data));
    println!("  hash:      {hash}");
    Ok(())
}

fn describe_data(data: &DataConfig) -> String {
    match data {
        DataConfig::Synthetic { seed, base_price } => {
            format!("synthetic (seed {seed}, base price {base_price})")
        }
        DataConfig::Csv { path } => format!("csv {}", path.display()),
    }
}

fn report_cmd(result_path: &Path) -> Result<()> {
    let result = load_result(result_path)
        .with_context(|| format!("failed to load result {}", result_path.display()))?;
    print!("{}", render_report(&result));
    Ok(())
}
