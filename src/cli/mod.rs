//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "predict")]
#[command(author, version, about = "Bitcoin price prediction pipeline")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: download, features, training, backtest
    Run(RunArgs),
    /// List available model families
    Models,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Symbol to fetch
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Sampling interval (1h, 1d)
    #[arg(short, long)]
    pub interval: Option<String>,

    /// Lookback window in calendar days
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Initial capital for the backtest
    #[arg(long)]
    pub capital: Option<f64>,

    /// Data file (CSV); a synthetic series is generated when omitted
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Seed for the synthetic series
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of synthetic bars to generate
    #[arg(long)]
    pub bars: Option<usize>,

    /// Train models one at a time instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,

    /// Save results to file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write an equity curve CSV for this model after the run
    #[arg(long)]
    pub equity_csv: Option<String>,
}
