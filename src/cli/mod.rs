//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "barwise")]
#[command(author, version, about = "Evaluate technical-analysis indicators over bar data")]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "BARWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available indicators
    List(ListArgs),
    /// Evaluate one indicator over a CSV file of bars
    Run(RunArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Also print each indicator's default configuration
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Indicator name (see `barwise list`)
    #[arg(short, long)]
    pub indicator: String,

    /// Data file (CSV with date, open, high, low, close and optional volume)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Indicator configuration as a JSON object, e.g. '{"period": 20}'
    #[arg(short, long)]
    pub params: Option<String>,

    /// Sort rows by time instead of rejecting out-of-order files
    #[arg(long)]
    pub sort: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}
