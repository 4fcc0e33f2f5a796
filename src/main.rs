//! Command-line harness for the barwise indicator catalog.

mod cli;
mod logging;

use anyhow::{Context, Result};
use barwise_config::{load_config, LogFormat};
use clap::Parser;
use cli::{Cli, Commands};
use logging::setup_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from environment".to_string(),
    })?;

    // Command-line flags win over the configuration file
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json_logs = cli.json_logs || config.logging.format == LogFormat::Json;
    setup_logging(&log_level, json_logs);

    match cli.command {
        Commands::List(args) => cli::commands::list::run(args),
        Commands::Run(args) => cli::commands::run::run(args, &config),
        Commands::ValidateConfig => cli::commands::validate::run(cli.config.as_deref(), &config),
    }
}
