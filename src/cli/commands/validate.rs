//! Validate configuration command.

use anyhow::{Context, Result};
use barwise_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    match config_path {
        Some(path) => println!("Configuration file: {}", path.display()),
        None => println!("No configuration file; using defaults and environment"),
    }
    println!("Configuration is valid!");
    println!();

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);

    Ok(())
}
