//! Run indicator command.

use anyhow::{Context, Result};
use barwise_config::AppConfig;
use barwise_core::{Bars, NoCache};
use barwise_data::{load_csv, TimeOrder};
use barwise_indicators::{Catalog, MemoCache};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use crate::cli::{OutputFormat, RunArgs};

pub fn run(args: RunArgs, config: &AppConfig) -> Result<()> {
    let catalog = Catalog::new();
    let info = catalog
        .get(&args.indicator)
        .with_context(|| format!("Unknown indicator '{}'. Run `barwise list`.", args.indicator))?;

    let mut params: Value = match &args.params {
        Some(text) => serde_json::from_str(text).context("Failed to parse --params as JSON")?,
        None => Value::Object(Default::default()),
    };
    apply_default_source(&mut params, &info.default_config, config);

    let handler = catalog
        .create(&args.indicator, params.clone())
        .with_context(|| format!("Invalid configuration for '{}'", args.indicator))?;

    let order = if args.sort {
        TimeOrder::Sort
    } else {
        TimeOrder::Strict
    };
    let bars = load_csv(&args.data, order)
        .with_context(|| format!("Failed to load bars from {}", args.data.display()))?;

    let start = Instant::now();
    let values = if config.cache.enabled {
        let mut cache = MemoCache::new();
        let values = handler.execute(&bars, &mut cache);
        let stats = cache.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "Cache statistics"
        );
        values
    } else {
        handler.execute(&bars, &mut NoCache)
    };
    info!(
        indicator = handler.name(),
        bars = bars.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "Evaluation complete"
    );

    match args.output {
        OutputFormat::Json => {
            let output = json!({
                "indicator": args.indicator,
                "config": params,
                "bars": bars.len(),
                "timestamps": bars.iter().map(|b| b.timestamp).collect::<Vec<_>>(),
                "values": values,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_text(&bars, &values, config.evaluation.precision),
    }

    Ok(())
}

/// Fill in the configured price source for series indicators that were
/// given none.
fn apply_default_source(params: &mut Value, defaults: &Value, config: &AppConfig) {
    let takes_source = defaults.get("source").is_some();
    if let Value::Object(map) = params {
        if takes_source && !map.contains_key("source") {
            map.insert(
                "source".to_string(),
                Value::String(config.evaluation.default_source.as_str().to_string()),
            );
        }
    }
}

fn print_text(bars: &Bars, values: &[f64], precision: usize) {
    for (bar, value) in bars.iter().zip(values) {
        let time = bar
            .datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| bar.timestamp.to_string());
        println!("{}  {:>14.*}", time, precision, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barwise_core::PriceSource;

    #[test]
    fn test_default_source_only_where_accepted() {
        let mut config = AppConfig::default();
        config.evaluation.default_source = PriceSource::Typical;

        let series_defaults = json!({ "period": 14, "source": "close" });
        let mut series_params = json!({ "period": 5 });
        apply_default_source(&mut series_params, &series_defaults, &config);
        assert_eq!(series_params["source"], "typical");

        let mut explicit = json!({ "source": "open" });
        apply_default_source(&mut explicit, &series_defaults, &config);
        assert_eq!(explicit["source"], "open");

        let mut bar_params = json!({ "period": 5 });
        apply_default_source(&mut bar_params, &json!({ "period": 14 }), &config);
        assert!(bar_params.get("source").is_none());
    }
}
