//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, CacheSettings, EvaluationSettings, LogFormat, LoggingConfig,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Environment variable prefix, e.g. `BARWISE__CACHE__ENABLED=false`.
pub const ENV_PREFIX: &str = "BARWISE";

/// Load configuration from an optional TOML file, then the environment.
///
/// A missing `path` yields the defaults overlaid with any `BARWISE__*`
/// variables. A `path` that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use barwise_core::PriceSource;
    use config::FileFormat;

    fn from_toml(text: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.app.name, "barwise");
        assert_eq!(config.evaluation.precision, 4);
        assert_eq!(config.evaluation.default_source, PriceSource::Close);
    }

    #[test]
    fn test_partial_file() {
        let config = from_toml(
            r#"
            [cache]
            enabled = false

            [evaluation]
            default_source = "typical"
            "#,
        );

        assert!(!config.cache.enabled);
        assert_eq!(config.evaluation.default_source, PriceSource::Typical);
        assert_eq!(config.evaluation.precision, 4);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/barwise.toml"))).is_err());
    }

    #[test]
    fn test_bad_value_is_error() {
        let result: Result<AppConfig, _> = Config::builder()
            .add_source(File::from_str(
                "[evaluation]\ndefault_source = \"midpoint\"",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize();
        assert!(result.is_err());
    }
}
