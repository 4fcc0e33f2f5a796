//! Error types for barwise.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum BarwiseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Indicator configuration errors.
///
/// All of these are raised while an indicator is being constructed, before
/// any pass over a series begins. Per-bar computation never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Invalid period for {name}: {value} (must be at least 1)")]
    InvalidPeriod { name: &'static str, value: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Parameter out of range: {param} = {value} (valid: {min}..={max})")]
    ParamOutOfRange {
        param: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IndicatorError {
    /// Reject a period or window length below one.
    pub fn check_period(name: &'static str, value: usize) -> Result<usize, Self> {
        if value == 0 {
            return Err(IndicatorError::InvalidPeriod { name, value });
        }
        Ok(value)
    }

    /// Reject a coefficient outside `min..=max`, including NaN.
    pub fn check_range(param: &'static str, value: f64, min: f64, max: f64) -> Result<f64, Self> {
        if !(min..=max).contains(&value) {
            return Err(IndicatorError::ParamOutOfRange {
                param,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }
}

/// Bars source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data file not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No bars available")]
    Empty,

    #[error("Bars are not in increasing time order at index {index}")]
    NonMonotonic { index: usize },
}

/// Result type alias for barwise operations.
pub type BarwiseResult<T> = Result<T, BarwiseError>;
