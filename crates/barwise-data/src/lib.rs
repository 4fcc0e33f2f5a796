//! Bars sources.
//!
//! The core treats bars as an opaque, read-only, time-ordered input. This
//! crate turns OHLCV CSV files into [`Bars`].

mod csv_source;

pub use csv_source::{CsvBarsSource, TimeOrder};

use barwise_core::{Bars, DataError};
use std::path::Path;

/// Load bars from a CSV file, handling out-of-order rows per `order`.
pub fn load_csv(path: impl AsRef<Path>, order: TimeOrder) -> Result<Bars, DataError> {
    CsvBarsSource::new(path)?.with_order(order).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_missing_file() {
        assert!(matches!(
            load_csv("/nonexistent/bars.csv", TimeOrder::Sort),
            Err(DataError::NotFound(_))
        ));
    }
}
