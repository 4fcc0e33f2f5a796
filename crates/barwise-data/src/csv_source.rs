//! CSV bars source.

use barwise_core::{Bar, Bars, DataError};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// What to do with rows that are not in increasing time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOrder {
    /// Fail with [`DataError::NonMonotonic`].
    #[default]
    Strict,
    /// Sort by timestamp (stable) before building the bars.
    Sort,
}

/// CSV file of OHLCV rows with a date or Unix timestamp column.
#[derive(Debug, Clone)]
pub struct CsvBarsSource {
    path: PathBuf,
    order: TimeOrder,
}

impl CsvBarsSource {
    /// Create a source for an existing file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            order: TimeOrder::Strict,
        })
    }

    /// Choose how out-of-order rows are handled.
    pub fn with_order(mut self, order: TimeOrder) -> Self {
        self.order = order;
        self
    }

    /// Load all bars from the file.
    pub fn load(&self) -> Result<Bars, DataError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::Parse(e.to_string()))?;

        let bars = read_bars(reader, self.order)?;
        debug!(
            path = %self.path.display(),
            bars = bars.len(),
            "Loaded bars from CSV"
        );
        Ok(bars)
    }

    /// Load bars from any reader with the same format.
    pub fn load_from_reader<R: Read>(reader: R, order: TimeOrder) -> Result<Bars, DataError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        read_bars(reader, order)
    }
}

fn read_bars<R: Read>(mut reader: csv::Reader<R>, order: TimeOrder) -> Result<Bars, DataError> {
    let mut bars = Vec::new();

    for (row, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.map_err(|e| DataError::Parse(format!("row {}: {}", row + 1, e)))?;
        let timestamp = parse_timestamp(&record.date)?;

        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    if bars.is_empty() {
        return Err(DataError::Empty);
    }

    match order {
        TimeOrder::Sort => bars.sort_by_key(|b| b.timestamp),
        TimeOrder::Strict => {
            if let Some(index) = bars
                .windows(2)
                .position(|w| w[1].timestamp <= w[0].timestamp)
            {
                return Err(DataError::NonMonotonic { index: index + 1 });
            }
        }
    }

    Ok(Bars::new(bars))
}

/// Parse a date, date-time or Unix timestamp into epoch milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    const DATETIME_FORMATS: [&str; 3] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"];
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    // Unix timestamp, milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::Parse(format!("Could not parse date: {}", date_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Volume
2024-01-02,100.0,101.5,99.5,101.0,1200
2024-01-03,101.0,102.0,100.5,101.8,1500
2024-01-04,101.8,103.0,101.0,102.5,900
";

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1970-01-02").unwrap(), 86_400_000);
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000); // Unix ms
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000); // Unix sec
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_load_from_reader() {
        let bars = CsvBarsSource::load_from_reader(SAMPLE.as_bytes(), TimeOrder::Strict).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars.closes().values(), &[101.0, 101.8, 102.5]);
        assert_eq!(bars.volumes().values(), &[1200.0, 1500.0, 900.0]);
    }

    #[test]
    fn test_lowercase_headers_and_missing_volume() {
        let csv = "timestamp,open,high,low,close\n1,1.0,2.0,0.5,1.5\n2,1.5,2.5,1.0,2.0\n";
        let bars = CsvBarsSource::load_from_reader(csv.as_bytes(), TimeOrder::Strict).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars.volumes().values(), &[0.0, 0.0]);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n2024-01-02,1,2,0.5,1.5,1.4,10\n";
        let bars = CsvBarsSource::load_from_reader(csv.as_bytes(), TimeOrder::Strict).unwrap();
        assert_eq!(bars.closes().values(), &[1.5]);
    }

    #[test]
    fn test_out_of_order_rows() {
        let csv = "\
Date,Open,High,Low,Close
2024-01-03,1,1,1,1
2024-01-02,2,2,2,2
";
        let strict = CsvBarsSource::load_from_reader(csv.as_bytes(), TimeOrder::Strict);
        assert!(matches!(strict, Err(DataError::NonMonotonic { index: 1 })));

        let sorted = CsvBarsSource::load_from_reader(csv.as_bytes(), TimeOrder::Sort).unwrap();
        assert_eq!(sorted.closes().values(), &[2.0, 1.0]);
    }

    #[test]
    fn test_empty_and_malformed() {
        let empty = "Date,Open,High,Low,Close\n";
        assert!(matches!(
            CsvBarsSource::load_from_reader(empty.as_bytes(), TimeOrder::Strict),
            Err(DataError::Empty)
        ));

        let bad = "Date,Open,High,Low,Close\n2024-01-02,abc,1,1,1\n";
        assert!(matches!(
            CsvBarsSource::load_from_reader(bad.as_bytes(), TimeOrder::Strict),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvBarsSource::new("/nonexistent/bars.csv"),
            Err(DataError::NotFound(_))
        ));
    }
}
