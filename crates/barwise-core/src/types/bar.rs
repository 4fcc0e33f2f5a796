//! OHLCV (Open, High, Low, Close, Volume) bar data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::{Series, SourceId};

/// One OHLCV sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Median price (HL average).
    #[inline]
    pub fn median_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Typical price (HLC average).
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Weighted close (HLCC average).
    #[inline]
    pub fn weighted_close(&self) -> f64 {
        (self.high + self.low + 2.0 * self.close) / 4.0
    }

    /// High minus low.
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// True range against the previous close; plain range for the first bar.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }

    /// Select one price field.
    #[inline]
    pub fn price(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Open => self.open,
            PriceSource::High => self.high,
            PriceSource::Low => self.low,
            PriceSource::Close => self.close,
            PriceSource::Volume => self.volume,
            PriceSource::Median => self.median_price(),
            PriceSource::Typical => self.typical_price(),
            PriceSource::Weighted => self.weighted_close(),
        }
    }

    fn hash_into(&self, hasher: &mut DefaultHasher) {
        self.timestamp.hash(hasher);
        for value in [self.open, self.high, self.low, self.close, self.volume] {
            value.to_bits().hash(hasher);
        }
    }
}

/// Which bar field feeds a series indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
    /// (high + low) / 2
    Median,
    /// (high + low + close) / 3
    Typical,
    /// (high + low + 2 * close) / 4
    Weighted,
}

impl PriceSource {
    /// All sources, in declaration order.
    pub const ALL: [PriceSource; 8] = [
        PriceSource::Open,
        PriceSource::High,
        PriceSource::Low,
        PriceSource::Close,
        PriceSource::Volume,
        PriceSource::Median,
        PriceSource::Typical,
        PriceSource::Weighted,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Open => "open",
            PriceSource::High => "high",
            PriceSource::Low => "low",
            PriceSource::Close => "close",
            PriceSource::Volume => "volume",
            PriceSource::Median => "median",
            PriceSource::Typical => "typical",
            PriceSource::Weighted => "weighted",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        PriceSource::ALL
            .into_iter()
            .find(|source| source.as_str() == lower)
            .ok_or_else(|| format!("Unknown price source: {}", s))
    }
}

/// Read-only, fixed-length bars for one evaluation.
///
/// Every series derived from a `Bars` is index-aligned with it.
#[derive(Debug, Clone)]
pub struct Bars {
    bars: Vec<Bar>,
    id: SourceId,
}

impl Bars {
    /// Take ownership of bars in time order.
    pub fn new(bars: Vec<Bar>) -> Self {
        let mut hasher = DefaultHasher::new();
        bars.len().hash(&mut hasher);
        for bar in &bars {
            bar.hash_into(&mut hasher);
        }
        Self {
            id: SourceId::from_hash(hasher.finish()),
            bars,
        }
    }

    /// Content fingerprint of these bars.
    #[inline]
    pub fn source_id(&self) -> SourceId {
        self.id
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if there are no bars.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }

    /// Extract one price field as a series.
    pub fn price(&self, source: PriceSource) -> Series {
        self.bars.iter().map(|b| b.price(source)).collect()
    }

    /// Extract open prices.
    pub fn opens(&self) -> Series {
        self.price(PriceSource::Open)
    }

    /// Extract high prices.
    pub fn highs(&self) -> Series {
        self.price(PriceSource::High)
    }

    /// Extract low prices.
    pub fn lows(&self) -> Series {
        self.price(PriceSource::Low)
    }

    /// Extract close prices.
    pub fn closes(&self) -> Series {
        self.price(PriceSource::Close)
    }

    /// Extract volumes.
    pub fn volumes(&self) -> Series {
        self.price(PriceSource::Volume)
    }

    /// True range per bar; the first bar uses its plain range.
    pub fn true_ranges(&self) -> Series {
        self.bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let prev_close = if i > 0 {
                    Some(self.bars[i - 1].close)
                } else {
                    None
                };
                bar.true_range(prev_close)
            })
            .collect()
    }
}

impl FromIterator<Bar> for Bars {
    fn from_iter<T: IntoIterator<Item = Bar>>(iter: T) -> Self {
        Bars::new(iter.into_iter().collect())
    }
}

impl From<Vec<Bar>> for Bars {
    fn from(bars: Vec<Bar>) -> Self {
        Bars::new(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_prices() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1000000.0);

        assert!((bar.median_price() - 102.5).abs() < 1e-10);
        assert!((bar.typical_price() - 103.333333).abs() < 0.001);
        assert!((bar.weighted_close() - 103.75).abs() < 1e-10);
        assert!((bar.range() - 15.0).abs() < 1e-10);
        assert!((bar.price(PriceSource::Volume) - 1000000.0).abs() < 1e-10);
    }

    #[test]
    fn test_bar_true_range() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1000000.0);

        // Without previous close
        assert!((bar.true_range(None) - 15.0).abs() < 0.001);

        // With previous close that creates gap
        assert!((bar.true_range(Some(90.0)) - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_price_source_parse() {
        assert_eq!("Close".parse::<PriceSource>(), Ok(PriceSource::Close));
        assert_eq!("typical".parse::<PriceSource>(), Ok(PriceSource::Typical));
        assert!("vwap".parse::<PriceSource>().is_err());
        assert_eq!(PriceSource::default(), PriceSource::Close);
    }

    #[test]
    fn test_bars_extraction_is_aligned() {
        let bars: Bars = vec![
            Bar::new(1, 100.0, 101.0, 99.0, 100.5, 1000.0),
            Bar::new(2, 100.5, 102.0, 100.0, 101.5, 2000.0),
        ]
        .into();

        assert_eq!(bars.closes().values(), &[100.5, 101.5]);
        assert_eq!(bars.volumes().values(), &[1000.0, 2000.0]);
        assert_eq!(bars.price(PriceSource::Median).len(), bars.len());
    }

    #[test]
    fn test_bars_true_ranges() {
        let bars: Bars = vec![
            Bar::new(1, 10.0, 11.0, 9.0, 10.0, 0.0),
            Bar::new(2, 10.0, 14.0, 12.0, 13.0, 0.0),
        ]
        .into();

        let tr = bars.true_ranges();
        assert!((tr[0] - 2.0).abs() < 1e-10);
        assert!((tr[1] - 4.0).abs() < 1e-10); // 14 - prev close 10
    }

    #[test]
    fn test_bars_source_id() {
        let a: Bars = vec![Bar::new(1, 1.0, 2.0, 0.5, 1.5, 10.0)].into();
        let b: Bars = vec![Bar::new(1, 1.0, 2.0, 0.5, 1.5, 10.0)].into();
        let c: Bars = vec![Bar::new(2, 1.0, 2.0, 0.5, 1.5, 10.0)].into();

        assert_eq!(a.source_id(), b.source_id());
        assert_ne!(a.source_id(), c.source_id());
    }
}
