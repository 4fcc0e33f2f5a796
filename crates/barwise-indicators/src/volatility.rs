//! Volatility indicators.

use barwise_core::{
    BarIndicator, Bars, CacheKey, Indicator, IndicatorError, MultiOutputIndicator, NamedOutputs,
    Series, SeriesCache,
};
use serde::{Deserialize, Serialize};

use crate::filters::{exp_smooth, smma_alpha};
use crate::moving_average::Sma;
use crate::window::{rolling_highest, rolling_lowest, rolling_stdev};

/// Cached true range of `bars`.
pub(crate) fn true_ranges(bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
    let key = CacheKey::new("TR", "", bars.source_id());
    cache.get_or_compute(key, &mut || bars.true_ranges())
}

/// True range: `max(high - low, |high - prev_close|, |low - prev_close|)`.
/// The first bar uses `high - low`.
#[derive(Debug, Clone, Default)]
pub struct TrueRange;

impl BarIndicator for TrueRange {
    fn compute(&self, bars: &Bars) -> Series {
        bars.true_ranges()
    }

    fn compute_cached(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        true_ranges(bars, cache)
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "TR"
    }

    fn params(&self) -> String {
        String::new()
    }
}

/// Average True Range (ATR).
///
/// Measures market volatility as the Wilder-smoothed true range, seeded
/// with the first bar's range.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Create a new ATR indicator.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl BarIndicator for Atr {
    fn compute(&self, bars: &Bars) -> Series {
        self.compute_with(bars, &mut barwise_core::NoCache)
    }

    fn compute_with(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        exp_smooth(&true_ranges(bars, cache), smma_alpha(self.period)).into()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "ATR"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Standard Deviation indicator (population, clamped window).
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
}

impl StdDev {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for StdDev {
    fn compute(&self, data: &Series) -> Series {
        rolling_stdev(data, self.period).into()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "STDDEV"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: Series,
    /// Middle band (SMA)
    pub middle: Series,
    /// Lower band
    pub lower: Series,
    /// %B ((price - lower) / (upper - lower)), 0.5 when the bands touch
    pub percent_b: Series,
    /// Bandwidth ((upper - lower) / middle), 0 when the middle is 0
    pub bandwidth: Series,
}

impl NamedOutputs for BollingerOutput {
    fn names() -> &'static [&'static str] {
        &["upper", "middle", "lower", "percent_b", "bandwidth"]
    }

    fn into_named(self) -> Vec<(&'static str, Series)> {
        vec![
            ("upper", self.upper),
            ("middle", self.middle),
            ("lower", self.lower),
            ("percent_b", self.percent_b),
            ("bandwidth", self.bandwidth),
        ]
    }
}

/// Bollinger Bands.
///
/// Consists of a middle band (SMA) with upper and lower bands
/// at a specified number of standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    sma: Sma,
    std_dev: StdDev,
    period: usize,
    multiplier: f64,
}

impl BollingerBands {
    /// Create Bollinger Bands with custom parameters.
    pub fn new(period: usize, multiplier: f64) -> Result<Self, IndicatorError> {
        IndicatorError::check_range("multiplier", multiplier, f64::MIN_POSITIVE, 100.0)?;
        Ok(Self {
            sma: Sma::new(period)?,
            std_dev: StdDev::new(period)?,
            period,
            multiplier,
        })
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn compute(&self, data: &Series) -> BollingerOutput {
        self.compute_with(data, &mut barwise_core::NoCache)
    }

    fn compute_with(&self, data: &Series, cache: &mut dyn SeriesCache) -> BollingerOutput {
        let middle = self.sma.compute_cached(data, cache);
        let std_dev = self.std_dev.compute_cached(data, cache);

        let upper = middle.zip_with(&std_dev, |m, s| m + self.multiplier * s);
        let lower = middle.zip_with(&std_dev, |m, s| m - self.multiplier * s);

        let percent_b = (0..data.len())
            .map(|i| {
                let width = upper[i] - lower[i];
                if width > 0.0 {
                    (data[i] - lower[i]) / width
                } else {
                    0.5
                }
            })
            .collect();
        let bandwidth = (0..data.len())
            .map(|i| {
                if middle[i] != 0.0 {
                    (upper[i] - lower[i]) / middle[i]
                } else {
                    0.0
                }
            })
            .collect();

        BollingerOutput {
            upper,
            middle,
            lower,
            percent_b,
            bandwidth,
        }
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "BB"
    }

    fn params(&self) -> String {
        format!("{},{}", self.period, self.multiplier)
    }
}

/// One line of a [`DonchianChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLine {
    Upper,
    Lower,
    #[default]
    Middle,
}

impl ChannelLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelLine::Upper => "upper",
            ChannelLine::Lower => "lower",
            ChannelLine::Middle => "middle",
        }
    }
}

/// Donchian channel lines.
#[derive(Debug, Clone)]
pub struct DonchianOutput {
    pub upper: Series,
    pub lower: Series,
    pub middle: Series,
}

impl NamedOutputs for DonchianOutput {
    fn names() -> &'static [&'static str] {
        &["upper", "lower", "middle"]
    }

    fn into_named(self) -> Vec<(&'static str, Series)> {
        vec![
            ("upper", self.upper),
            ("lower", self.lower),
            ("middle", self.middle),
        ]
    }
}

/// Donchian channel: highest high and lowest low over `period` bars.
#[derive(Debug, Clone)]
pub struct DonchianChannel {
    period: usize,
    line: ChannelLine,
}

impl DonchianChannel {
    /// Channel reporting `line` as its output.
    pub fn new(period: usize, line: ChannelLine) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period, line })
    }

    /// All three lines.
    pub fn channel(&self, bars: &Bars) -> DonchianOutput {
        let upper: Series = rolling_highest(&bars.highs(), self.period).into();
        let lower: Series = rolling_lowest(&bars.lows(), self.period).into();
        let middle = upper.zip_with(&lower, |u, l| (u + l) / 2.0);
        DonchianOutput {
            upper,
            lower,
            middle,
        }
    }
}

impl BarIndicator for DonchianChannel {
    fn compute(&self, bars: &Bars) -> Series {
        let channel = self.channel(bars);
        match self.line {
            ChannelLine::Upper => channel.upper,
            ChannelLine::Lower => channel.lower,
            ChannelLine::Middle => channel.middle,
        }
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "DONCHIAN"
    }

    fn params(&self) -> String {
        format!("{},{}", self.period, self.line.as_str())
    }
}
