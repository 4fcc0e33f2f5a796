//! Indicator and handler trait definitions.

use crate::error::IndicatorError;
use crate::traits::cache::{CacheKey, SeriesCache};
use crate::types::{Bars, PriceSource, Series};

/// A pure transform from one series to another of the same length.
///
/// Implementations validate their parameters when constructed, so
/// `compute` never fails: indices without enough history get the
/// indicator's documented warm-up value.
pub trait Indicator: Send + Sync {
    /// Compute the output series, one value per input value.
    fn compute(&self, data: &Series) -> Series;

    /// Number of leading values that are warm-up fill rather than the
    /// full formula.
    fn lookback(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Stringified parameters, used in cache keys.
    fn params(&self) -> String;

    /// Compute using `cache` for intermediate series.
    ///
    /// Composite indicators override this to share their stages.
    fn compute_with(&self, data: &Series, _cache: &mut dyn SeriesCache) -> Series {
        self.compute(data)
    }

    /// Cache key for running this indicator on `data`.
    fn cache_key(&self, data: &Series) -> CacheKey {
        CacheKey::new(self.name(), self.params(), data.source_id())
    }

    /// Memoized compute: at most one computation per key and cache.
    fn compute_cached(&self, data: &Series, cache: &mut dyn SeriesCache) -> Series {
        let key = self.cache_key(data);
        if let Some(hit) = cache.lookup(&key) {
            return hit;
        }
        let series = self.compute_with(data, cache);
        cache.store(key, series.clone());
        series
    }
}

/// Indicator that reads whole bars (high/low/close...) rather than one series.
pub trait BarIndicator: Send + Sync {
    /// Compute the output series, one value per bar.
    fn compute(&self, bars: &Bars) -> Series;

    /// Number of leading warm-up values.
    fn lookback(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Stringified parameters, used in cache keys.
    fn params(&self) -> String;

    /// Compute using `cache` for intermediate series.
    fn compute_with(&self, bars: &Bars, _cache: &mut dyn SeriesCache) -> Series {
        self.compute(bars)
    }

    /// Memoized compute.
    fn compute_cached(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        let key = CacheKey::new(self.name(), self.params(), bars.source_id());
        if let Some(hit) = cache.lookup(&key) {
            return hit;
        }
        let series = self.compute_with(bars, cache);
        cache.store(key, series.clone());
        series
    }
}

/// A set of named, equally long output series.
pub trait NamedOutputs {
    /// Output names, in a fixed order.
    fn names() -> &'static [&'static str];

    /// Split into `(name, series)` pairs in `names()` order.
    fn into_named(self) -> Vec<(&'static str, Series)>;
}

/// Multi-output indicator (e.g., Bollinger Bands, MACD).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple series.
    type Outputs: NamedOutputs;

    /// Compute all outputs.
    fn compute(&self, data: &Series) -> Self::Outputs;

    /// Number of leading warm-up values.
    fn lookback(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Stringified parameters, used in cache keys.
    fn params(&self) -> String;

    /// Compute using `cache` for intermediate series.
    fn compute_with(&self, data: &Series, _cache: &mut dyn SeriesCache) -> Self::Outputs {
        self.compute(data)
    }

    /// Memoized access to one output. All outputs are computed and stored
    /// together on the first request.
    ///
    /// Returns `None` for an unknown output name.
    fn output_cached(
        &self,
        data: &Series,
        output: &str,
        cache: &mut dyn SeriesCache,
    ) -> Option<Series> {
        if !<Self::Outputs as NamedOutputs>::names().contains(&output) {
            return None;
        }
        let base = CacheKey::new(self.name(), self.params(), data.source_id());
        let key = base.with_output(output);
        if let Some(hit) = cache.lookup(&key) {
            return Some(hit);
        }

        let mut selected = None;
        for (name, series) in self.compute_with(data, cache).into_named() {
            if name == output {
                selected = Some(series.clone());
            }
            cache.store(base.with_output(name), series);
        }
        selected
    }
}

/// Something the host can evaluate over bars.
pub trait Handler: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Evaluate over `bars`, returning one value per bar.
    fn execute(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series;
}

/// Cached extraction of one price field from bars.
pub fn price_series(bars: &Bars, source: PriceSource, cache: &mut dyn SeriesCache) -> Series {
    let key = CacheKey::new("PRICE", source.as_str(), bars.source_id());
    cache.get_or_compute(key, &mut || bars.price(source))
}

/// Runs a series indicator on one price field.
#[derive(Debug, Clone)]
pub struct SeriesHandler<I> {
    source: PriceSource,
    indicator: I,
}

impl<I: Indicator> SeriesHandler<I> {
    /// Bind an indicator to a price source.
    pub fn new(indicator: I, source: PriceSource) -> Self {
        Self { source, indicator }
    }

    /// The wrapped indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}

impl<I: Indicator> Handler for SeriesHandler<I> {
    fn name(&self) -> &str {
        self.indicator.name()
    }

    fn execute(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        let input = price_series(bars, self.source, cache);
        self.indicator.compute_cached(&input, cache)
    }
}

/// Runs a bar indicator.
#[derive(Debug, Clone)]
pub struct BarHandler<I> {
    indicator: I,
}

impl<I: BarIndicator> BarHandler<I> {
    /// Wrap a bar indicator.
    pub fn new(indicator: I) -> Self {
        Self { indicator }
    }
}

impl<I: BarIndicator> Handler for BarHandler<I> {
    fn name(&self) -> &str {
        self.indicator.name()
    }

    fn execute(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        self.indicator.compute_cached(bars, cache)
    }
}

/// Runs a multi-output indicator and returns one selected output.
#[derive(Debug, Clone)]
pub struct OutputHandler<M> {
    source: PriceSource,
    indicator: M,
    output: String,
}

impl<M: MultiOutputIndicator> OutputHandler<M> {
    /// Bind an indicator and output name; the name is checked here.
    pub fn new(indicator: M, source: PriceSource, output: &str) -> Result<Self, IndicatorError> {
        if !<M::Outputs as NamedOutputs>::names().contains(&output) {
            return Err(IndicatorError::InvalidParameter(format!(
                "{} has no output '{}' (expected one of {:?})",
                indicator.name(),
                output,
                <M::Outputs as NamedOutputs>::names()
            )));
        }
        Ok(Self {
            source,
            indicator,
            output: output.to_string(),
        })
    }
}

impl<M: MultiOutputIndicator> Handler for OutputHandler<M> {
    fn name(&self) -> &str {
        self.indicator.name()
    }

    fn execute(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        let input = price_series(bars, self.source, cache);
        self.indicator
            .output_cached(&input, &self.output, cache)
            .unwrap_or_else(|| Series::constant(f64::NAN, bars.len()))
    }
}
