//! Moving average indicators.

use barwise_core::{
    price_series, BarIndicator, Bars, Indicator, IndicatorError, PriceSource, Series, SeriesCache,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adaptive::{atr_ratio, check_fractal_period, fractal_alphas, ratio_alphas, AdaptiveRule};
use crate::filters::{
    cascade_stages, combine, ema_alpha, exp_smooth, exp_smooth_adaptive, smma_alpha, CascadeKind,
};
use crate::kernels::{moving_median, weighted_average, Kernel};
use crate::volatility::true_ranges;
use crate::window::rolling_mean;

/// Simple Moving Average (SMA).
///
/// Averages the available history until a full window exists, so
/// `SMA(3)` of `1, 2, 3, 4` is `1, 1.5, 2, 3`.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    fn compute(&self, data: &Series) -> Series {
        rolling_mean(data, self.period).into()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "SMA"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Exponential Moving Average (EMA).
///
/// Gives more weight to recent prices using an exponential decay, seeded
/// with the first input.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self {
            period,
            alpha: ema_alpha(period),
        })
    }

    /// Create an EMA with a custom smoothing factor.
    pub fn with_alpha(period: usize, alpha: f64) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        IndicatorError::check_range("alpha", alpha, 0.0, 1.0)?;
        Ok(Self { period, alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Indicator for Ema {
    fn compute(&self, data: &Series) -> Series {
        exp_smooth(data, self.alpha).into()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "EMA"
    }

    fn params(&self) -> String {
        format!("{},{}", self.period, self.alpha)
    }
}

/// Smoothed (Wilder) Moving Average, alpha = 1 / n.
#[derive(Debug, Clone)]
pub struct Smma {
    period: usize,
}

impl Smma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Smma {
    fn compute(&self, data: &Series) -> Series {
        exp_smooth(data, smma_alpha(self.period)).into()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "SMMA"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Kernel-weighted moving average (LWMA, SineWMA, TRIMA, ...).
#[derive(Debug, Clone)]
pub struct WeightedMa {
    kernel: Kernel,
    period: usize,
}

impl WeightedMa {
    /// Create a weighted average with an explicit kernel.
    pub fn new(kernel: Kernel, period: usize) -> Result<Self, IndicatorError> {
        kernel.validate(period)?;
        Ok(Self { kernel, period })
    }

    /// Linearly weighted, newest heaviest.
    pub fn lwma(period: usize) -> Result<Self, IndicatorError> {
        Self::new(Kernel::Linear, period)
    }

    /// Sine-weighted.
    pub fn sine(period: usize) -> Result<Self, IndicatorError> {
        Self::new(Kernel::Sine, period)
    }

    /// Triangular.
    pub fn triangular(period: usize) -> Result<Self, IndicatorError> {
        Self::new(Kernel::Triangular, period)
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }
}

impl Indicator for WeightedMa {
    fn compute(&self, data: &Series) -> Series {
        weighted_average(data, self.kernel, self.period).into()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        match self.kernel {
            Kernel::Uniform => "UWMA",
            Kernel::Linear => "LWMA",
            Kernel::Triangular => "TRIMA",
            Kernel::Sine => "SINEWMA",
            Kernel::Binomial => "BINOMIALMA",
        }
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Moving median over the trailing window.
#[derive(Debug, Clone)]
pub struct MovingMedian {
    period: usize,
}

impl MovingMedian {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for MovingMedian {
    fn compute(&self, data: &Series) -> Series {
        moving_median(data, self.period).into()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "MEDIAN"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Cascaded EMA stack (DEMA, TEMA, NEMA).
///
/// Each stage is an [`Ema`] of the previous one, so through a cache the
/// stages are shared with any other indicator using the same EMA.
#[derive(Debug, Clone)]
pub struct CascadeMa {
    kind: CascadeKind,
    ema: Ema,
}

impl CascadeMa {
    pub fn new(kind: CascadeKind, period: usize) -> Result<Self, IndicatorError> {
        kind.validate()?;
        Ok(Self {
            kind,
            ema: Ema::new(period)?,
        })
    }

    /// Double EMA: 2*e1 - e2.
    pub fn dema(period: usize) -> Result<Self, IndicatorError> {
        Self::new(CascadeKind::Dema, period)
    }

    /// Triple EMA: 3*e1 - 3*e2 + e3.
    pub fn tema(period: usize) -> Result<Self, IndicatorError> {
        Self::new(CascadeKind::Tema, period)
    }

    /// N-fold EMA with binomial weights.
    pub fn nema(period: usize, depth: u32) -> Result<Self, IndicatorError> {
        Self::new(CascadeKind::Nema(depth), period)
    }
}

impl Indicator for CascadeMa {
    fn compute(&self, data: &Series) -> Series {
        let stages = cascade_stages(data, self.ema.alpha(), self.kind.depth());
        combine(&stages, &self.kind.weights()).into()
    }

    fn compute_with(&self, data: &Series, cache: &mut dyn SeriesCache) -> Series {
        let mut stages: Vec<Series> = Vec::with_capacity(self.kind.depth());
        for _ in 0..self.kind.depth() {
            let input = stages.last().unwrap_or(data);
            let stage = self.ema.compute_cached(input, cache);
            stages.push(stage);
        }
        combine(&stages, &self.kind.weights()).into()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        match self.kind {
            CascadeKind::Dema => "DEMA",
            CascadeKind::Tema => "TEMA",
            CascadeKind::Nema(_) => "NEMA",
        }
    }

    fn params(&self) -> String {
        format!("{},{}", self.ema.period, self.kind.depth())
    }
}

/// Basic averaging method selected by name or by legacy mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "MaMethodRepr")]
pub enum MaMethod {
    #[default]
    Sma,
    Ema,
    Smma,
    Lwma,
}

impl MaMethod {
    pub const ALL: [MaMethod; 4] = [MaMethod::Sma, MaMethod::Ema, MaMethod::Smma, MaMethod::Lwma];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaMethod::Sma => "sma",
            MaMethod::Ema => "ema",
            MaMethod::Smma => "smma",
            MaMethod::Lwma => "lwma",
        }
    }

    /// Apply the method with an already validated `period`.
    pub fn apply(&self, data: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaMethod::Sma => rolling_mean(data, period),
            MaMethod::Ema => exp_smooth(data, ema_alpha(period)),
            MaMethod::Smma => exp_smooth(data, smma_alpha(period)),
            MaMethod::Lwma => weighted_average(data, Kernel::Linear, period),
        }
    }
}

impl TryFrom<u8> for MaMethod {
    type Error = IndicatorError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        MaMethod::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| IndicatorError::InvalidParameter(format!("unknown MA mode {}", code)))
    }
}

impl FromStr for MaMethod {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| IndicatorError::InvalidParameter(format!("unknown MA method '{}'", s)))
    }
}

impl fmt::Display for MaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaMethodRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<MaMethodRepr> for MaMethod {
    type Error = IndicatorError;

    fn try_from(repr: MaMethodRepr) -> Result<Self, Self::Error> {
        match repr {
            MaMethodRepr::Code(code) => MaMethod::try_from(code),
            MaMethodRepr::Name(name) => name.parse(),
        }
    }
}

/// Moving average with a selectable [`MaMethod`].
#[derive(Debug, Clone)]
pub struct MovingAverage {
    method: MaMethod,
    period: usize,
}

impl MovingAverage {
    pub fn new(method: MaMethod, period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { method, period })
    }
}

impl Indicator for MovingAverage {
    fn compute(&self, data: &Series) -> Series {
        self.method.apply(data, self.period).into()
    }

    fn lookback(&self) -> usize {
        match self.method {
            MaMethod::Sma | MaMethod::Lwma => self.period - 1,
            MaMethod::Ema | MaMethod::Smma => 0,
        }
    }

    fn name(&self) -> &str {
        "MA"
    }

    fn params(&self) -> String {
        format!("{},{}", self.method, self.period)
    }
}

/// Kaufman Adaptive Moving Average (KAMA).
#[derive(Debug, Clone)]
pub struct Kama {
    period: usize,
    fast: usize,
    slow: usize,
}

impl Kama {
    pub fn new(period: usize, fast: usize, slow: usize) -> Result<Self, IndicatorError> {
        let kama = Self { period, fast, slow };
        kama.rule().validate()?;
        Ok(kama)
    }

    fn rule(&self) -> AdaptiveRule {
        AdaptiveRule::Efficiency {
            period: self.period,
            fast: self.fast,
            slow: self.slow,
        }
    }
}

impl Indicator for Kama {
    fn compute(&self, data: &Series) -> Series {
        exp_smooth_adaptive(data, &self.rule().alphas(data)).into()
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "KAMA"
    }

    fn params(&self) -> String {
        format!("{},{},{}", self.period, self.fast, self.slow)
    }
}

/// Variable Index Dynamic Average: EMA factor scaled by |CMO|.
#[derive(Debug, Clone)]
pub struct Vidya {
    period: usize,
    cmo_length: usize,
}

impl Vidya {
    pub fn new(period: usize, cmo_length: usize) -> Result<Self, IndicatorError> {
        AdaptiveRule::Momentum { period, cmo_length }.validate()?;
        Ok(Self { period, cmo_length })
    }
}

impl Indicator for Vidya {
    fn compute(&self, data: &Series) -> Series {
        let rule = AdaptiveRule::Momentum {
            period: self.period,
            cmo_length: self.cmo_length,
        };
        exp_smooth_adaptive(data, &rule.alphas(data)).into()
    }

    fn lookback(&self) -> usize {
        self.cmo_length
    }

    fn name(&self) -> &str {
        "VIDYA"
    }

    fn params(&self) -> String {
        format!("{},{}", self.period, self.cmo_length)
    }
}

/// Volatility measure driving [`VolatilityAdaptiveMa`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityMeasure {
    /// Standard deviation of the price source.
    #[default]
    StdDev,
    /// Average true range of the bars.
    Atr,
}

/// EMA whose factor is scaled by a short/long volatility ratio.
#[derive(Debug, Clone)]
pub struct VolatilityAdaptiveMa {
    period: usize,
    short: usize,
    long: usize,
    measure: VolatilityMeasure,
    source: PriceSource,
}

impl VolatilityAdaptiveMa {
    pub fn new(
        period: usize,
        short: usize,
        long: usize,
        measure: VolatilityMeasure,
        source: PriceSource,
    ) -> Result<Self, IndicatorError> {
        AdaptiveRule::Volatility {
            period,
            short,
            long,
        }
        .validate()?;
        Ok(Self {
            period,
            short,
            long,
            measure,
            source,
        })
    }
}

impl BarIndicator for VolatilityAdaptiveMa {
    fn compute(&self, bars: &Bars) -> Series {
        self.compute_with(bars, &mut barwise_core::NoCache)
    }

    fn compute_with(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        let price = price_series(bars, self.source, cache);
        let alphas = match self.measure {
            VolatilityMeasure::StdDev => AdaptiveRule::Volatility {
                period: self.period,
                short: self.short,
                long: self.long,
            }
            .alphas(&price),
            VolatilityMeasure::Atr => ratio_alphas(
                &atr_ratio(&true_ranges(bars, cache), self.short, self.long),
                self.period,
                self.long,
            ),
        };
        exp_smooth_adaptive(&price, &alphas).into()
    }

    fn lookback(&self) -> usize {
        self.long
    }

    fn name(&self) -> &str {
        "VAMA"
    }

    fn params(&self) -> String {
        format!(
            "{},{},{},{:?},{}",
            self.period, self.short, self.long, self.measure, self.source
        )
    }
}

/// Fractal Adaptive Moving Average (FRAMA).
///
/// The factor comes from the fractal dimension of the high/low channel; the
/// smoothed value is the chosen price source (median price by default).
#[derive(Debug, Clone)]
pub struct Frama {
    period: usize,
    source: PriceSource,
}

impl Frama {
    /// `period` must be even.
    pub fn new(period: usize, source: PriceSource) -> Result<Self, IndicatorError> {
        check_fractal_period(period)?;
        Ok(Self { period, source })
    }
}

impl BarIndicator for Frama {
    fn compute(&self, bars: &Bars) -> Series {
        self.compute_with(bars, &mut barwise_core::NoCache)
    }

    fn compute_with(&self, bars: &Bars, cache: &mut dyn SeriesCache) -> Series {
        let price = price_series(bars, self.source, cache);
        let highs = price_series(bars, PriceSource::High, cache);
        let lows = price_series(bars, PriceSource::Low, cache);
        let alphas = fractal_alphas(&highs, &lows, self.period);
        exp_smooth_adaptive(&price, &alphas).into()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "FRAMA"
    }

    fn params(&self) -> String {
        format!("{},{}", self.period, self.source)
    }
}
