//! Momentum indicators.

use barwise_core::{
    BarIndicator, Bars, Indicator, IndicatorError, MultiOutputIndicator, NamedOutputs, Series,
    SeriesCache,
};

use crate::adaptive::cmo;
use crate::filters::laguerre_pass;
use crate::moving_average::Ema;
use crate::window::{rolling_highest, rolling_lowest, Window};

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes
/// to evaluate overbought or oversold conditions.
///
/// The first `period` values are 50. Average gains and losses are seeded
/// with a simple mean and then Wilder-smoothed. Only gains gives 100; no
/// movement at all gives 50.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }

    fn value(gain: f64, loss: f64) -> f64 {
        if loss == 0.0 {
            if gain == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            100.0 - (100.0 / (1.0 + gain / loss))
        }
    }
}

impl Indicator for Rsi {
    fn compute(&self, data: &Series) -> Series {
        let n = data.len();
        let mut result = vec![50.0; n];
        if n <= self.period {
            return result.into();
        }

        let period_f64 = self.period as f64;
        let change = |i: usize| data[i] - data[i - 1];

        // Initial averages
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let c = change(i);
            if c > 0.0 {
                avg_gain += c;
            } else {
                avg_loss -= c;
            }
        }
        avg_gain /= period_f64;
        avg_loss /= period_f64;
        result[self.period] = Self::value(avg_gain, avg_loss);

        // Wilder's smoothing: avg = (prev_avg * (period-1) + value) / period
        for i in (self.period + 1)..n {
            let c = change(i);
            avg_gain = (avg_gain * (period_f64 - 1.0) + c.max(0.0)) / period_f64;
            avg_loss = (avg_loss * (period_f64 - 1.0) + (-c).max(0.0)) / period_f64;
            result[i] = Self::value(avg_gain, avg_loss);
        }

        result.into()
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Ehlers Laguerre RSI in `[0, 1]`; a flat cascade gives 0.
#[derive(Debug, Clone)]
pub struct LaguerreRsi {
    gamma: f64,
}

impl LaguerreRsi {
    pub fn new(gamma: f64) -> Result<Self, IndicatorError> {
        if !(0.0..1.0).contains(&gamma) {
            return Err(IndicatorError::ParamOutOfRange {
                param: "gamma",
                value: gamma,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self { gamma })
    }
}

impl Indicator for LaguerreRsi {
    fn compute(&self, data: &Series) -> Series {
        laguerre_pass(data, self.gamma)
            .iter()
            .map(|stages| {
                let (cu, cd) = stages.up_down();
                if cu + cd > 0.0 {
                    cu / (cu + cd)
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "LRSI"
    }

    fn params(&self) -> String {
        self.gamma.to_string()
    }
}

/// Chande Momentum Oscillator in `[-100, 100]`; no movement gives 0.
#[derive(Debug, Clone)]
pub struct Cmo {
    period: usize,
}

impl Cmo {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Cmo {
    fn compute(&self, data: &Series) -> Series {
        cmo(data, self.period).into_iter().map(|r| r * 100.0).collect()
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "CMO"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Stochastic %K: close within the high/low channel, scaled to `[0, 100]`.
/// A flat channel gives 50.
#[derive(Debug, Clone)]
pub struct StochasticK {
    period: usize,
}

impl StochasticK {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("period", period)?;
        Ok(Self { period })
    }
}

impl BarIndicator for StochasticK {
    fn compute(&self, bars: &Bars) -> Series {
        let highest = rolling_highest(&bars.highs(), self.period);
        let lowest = rolling_lowest(&bars.lows(), self.period);

        bars.iter()
            .zip(highest.iter().zip(&lowest))
            .map(|(bar, (&hh, &ll))| {
                if hh > ll {
                    (100.0 * (bar.close - ll) / (hh - ll)).clamp(0.0, 100.0)
                } else {
                    50.0
                }
            })
            .collect()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "STOCHK"
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Rank of each value within its own trailing range.
///
/// `[0, 1]` with a flat-window value of 0.5, or `[0, 100]` with 50 when
/// `percent` is set. Bars before `min_history` also get that value.
#[derive(Debug, Clone)]
pub struct RankNormalizer {
    window: Window,
    percent: bool,
}

impl RankNormalizer {
    pub fn new(period: usize, min_history: usize, percent: bool) -> Result<Self, IndicatorError> {
        Ok(Self {
            window: Window::new(period)?.with_min_history(min_history),
            percent,
        })
    }

    fn degenerate(&self) -> f64 {
        if self.percent {
            50.0
        } else {
            0.5
        }
    }
}

impl Indicator for RankNormalizer {
    fn compute(&self, data: &Series) -> Series {
        let degenerate = self.degenerate();
        (0..data.len())
            .map(|i| {
                let rank = if self.percent {
                    self.window.rank_pct(data, i, degenerate)
                } else {
                    self.window.rank01(data, i, degenerate)
                };
                rank.unwrap_or(degenerate)
            })
            .collect()
    }

    fn lookback(&self) -> usize {
        self.window.min_history() - 1
    }

    fn name(&self) -> &str {
        "RANK"
    }

    fn params(&self) -> String {
        format!(
            "{},{},{}",
            self.window.length(),
            self.window.min_history(),
            self.percent
        )
    }
}

/// MACD lines.
#[derive(Debug, Clone)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: Series,
    /// Signal line (EMA of MACD)
    pub signal: Series,
    /// Histogram (MACD - Signal)
    pub histogram: Series,
}

impl NamedOutputs for MacdOutput {
    fn names() -> &'static [&'static str] {
        &["macd", "signal", "histogram"]
    }

    fn into_named(self) -> Vec<(&'static str, Series)> {
        vec![
            ("macd", self.macd),
            ("signal", self.signal),
            ("histogram", self.histogram),
        ]
    }
}

/// MACD indicator.
///
/// Uses two EMAs to identify trend direction and momentum. The EMAs are
/// requested through the cache, so they are shared with plain EMA handlers.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    periods: (usize, usize, usize),
}

impl Macd {
    /// Create a MACD with custom periods; `fast` must be shorter than `slow`.
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, IndicatorError> {
        if fast >= slow {
            return Err(IndicatorError::InvalidParameter(format!(
                "fast period ({}) must be shorter than slow period ({})",
                fast, slow
            )));
        }
        Ok(Self {
            fast: Ema::new(fast)?,
            slow: Ema::new(slow)?,
            signal: Ema::new(signal)?,
            periods: (fast, slow, signal),
        })
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn compute(&self, data: &Series) -> MacdOutput {
        self.compute_with(data, &mut barwise_core::NoCache)
    }

    fn compute_with(&self, data: &Series, cache: &mut dyn SeriesCache) -> MacdOutput {
        let fast = self.fast.compute_cached(data, cache);
        let slow = self.slow.compute_cached(data, cache);
        let macd = fast.zip_with(&slow, |f, s| f - s);
        let signal = self.signal.compute_cached(&macd, cache);
        let histogram = macd.zip_with(&signal, |m, s| m - s);

        MacdOutput {
            macd,
            signal,
            histogram,
        }
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "MACD"
    }

    fn params(&self) -> String {
        let (fast, slow, signal) = self.periods;
        format!("{},{},{}", fast, slow, signal)
    }
}
