//! Time-varying smoothing coefficients.
//!
//! Each rule maps a secondary signal (efficiency ratio, CMO, a volatility
//! ratio, or a fractal dimension) to one smoothing factor per bar, ready for
//! [`exp_smooth_adaptive`](crate::filters::exp_smooth_adaptive).
//!
//! Every factor passes through [`clamp_alpha`]: non-finite values become 0
//! (hold the previous output) and everything else is clamped to `[0, 1]`.
//! Bars inside a rule's lookback get a factor of 1, so the smoothed output
//! equals the raw input there.

use barwise_core::IndicatorError;
use serde::{Deserialize, Serialize};

use crate::filters::ema_alpha;
use crate::simd::sum_simd;
use crate::window::{rolling_mean, rolling_stdev};

/// Floor applied to the efficiency-ratio path length.
pub const ER_EPSILON: f64 = 1e-9;

/// Lower bound for the FRAMA smoothing factor.
pub const FRAMA_MIN_ALPHA: f64 = 0.01;

/// Clamp a smoothing factor into `[0, 1]`; NaN and infinities become 0.
#[inline]
pub fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Kaufman efficiency ratio over a clamped window of `period` changes.
///
/// `ER = |x[i] - x[i-n]| / sum(|x[j] - x[j-1]|)`, with the path length
/// floored at [`ER_EPSILON`]. `ER[0]` is 0.
pub fn efficiency_ratio(data: &[f64], period: usize) -> Vec<f64> {
    let steps = abs_steps(data);

    (0..data.len())
        .map(|i| {
            let start = i.saturating_sub(period);
            let path = sum_simd(&steps[start + 1..=i]);
            let change = (data[i] - data[start]).abs();
            (change / path.max(ER_EPSILON)).clamp(0.0, 1.0)
        })
        .collect()
}

/// `|x[i] - x[i-1]|` with a leading 0.
fn abs_steps(data: &[f64]) -> Vec<f64> {
    let mut steps = Vec::with_capacity(data.len());
    if !data.is_empty() {
        steps.push(0.0);
    }
    steps.extend(data.windows(2).map(|w| (w[1] - w[0]).abs()));
    steps
}

/// KAMA scaled smoothing constant `(ER * (fast - slow) + slow)^2`.
#[inline]
pub fn kama_alpha(er: f64, fast: usize, slow: usize) -> f64 {
    let fast_sc = ema_alpha(fast);
    let slow_sc = ema_alpha(slow);
    clamp_alpha((er * (fast_sc - slow_sc) + slow_sc).powi(2))
}

/// Chande momentum ratio in `[-1, 1]` over a clamped window of `length`
/// changes. A window without movement returns 0.
pub fn cmo(data: &[f64], length: usize) -> Vec<f64> {
    // Split each change into a gain and a loss; NaN lands in `losses`
    let mut gains = vec![0.0; data.len()];
    let mut losses = vec![0.0; data.len()];
    for i in 1..data.len() {
        let d = data[i] - data[i - 1];
        if d > 0.0 {
            gains[i] = d;
        } else {
            losses[i] = -d;
        }
    }

    (0..data.len())
        .map(|i| {
            let start = i.saturating_sub(length);
            let up = sum_simd(&gains[start + 1..=i]);
            let down = sum_simd(&losses[start + 1..=i]);
            let total = up + down;
            if total > ER_EPSILON {
                ((up - down) / total).clamp(-1.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

fn ratio(short: &[f64], long: &[f64]) -> Vec<f64> {
    short
        .iter()
        .zip(long)
        .map(|(s, l)| if *l > ER_EPSILON { s / l } else { 0.0 })
        .collect()
}

/// Short-window over long-window population standard deviation.
/// A flat long window gives 0.
pub fn stdev_ratio(data: &[f64], short: usize, long: usize) -> Vec<f64> {
    ratio(&rolling_stdev(data, short), &rolling_stdev(data, long))
}

/// Short-window over long-window average true range.
pub fn atr_ratio(true_ranges: &[f64], short: usize, long: usize) -> Vec<f64> {
    ratio(&rolling_mean(true_ranges, short), &rolling_mean(true_ranges, long))
}

/// `alpha = ratio * 2 / (period + 1)` with the first `lookback` factors at 1.
pub fn ratio_alphas(ratios: &[f64], period: usize, lookback: usize) -> Vec<f64> {
    let base = ema_alpha(period);
    ratios
        .iter()
        .enumerate()
        .map(|(i, r)| if i < lookback { 1.0 } else { clamp_alpha(r * base) })
        .collect()
}

/// A rule turning one series into per-bar smoothing factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum AdaptiveRule {
    /// Efficiency ratio mapped between fast and slow EMA constants (KAMA).
    Efficiency {
        period: usize,
        fast: usize,
        slow: usize,
    },
    /// `|CMO| * 2 / (period + 1)` (VIDYA).
    Momentum { period: usize, cmo_length: usize },
    /// `stdev(short) / stdev(long) * 2 / (period + 1)`.
    Volatility {
        period: usize,
        short: usize,
        long: usize,
    },
}

impl AdaptiveRule {
    /// Check the rule's windows.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        match *self {
            AdaptiveRule::Efficiency { period, fast, slow } => {
                IndicatorError::check_period("period", period)?;
                IndicatorError::check_period("fast", fast)?;
                IndicatorError::check_period("slow", slow)?;
                if fast >= slow {
                    return Err(IndicatorError::InvalidParameter(format!(
                        "fast ({}) must be shorter than slow ({})",
                        fast, slow
                    )));
                }
            }
            AdaptiveRule::Momentum { period, cmo_length } => {
                IndicatorError::check_period("period", period)?;
                IndicatorError::check_period("cmo_length", cmo_length)?;
            }
            AdaptiveRule::Volatility {
                period,
                short,
                long,
            } => {
                IndicatorError::check_period("period", period)?;
                IndicatorError::check_period("short", short)?;
                IndicatorError::check_period("long", long)?;
                if short >= long {
                    return Err(IndicatorError::InvalidParameter(format!(
                        "short ({}) must be shorter than long ({})",
                        short, long
                    )));
                }
            }
        }
        Ok(())
    }

    /// Bars whose factor is fixed at 1.
    pub fn lookback(&self) -> usize {
        match *self {
            AdaptiveRule::Efficiency { period, .. } => period,
            AdaptiveRule::Momentum { cmo_length, .. } => cmo_length,
            AdaptiveRule::Volatility { long, .. } => long,
        }
    }

    /// One smoothing factor per value of `data`.
    pub fn alphas(&self, data: &[f64]) -> Vec<f64> {
        let lookback = self.lookback();
        match *self {
            AdaptiveRule::Efficiency { period, fast, slow } => efficiency_ratio(data, period)
                .into_iter()
                .enumerate()
                .map(|(i, er)| if i < lookback { 1.0 } else { kama_alpha(er, fast, slow) })
                .collect(),
            AdaptiveRule::Momentum { period, cmo_length } => {
                let base = ema_alpha(period);
                cmo(data, cmo_length)
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| if i < lookback { 1.0 } else { clamp_alpha(c.abs() * base) })
                    .collect()
            }
            AdaptiveRule::Volatility {
                period,
                short,
                long,
            } => ratio_alphas(&stdev_ratio(data, short, long), period, lookback),
        }
    }
}

fn channel_range(highs: &[f64], lows: &[f64]) -> f64 {
    let high = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = lows.iter().copied().fold(f64::INFINITY, f64::min);
    high - low
}

/// Check a FRAMA window: even and at least 2.
pub fn check_fractal_period(period: usize) -> Result<(), IndicatorError> {
    if period < 2 || period % 2 != 0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "fractal period must be even and at least 2, got {}",
            period
        )));
    }
    Ok(())
}

/// FRAMA smoothing factors from the fractal dimension of the high/low
/// channel over `period` bars (two halves against the whole).
///
/// `D = (ln(N1 + N2) - ln(N3)) / ln 2` with `Nk = range / bars`, then
/// `alpha = exp(-4.6 * (D - 1))` clamped to `[0.01, 1]`. A window with no
/// range keeps the previous dimension (initially 1). The first
/// `period - 1` factors are 1.
pub fn fractal_alphas(highs: &[f64], lows: &[f64], period: usize) -> Vec<f64> {
    let len = highs.len().min(lows.len());
    let half = period / 2;
    let mut result = Vec::with_capacity(len);
    let mut dimension = 1.0;

    for i in 0..len {
        if i + 1 < period {
            result.push(1.0);
            continue;
        }
        let start = i + 1 - period;
        let mid = start + half;
        let n1 = channel_range(&highs[start..mid], &lows[start..mid]) / half as f64;
        let n2 = channel_range(&highs[mid..=i], &lows[mid..=i]) / half as f64;
        let n3 = channel_range(&highs[start..=i], &lows[start..=i]) / period as f64;

        if n1 + n2 > 0.0 && n3 > 0.0 {
            dimension = ((n1 + n2).ln() - n3.ln()) / std::f64::consts::LN_2;
        }
        let alpha = (-4.6 * (dimension - 1.0)).exp();
        result.push(if alpha.is_finite() {
            alpha.clamp(FRAMA_MIN_ALPHA, 1.0)
        } else {
            FRAMA_MIN_ALPHA
        });
    }

    result
}
