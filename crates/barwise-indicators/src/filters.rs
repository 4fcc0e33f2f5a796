//! Recursive (feedback) filters.
//!
//! Each filter is one left-to-right pass whose only state is the last few
//! inputs and outputs of that pass:
//!
//! `out[i] = g(in[i], in[i-1..i-k], out[i-1..i-m], coefficients)`
//!
//! Coefficients are fixed when the filter is built (or supplied per bar by
//! the adaptive selector), so every function here is a pure, deterministic
//! map from input to output of the same length.

use barwise_core::IndicatorError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// EMA smoothing factor, 2 / (n + 1).
#[inline]
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Wilder / SMMA smoothing factor, 1 / n.
#[inline]
pub fn smma_alpha(period: usize) -> f64 {
    1.0 / period as f64
}

/// Exponential smoothing with a constant factor.
///
/// `out[0] = in[0]`, then `out[i] = out[i-1] + alpha * (in[i] - out[i-1])`.
pub fn exp_smooth(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let mut prev = match data.first() {
        Some(&first) => first,
        None => return result,
    };
    result.push(prev);

    for &value in &data[1..] {
        prev += alpha * (value - prev);
        result.push(prev);
    }

    result
}

/// Exponential smoothing with a per-bar factor; `alphas[0]` is unused.
///
/// `alphas` must be index-aligned with `data` (same length). A factor of 1
/// passes the input through, a factor of 0 holds the previous output.
pub fn exp_smooth_adaptive(data: &[f64], alphas: &[f64]) -> Vec<f64> {
    debug_assert_eq!(alphas.len(), data.len(), "alphas must align with data");

    let mut result = Vec::with_capacity(data.len());
    let mut prev = match data.first() {
        Some(&first) => first,
        None => return result,
    };
    result.push(prev);

    for (&value, &alpha) in data.iter().skip(1).zip(alphas.iter().skip(1)) {
        prev += alpha * (value - prev);
        result.push(prev);
    }

    result
}

/// Named linear combinations of repeated EMA stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "depth")]
pub enum CascadeKind {
    /// 2*e1 - e2
    Dema,
    /// 3*e1 - 3*e2 + e3
    Tema,
    /// sum over k of (-1)^(k+1) * C(d, k) * e_k
    Nema(u32),
}

impl CascadeKind {
    /// Deepest NEMA stack accepted.
    pub const MAX_DEPTH: u32 = 50;

    /// Check the stack depth.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if let CascadeKind::Nema(depth) = self {
            IndicatorError::check_range("depth", *depth as f64, 1.0, Self::MAX_DEPTH as f64)?;
        }
        Ok(())
    }

    /// Number of stages.
    pub fn depth(&self) -> usize {
        match self {
            CascadeKind::Dema => 2,
            CascadeKind::Tema => 3,
            CascadeKind::Nema(depth) => *depth as usize,
        }
    }

    /// Stage weights, first stage first. They always sum to 1.
    pub fn weights(&self) -> Vec<f64> {
        let depth = self.depth();
        let mut weights = Vec::with_capacity(depth);
        let mut binom = 1.0;
        for k in 1..=depth {
            binom = binom * (depth + 1 - k) as f64 / k as f64;
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            weights.push(sign * binom);
        }
        weights
    }
}

/// Repeated exponential smoothing: stage k smooths stage k-1.
pub fn cascade_stages(data: &[f64], alpha: f64, depth: usize) -> Vec<Vec<f64>> {
    let mut stages: Vec<Vec<f64>> = Vec::with_capacity(depth);
    for _ in 0..depth {
        let input = stages.last().map_or(data, |prev| prev.as_slice());
        let stage = exp_smooth(input, alpha);
        stages.push(stage);
    }
    stages
}

/// Weighted sum of equally long stages.
pub fn combine<S: AsRef<[f64]>>(stages: &[S], weights: &[f64]) -> Vec<f64> {
    let len = stages.first().map_or(0, |s| s.as_ref().len());
    (0..len)
        .map(|i| {
            stages
                .iter()
                .zip(weights)
                .map(|(stage, w)| w * stage.as_ref()[i])
                .sum()
        })
        .collect()
}

/// Fixed-coefficient linear recurrence
/// `out[i] = sum(b[k] * in[i-k]) + sum(a[k] * out[i-1-k])`.
///
/// For the first `order` values there is no prior output, so the input is
/// passed through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFilter {
    feedforward: Vec<f64>,
    feedback: Vec<f64>,
}

impl LinearFilter {
    /// Build from feedforward `b[0..]` and feedback `a[0..]` (applied to
    /// `out[i-1]`, `out[i-2]`, ...).
    pub fn new(feedforward: Vec<f64>, feedback: Vec<f64>) -> Result<Self, IndicatorError> {
        if feedforward.is_empty() {
            return Err(IndicatorError::InvalidParameter(
                "filter needs at least one feedforward coefficient".to_string(),
            ));
        }
        if feedforward.iter().chain(&feedback).any(|c| !c.is_finite()) {
            return Err(IndicatorError::InvalidParameter(
                "filter coefficients must be finite".to_string(),
            ));
        }
        Ok(Self {
            feedforward,
            feedback,
        })
    }

    /// Ehlers two-pole Super Smoother.
    pub fn super_smoother(period: usize) -> Result<Self, IndicatorError> {
        let (a1, b1) = two_pole_terms(period)?;
        let c2 = b1;
        let c3 = -a1 * a1;
        let c1 = 1.0 - c2 - c3;
        Self::new(vec![c1 / 2.0, c1 / 2.0], vec![c2, c3])
    }

    /// Two-pole Butterworth low-pass.
    pub fn butterworth2(period: usize) -> Result<Self, IndicatorError> {
        let (a1, b1) = two_pole_terms(period)?;
        let c2 = b1;
        let c3 = -a1 * a1;
        let c1 = (1.0 - b1 + a1 * a1) / 4.0;
        Self::new(vec![c1, 2.0 * c1, c1], vec![c2, c3])
    }

    /// Three-pole Butterworth low-pass.
    pub fn butterworth3(period: usize) -> Result<Self, IndicatorError> {
        check_filter_period(period)?;
        let p = period as f64;
        let a1 = (-PI / p).exp();
        let b1 = 2.0 * a1 * (1.738 * PI / p).cos();
        let c1 = a1 * a1;
        let coef2 = b1 + c1;
        let coef3 = -(c1 + b1 * c1);
        let coef4 = c1 * c1;
        let coef1 = (1.0 - b1 + c1) * (1.0 - c1) / 8.0;
        Self::new(
            vec![coef1, 3.0 * coef1, 3.0 * coef1, coef1],
            vec![coef2, coef3, coef4],
        )
    }

    /// Number of leading values passed through.
    pub fn order(&self) -> usize {
        (self.feedforward.len() - 1).max(self.feedback.len())
    }

    /// Steady-state gain for constant input.
    pub fn dc_gain(&self) -> f64 {
        self.feedforward.iter().sum::<f64>() / (1.0 - self.feedback.iter().sum::<f64>())
    }

    /// Run the recurrence over `data`.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        let order = self.order();
        let mut out = Vec::with_capacity(data.len());

        for i in 0..data.len() {
            if i < order {
                out.push(data[i]);
                continue;
            }
            let ff: f64 = self
                .feedforward
                .iter()
                .enumerate()
                .map(|(k, b)| b * data[i - k])
                .sum();
            let fb: f64 = self
                .feedback
                .iter()
                .enumerate()
                .map(|(k, a)| a * out[i - 1 - k])
                .sum();
            out.push(ff + fb);
        }

        out
    }
}

fn check_filter_period(period: usize) -> Result<(), IndicatorError> {
    if period < 2 {
        return Err(IndicatorError::InvalidParameter(format!(
            "filter period must be at least 2, got {}",
            period
        )));
    }
    Ok(())
}

fn two_pole_terms(period: usize) -> Result<(f64, f64), IndicatorError> {
    check_filter_period(period)?;
    let arg = 1.414 * PI / period as f64;
    let a1 = (-arg).exp();
    Ok((a1, 2.0 * a1 * arg.cos()))
}

/// Four-element Laguerre filter state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaguerreStages {
    pub l0: f64,
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
}

impl LaguerreStages {
    /// FIR combination (L0 + 2 L1 + 2 L2 + L3) / 6.
    #[inline]
    pub fn filter(&self) -> f64 {
        (self.l0 + 2.0 * self.l1 + 2.0 * self.l2 + self.l3) / 6.0
    }

    /// Sum of upward and downward steps between adjacent stages.
    #[inline]
    pub fn up_down(&self) -> (f64, f64) {
        let mut cu = 0.0;
        let mut cd = 0.0;
        for (a, b) in [(self.l0, self.l1), (self.l1, self.l2), (self.l2, self.l3)] {
            if a >= b {
                cu += a - b;
            } else {
                cd += b - a;
            }
        }
        (cu, cd)
    }
}

/// Run the Laguerre cascade with damping `gamma`, all stages starting at the
/// first input.
pub fn laguerre_pass(data: &[f64], gamma: f64) -> Vec<LaguerreStages> {
    let mut result = Vec::with_capacity(data.len());
    let first = match data.first() {
        Some(&first) => first,
        None => return result,
    };
    let mut s = LaguerreStages {
        l0: first,
        l1: first,
        l2: first,
        l3: first,
    };

    for &price in data {
        let l0 = (1.0 - gamma) * price + gamma * s.l0;
        let l1 = -gamma * l0 + s.l0 + gamma * s.l1;
        let l2 = -gamma * l1 + s.l1 + gamma * s.l2;
        let l3 = -gamma * l2 + s.l2 + gamma * s.l3;
        s = LaguerreStages { l0, l1, l2, l3 };
        result.push(s);
    }

    result
}

/// One-dimensional Kalman level estimate with process noise `q` and
/// measurement noise `r`. The state starts at the first input with unit
/// variance.
pub fn kalman_level(data: &[f64], q: f64, r: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let mut x = match data.first() {
        Some(&first) => first,
        None => return result,
    };
    let mut p = 1.0;
    result.push(x);

    for &price in &data[1..] {
        // Predict
        let p_pred = p + q;
        // Update
        let k = p_pred / (p_pred + r);
        x += k * (price - x);
        p = (1.0 - k) * p_pred;
        result.push(x);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<f64> {
        (0..60)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_exp_smooth_fixed_point() {
        let result = exp_smooth(&[10.0, 10.0, 10.0, 10.0], ema_alpha(3));
        assert_eq!(result, vec![10.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_exp_smooth_values() {
        // alpha = 0.5
        let result = exp_smooth(&[1.0, 2.0, 3.0, 4.0], ema_alpha(3));
        assert_eq!(result, vec![1.0, 1.5, 2.25, 3.125]);
        assert!(exp_smooth(&[], 0.5).is_empty());
    }

    #[test]
    fn test_exp_smooth_adaptive_limits() {
        let data = [1.0, 5.0, 9.0];
        assert_eq!(exp_smooth_adaptive(&data, &[0.0, 1.0, 1.0]), data.to_vec());
        assert_eq!(exp_smooth_adaptive(&data, &[0.0, 0.0, 0.0]), vec![1.0; 3]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "alphas must align with data")]
    fn test_exp_smooth_adaptive_rejects_short_alphas() {
        exp_smooth_adaptive(&[1.0, 2.0, 3.0], &[1.0]);
    }

    #[test]
    fn test_cascade_weights() {
        assert_eq!(CascadeKind::Dema.weights(), vec![2.0, -1.0]);
        assert_eq!(CascadeKind::Tema.weights(), vec![3.0, -3.0, 1.0]);
        assert_eq!(CascadeKind::Nema(4).weights(), vec![4.0, -6.0, 4.0, -1.0]);
        for depth in 1..10 {
            let sum: f64 = CascadeKind::Nema(depth).weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        assert!(CascadeKind::Nema(0).validate().is_err());
        assert!(CascadeKind::Nema(51).validate().is_err());
    }

    #[test]
    fn test_cascade_stages_chain() {
        let data = sample();
        let alpha = ema_alpha(5);
        let stages = cascade_stages(&data, alpha, 3);

        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], exp_smooth(&data, alpha));
        assert_eq!(stages[2], exp_smooth(&stages[1], alpha));
    }

    #[test]
    fn test_filters_unit_dc_gain() {
        for period in [2, 5, 10, 40] {
            for filter in [
                LinearFilter::super_smoother(period).unwrap(),
                LinearFilter::butterworth2(period).unwrap(),
                LinearFilter::butterworth3(period).unwrap(),
            ] {
                assert!((filter.dc_gain() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_butterworth_constant_converges() {
        let v = 42.5;
        let data = vec![v; 50];
        for filter in [
            LinearFilter::butterworth2(10).unwrap(),
            LinearFilter::butterworth3(10).unwrap(),
            LinearFilter::super_smoother(10).unwrap(),
        ] {
            let out = filter.apply(&data);
            assert_eq!(out.len(), data.len());
            for value in out {
                assert!((value - v).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_filter_warmup_passthrough() {
        let data = sample();
        let filter = LinearFilter::butterworth3(10).unwrap();
        let out = filter.apply(&data);

        assert_eq!(filter.order(), 3);
        assert_eq!(&out[..3], &data[..3]);
    }

    #[test]
    fn test_filter_is_deterministic() {
        let data = sample();
        let filter = LinearFilter::super_smoother(12).unwrap();
        let a = filter.apply(&data);
        let b = filter.apply(&data);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_filter_validation() {
        assert!(LinearFilter::super_smoother(1).is_err());
        assert!(LinearFilter::butterworth3(0).is_err());
        assert!(LinearFilter::new(vec![], vec![0.5]).is_err());
        assert!(LinearFilter::new(vec![f64::NAN], vec![]).is_err());
    }

    #[test]
    fn test_laguerre_constant_input() {
        let stages = laguerre_pass(&[3.0; 10], 0.5);
        for s in stages {
            assert!((s.filter() - 3.0).abs() < 1e-12);
            assert_eq!(s.up_down(), (0.0, 0.0));
        }
    }

    #[test]
    fn test_laguerre_zero_gamma_tracks_input() {
        let data = [1.0, 4.0, 2.0, 8.0];
        let stages = laguerre_pass(&data, 0.0);
        for (s, &x) in stages.iter().zip(&data) {
            assert_eq!(s.l0, x);
        }
    }

    #[test]
    fn test_kalman_constant_input() {
        let result = kalman_level(&[100.0; 20], 0.01, 0.5);
        for level in result {
            assert!((level - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_kalman_smooths() {
        let prices = [100.0, 102.0, 98.0, 101.0, 99.0, 100.5, 99.5, 100.0, 101.0, 99.0];
        let result = kalman_level(&prices, 0.1, 1.0);

        let price_var: f64 = prices.iter().map(|x| (x - 100.0).powi(2)).sum::<f64>() / 10.0;
        let kalman_var: f64 = result.iter().map(|x| (x - 100.0).powi(2)).sum::<f64>() / 10.0;
        assert!(kalman_var < price_var);
    }
}
