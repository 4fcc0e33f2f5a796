//! Closed-form window kernels and order-statistic windows.
//!
//! Weight vectors are ordered oldest first and depend only on the window
//! length. During warm-up the kernel is re-evaluated for the shorter span of
//! available history.

use barwise_core::IndicatorError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::simd::{dot_product_simd, sum_simd};
use crate::window::window_range;

/// Longest window accepted for the binomial kernel; beyond this the
/// coefficients overflow `f64`.
pub const MAX_BINOMIAL_LENGTH: usize = 512;

/// Per-offset weighting scheme for a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// Equal weights
    Uniform,
    /// 1, 2, ..., n (newest heaviest)
    Linear,
    /// Rising then falling, peak in the middle
    Triangular,
    /// sin(pi * k / (n + 1)) for k = 1..=n
    Sine,
    /// Binomial coefficients C(n-1, k), a discrete Gaussian
    Binomial,
}

impl Kernel {
    /// Check that the kernel can be evaluated for `length`.
    pub fn validate(&self, length: usize) -> Result<(), IndicatorError> {
        IndicatorError::check_period("kernel", length)?;
        if *self == Kernel::Binomial && length > MAX_BINOMIAL_LENGTH {
            return Err(IndicatorError::ParamOutOfRange {
                param: "length",
                value: length as f64,
                min: 1.0,
                max: MAX_BINOMIAL_LENGTH as f64,
            });
        }
        Ok(())
    }

    /// Weights for a window of `length`, oldest first.
    pub fn weights(&self, length: usize) -> Vec<f64> {
        let n = length as f64;
        match self {
            Kernel::Uniform => vec![1.0; length],
            Kernel::Linear => (1..=length).map(|k| k as f64).collect(),
            Kernel::Triangular => (0..length)
                .map(|k| (k + 1).min(length - k) as f64)
                .collect(),
            Kernel::Sine => (1..=length)
                .map(|k| (PI * k as f64 / (n + 1.0)).sin())
                .collect(),
            Kernel::Binomial => {
                let mut weights = Vec::with_capacity(length);
                let mut w = 1.0;
                for k in 0..length {
                    weights.push(w);
                    w = w * (length - 1 - k) as f64 / (k + 1) as f64;
                }
                weights
            }
        }
    }
}

/// Kernel-weighted average over the clamped window at every index.
///
/// `length` must already be validated with [`Kernel::validate`].
pub fn weighted_average(data: &[f64], kernel: Kernel, length: usize) -> Vec<f64> {
    let full = kernel.weights(length);
    let full_sum = sum_simd(&full);

    (0..data.len())
        .map(|i| {
            let range = window_range(i, length);
            if range.len() == length {
                dot_product_simd(&data[range], &full) / full_sum
            } else {
                let partial = kernel.weights(range.len());
                dot_product_simd(&data[range], &partial) / sum_simd(&partial)
            }
        })
        .collect()
}

/// Median of the clamped window at every index. An even-sized window
/// averages its two middle values.
pub fn moving_median(data: &[f64], length: usize) -> Vec<f64> {
    let mut scratch = Vec::with_capacity(length);

    (0..data.len())
        .map(|i| {
            scratch.clear();
            scratch.extend_from_slice(&data[window_range(i, length)]);
            scratch.sort_by(|a, b| a.total_cmp(b));

            let mid = scratch.len() / 2;
            if scratch.len() % 2 == 1 {
                scratch[mid]
            } else {
                (scratch[mid - 1] + scratch[mid]) / 2.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KERNELS: [Kernel; 5] = [
        Kernel::Uniform,
        Kernel::Linear,
        Kernel::Triangular,
        Kernel::Sine,
        Kernel::Binomial,
    ];

    #[test]
    fn test_kernel_weights() {
        assert_eq!(Kernel::Linear.weights(3), vec![1.0, 2.0, 3.0]);
        assert_eq!(Kernel::Triangular.weights(5), vec![1.0, 2.0, 3.0, 2.0, 1.0]);
        assert_eq!(Kernel::Triangular.weights(4), vec![1.0, 2.0, 2.0, 1.0]);
        assert_eq!(Kernel::Binomial.weights(5), vec![1.0, 4.0, 6.0, 4.0, 1.0]);

        let sine = Kernel::Sine.weights(3);
        assert!((sine[0] - (PI / 4.0).sin()).abs() < 1e-12);
        assert!((sine[1] - 1.0).abs() < 1e-12);
        assert!((sine[0] - sine[2]).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_linear() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = weighted_average(&data, Kernel::Linear, 3);

        assert_eq!(result.len(), data.len());
        // Warm-up over available history: (1*1 + 2*2) / 3
        assert!((result[1] - 5.0 / 3.0).abs() < 1e-10);
        // (1*1 + 2*2 + 3*3) / 6
        assert!((result[2] - 14.0 / 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_weighted_average_first_value_is_input() {
        let data = vec![42.0, 1.0, 2.0];
        for kernel in ALL_KERNELS {
            let result = weighted_average(&data, kernel, 3);
            assert!((result[0] - 42.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_weighted_average_constant_input() {
        let data = vec![5.0; 12];
        for kernel in ALL_KERNELS {
            for value in weighted_average(&data, kernel, 4) {
                assert!((value - 5.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_binomial_length_limit() {
        assert!(Kernel::Binomial.validate(MAX_BINOMIAL_LENGTH).is_ok());
        assert!(Kernel::Binomial.validate(MAX_BINOMIAL_LENGTH + 1).is_err());
        assert!(Kernel::Sine.validate(0).is_err());
    }

    #[test]
    fn test_moving_median() {
        let data = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let result = moving_median(&data, 3);

        assert_eq!(result, vec![5.0, 3.0, 4.0, 2.0, 3.0]);
    }
}
