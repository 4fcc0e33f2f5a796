//! Trailing-window statistics.
//!
//! Every function looks at `series[end - length + 1 ..= end]` and clamps the
//! window to the history that exists, so nothing before index 0 is read and a
//! short series never fails. Whether a clamped result is acceptable is up to
//! the caller: [`Window`] carries an explicit minimum-history guard and returns
//! `None` when it is not met, leaving the fallback to the indicator.

use barwise_core::IndicatorError;
use std::collections::VecDeque;
use std::ops::Range;

use crate::simd::{minmax_simd, sum_simd, sum_sq_dev_simd};

/// Index range of the clamped window ending at `end`.
///
/// `length` is a validated window length (at least 1).
#[inline]
pub fn window_range(end: usize, length: usize) -> Range<usize> {
    debug_assert!(length > 0, "window length must be at least 1");
    let span = length.min(end + 1);
    (end + 1 - span)..(end + 1)
}

/// Maximum over the clamped window.
pub fn highest(series: &[f64], end: usize, length: usize) -> f64 {
    let window = &series[window_range(end, length)];
    minmax_simd(window).map_or(f64::NAN, |(_, max)| max)
}

/// Minimum over the clamped window.
pub fn lowest(series: &[f64], end: usize, length: usize) -> f64 {
    let window = &series[window_range(end, length)];
    minmax_simd(window).map_or(f64::NAN, |(min, _)| min)
}

/// Sum over the clamped window.
pub fn sum(series: &[f64], end: usize, length: usize) -> f64 {
    sum_simd(&series[window_range(end, length)])
}

/// Arithmetic mean over the clamped window.
pub fn mean(series: &[f64], end: usize, length: usize) -> f64 {
    let range = window_range(end, length);
    let count = range.len() as f64;
    sum_simd(&series[range]) / count
}

/// Population variance (divides by the window length) over the clamped window.
pub fn variance(series: &[f64], end: usize, length: usize) -> f64 {
    let window = &series[window_range(end, length)];
    let count = window.len() as f64;
    let mean = sum_simd(window) / count;
    sum_sq_dev_simd(window, mean) / count
}

/// Population standard deviation over the clamped window.
pub fn stdev(series: &[f64], end: usize, length: usize) -> f64 {
    variance(series, end, length).sqrt()
}

/// Position of `series[end]` within the window's range, in `[0, 1]`.
///
/// A flat window (highest == lowest) returns `degenerate`.
pub fn rank01(series: &[f64], end: usize, length: usize, degenerate: f64) -> f64 {
    let window = &series[window_range(end, length)];
    match minmax_simd(window) {
        Some((low, high)) if high > low => ((series[end] - low) / (high - low)).clamp(0.0, 1.0),
        _ => degenerate,
    }
}

/// [`rank01`] scaled to `[0, 100]`; a flat window returns `degenerate`.
pub fn rank_pct(series: &[f64], end: usize, length: usize, degenerate: f64) -> f64 {
    let window = &series[window_range(end, length)];
    match minmax_simd(window) {
        Some((low, high)) if high > low => {
            (100.0 * (series[end] - low) / (high - low)).clamp(0.0, 100.0)
        }
        _ => degenerate,
    }
}

/// Check whether `min_history` values exist up to and including `end`.
#[inline]
pub fn has_history(end: usize, min_history: usize) -> bool {
    end + 1 >= min_history
}

/// A validated window length with a minimum-history guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    length: usize,
    min_history: usize,
}

impl Window {
    /// Window of `length` that accepts any clamped history.
    pub fn new(length: usize) -> Result<Self, IndicatorError> {
        IndicatorError::check_period("window", length)?;
        Ok(Self {
            length,
            min_history: 1,
        })
    }

    /// Window of `length` that requires a full window of history.
    pub fn full(length: usize) -> Result<Self, IndicatorError> {
        Ok(Self::new(length)?.with_min_history(length))
    }

    /// Require `min_history` values before answering.
    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history.max(1);
        self
    }

    /// Window length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Minimum history required.
    pub fn min_history(&self) -> usize {
        self.min_history
    }

    /// Check whether the guard is met at `end`.
    #[inline]
    pub fn is_ready(&self, end: usize) -> bool {
        has_history(end, self.min_history)
    }

    #[inline]
    fn guarded(&self, end: usize, f: impl FnOnce() -> f64) -> Option<f64> {
        self.is_ready(end).then(f)
    }

    /// Guarded [`highest`].
    pub fn highest(&self, series: &[f64], end: usize) -> Option<f64> {
        self.guarded(end, || highest(series, end, self.length))
    }

    /// Guarded [`lowest`].
    pub fn lowest(&self, series: &[f64], end: usize) -> Option<f64> {
        self.guarded(end, || lowest(series, end, self.length))
    }

    /// Guarded [`sum`].
    pub fn sum(&self, series: &[f64], end: usize) -> Option<f64> {
        self.guarded(end, || sum(series, end, self.length))
    }

    /// Guarded [`mean`].
    pub fn mean(&self, series: &[f64], end: usize) -> Option<f64> {
        self.guarded(end, || mean(series, end, self.length))
    }

    /// Guarded [`variance`].
    pub fn variance(&self, series: &[f64], end: usize) -> Option<f64> {
        self.guarded(end, || variance(series, end, self.length))
    }

    /// Guarded [`stdev`].
    pub fn stdev(&self, series: &[f64], end: usize) -> Option<f64> {
        self.guarded(end, || stdev(series, end, self.length))
    }

    /// Guarded [`rank01`].
    pub fn rank01(&self, series: &[f64], end: usize, degenerate: f64) -> Option<f64> {
        self.guarded(end, || rank01(series, end, self.length, degenerate))
    }

    /// Guarded [`rank_pct`].
    pub fn rank_pct(&self, series: &[f64], end: usize, degenerate: f64) -> Option<f64> {
        self.guarded(end, || rank_pct(series, end, self.length, degenerate))
    }
}

/// Clamped-window sum at every index.
///
/// Each window is reduced on its own, so a non-finite or huge value only
/// affects the windows that contain it.
pub fn rolling_sum(data: &[f64], length: usize) -> Vec<f64> {
    (0..data.len()).map(|i| sum(data, i, length)).collect()
}

/// Clamped-window mean at every index: the average of available history
/// until a full window exists.
pub fn rolling_mean(data: &[f64], length: usize) -> Vec<f64> {
    rolling_sum(data, length)
        .into_iter()
        .enumerate()
        .map(|(i, s)| s / length.min(i + 1) as f64)
        .collect()
}

/// Clamped-window population standard deviation at every index.
pub fn rolling_stdev(data: &[f64], length: usize) -> Vec<f64> {
    (0..data.len()).map(|i| stdev(data, i, length)).collect()
}

fn rolling_extreme(data: &[f64], length: usize, keep: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    // Indices whose values are monotonic from front to back.
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(length.min(data.len()));
    let mut result = Vec::with_capacity(data.len());

    for (i, &value) in data.iter().enumerate() {
        while let Some(&back) = deque.back() {
            if keep(data[back], value) {
                break;
            }
            deque.pop_back();
        }
        deque.push_back(i);

        if let Some(&front) = deque.front() {
            if front + length <= i {
                deque.pop_front();
            }
        }

        result.push(deque.front().map_or(value, |&idx| data[idx]));
    }

    result
}

/// Clamped-window maximum at every index, O(n).
pub fn rolling_highest(data: &[f64], length: usize) -> Vec<f64> {
    rolling_extreme(data, length, |kept, new| kept > new)
}

/// Clamped-window minimum at every index, O(n).
pub fn rolling_lowest(data: &[f64], length: usize) -> Vec<f64> {
    rolling_extreme(data, length, |kept, new| kept < new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_range_clamps() {
        assert_eq!(window_range(0, 5), 0..1);
        assert_eq!(window_range(2, 5), 0..3);
        assert_eq!(window_range(9, 3), 7..10);
    }

    #[test]
    fn test_highest_with_window_larger_than_history() {
        let data = [5.0, 3.0, 8.0, 1.0, 9.0];
        assert_eq!(highest(&data, 4, 10), 9.0);
        assert_eq!(highest(&data, 3, 10), highest(&data, 3, 4));
        assert_eq!(lowest(&data, 2, 10), 3.0);
    }

    #[test]
    fn test_sum_and_mean() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sum(&data, 4, 3) - 12.0).abs() < 1e-10);
        assert!((mean(&data, 4, 3) - 4.0).abs() < 1e-10);
        // Clamped to [1, 2]
        assert!((mean(&data, 1, 3) - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_population_variance() {
        let data = [2.0, 4.0, 6.0];
        // Mean 4, variance (4 + 0 + 4) / 3
        assert!((variance(&data, 2, 3) - 8.0 / 3.0).abs() < 1e-10);
        assert!((stdev(&data, 2, 3) - (8.0f64 / 3.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_rank01_bounds_and_sentinel() {
        let data = [1.0, 3.0, 2.0, 5.0, 4.0];
        for end in 0..data.len() {
            let r = rank01(&data, end, 3, 0.5);
            assert!((0.0..=1.0).contains(&r));
        }
        assert!((rank01(&data, 3, 3, 0.5) - 1.0).abs() < 1e-10);
        assert!((rank01(&data, 4, 3, 0.5) - 2.0 / 3.0).abs() < 1e-10);

        // Flat window
        let flat = [7.0, 7.0, 7.0];
        assert_eq!(rank01(&flat, 2, 3, 0.5), 0.5);
        assert_eq!(rank_pct(&flat, 2, 3, 50.0), 50.0);
        // First index is always a flat window
        assert_eq!(rank01(&data, 0, 3, 0.5), 0.5);
    }

    #[test]
    fn test_rank_pct() {
        let data = [10.0, 20.0, 15.0];
        assert!((rank_pct(&data, 2, 3, 50.0) - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_window_guard() {
        let window = Window::full(3).unwrap();
        let data = [1.0, 2.0, 3.0, 4.0];

        assert_eq!(window.mean(&data, 0), None);
        assert_eq!(window.mean(&data, 1), None);
        assert_eq!(window.mean(&data, 2), Some(2.0));
        assert_eq!(window.highest(&data, 3), Some(4.0));

        let loose = Window::new(3).unwrap();
        assert_eq!(loose.mean(&data, 0), Some(1.0));
    }

    #[test]
    fn test_window_rejects_zero_length() {
        assert!(Window::new(0).is_err());
        assert!(Window::full(0).is_err());
    }

    #[test]
    fn test_rolling_mean_growing_warmup() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let result = rolling_mean(&data, 3);
        let expected = [1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

        assert_eq!(result.len(), data.len());
        for (got, want) in result.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    fn same(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-10
    }

    #[test]
    fn test_rolling_mean_forgets_values_that_left_the_window() {
        let gap = [1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let result = rolling_mean(&gap, 3);
        for i in 0..gap.len() {
            assert!(same(result[i], mean(&gap, i, 3)), "index {}", i);
        }
        assert_eq!(result[4], 4.0);
        assert_eq!(result[7], 7.0);

        let spike = [1e17, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let result = rolling_mean(&spike, 2);
        assert_eq!(result[1], 5e16);
        for value in &result[2..] {
            assert!((value - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rolling_extremes_match_pointwise() {
        let data = [5.0, 3.0, 8.0, 1.0, 9.0, 2.0, 2.0, 7.0, 6.0];
        let highs = rolling_highest(&data, 3);
        let lows = rolling_lowest(&data, 3);

        for i in 0..data.len() {
            assert_eq!(highs[i], highest(&data, i, 3));
            assert_eq!(lows[i], lowest(&data, i, 3));
        }
    }
}
