//! Recursive smoothing filters.

use barwise_core::{Indicator, IndicatorError, Series};
use serde::{Deserialize, Serialize};

use crate::filters::{kalman_level, laguerre_pass, LinearFilter};

/// Fixed-coefficient multi-pole low-pass designs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoleDesign {
    /// Ehlers two-pole Super Smoother
    SuperSmoother,
    /// Two-pole Butterworth
    Butterworth2,
    /// Three-pole Butterworth
    Butterworth3,
}

/// A multi-pole low-pass filter with coefficients derived from a period.
///
/// The first `order` outputs repeat the input.
#[derive(Debug, Clone)]
pub struct PoleFilter {
    design: PoleDesign,
    period: usize,
    filter: LinearFilter,
}

impl PoleFilter {
    /// Derive coefficients for `design` at `period` (at least 2).
    pub fn new(design: PoleDesign, period: usize) -> Result<Self, IndicatorError> {
        let filter = match design {
            PoleDesign::SuperSmoother => LinearFilter::super_smoother(period)?,
            PoleDesign::Butterworth2 => LinearFilter::butterworth2(period)?,
            PoleDesign::Butterworth3 => LinearFilter::butterworth3(period)?,
        };
        Ok(Self {
            design,
            period,
            filter,
        })
    }

    pub fn super_smoother(period: usize) -> Result<Self, IndicatorError> {
        Self::new(PoleDesign::SuperSmoother, period)
    }

    pub fn butterworth2(period: usize) -> Result<Self, IndicatorError> {
        Self::new(PoleDesign::Butterworth2, period)
    }

    pub fn butterworth3(period: usize) -> Result<Self, IndicatorError> {
        Self::new(PoleDesign::Butterworth3, period)
    }
}

impl Indicator for PoleFilter {
    fn compute(&self, data: &Series) -> Series {
        self.filter.apply(data).into()
    }

    fn lookback(&self) -> usize {
        self.filter.order()
    }

    fn name(&self) -> &str {
        match self.design {
            PoleDesign::SuperSmoother => "SUPERSMOOTHER",
            PoleDesign::Butterworth2 => "BUTTERWORTH2",
            PoleDesign::Butterworth3 => "BUTTERWORTH3",
        }
    }

    fn params(&self) -> String {
        self.period.to_string()
    }
}

/// Ehlers Laguerre filter with damping `gamma` in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct LaguerreFilter {
    gamma: f64,
}

impl LaguerreFilter {
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

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Indicator for LaguerreFilter {
    fn compute(&self, data: &Series) -> Series {
        laguerre_pass(data, self.gamma)
            .iter()
            .map(|stages| stages.filter())
            .collect()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "LAGUERRE"
    }

    fn params(&self) -> String {
        self.gamma.to_string()
    }
}

/// One-dimensional Kalman level tracker.
#[derive(Debug, Clone)]
pub struct KalmanSmoother {
    process_noise: f64,
    measurement_noise: f64,
}

impl KalmanSmoother {
    /// Both noise variances must be positive and finite.
    pub fn new(process_noise: f64, measurement_noise: f64) -> Result<Self, IndicatorError> {
        for (param, value) in [
            ("process_noise", process_noise),
            ("measurement_noise", measurement_noise),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(IndicatorError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    param, value
                )));
            }
        }
        Ok(Self {
            process_noise,
            measurement_noise,
        })
    }
}

impl Indicator for KalmanSmoother {
    fn compute(&self, data: &Series) -> Series {
        kalman_level(data, self.process_noise, self.measurement_noise).into()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "KALMAN"
    }

    fn params(&self) -> String {
        format!("{},{}", self.process_noise, self.measurement_noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy() -> Series {
        (0..100)
            .map(|i| 50.0 + (i as f64 * 0.2).sin() * 2.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect()
    }

    fn roughness(values: &[f64]) -> f64 {
        values.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
    }

    #[test]
    fn test_butterworth_steady_state() {
        // Four warm-up values v, then v thereafter
        let v = 12.25;
        let data = Series::constant(v, 40);
        let filter = PoleFilter::butterworth2(8).unwrap();
        let result = filter.compute(&data);

        assert_eq!(result.len(), data.len());
        assert!((result[39] - v).abs() < 1e-9);
    }

    #[test]
    fn test_pole_filters_smooth() {
        let data = noisy();
        for design in [
            PoleDesign::SuperSmoother,
            PoleDesign::Butterworth2,
            PoleDesign::Butterworth3,
        ] {
            let filter = PoleFilter::new(design, 10).unwrap();
            let result = filter.compute(&data);
            assert_eq!(&result[..filter.lookback()], &data[..filter.lookback()]);
            assert!(roughness(&result) < roughness(&data));
        }
    }

    #[test]
    fn test_pole_filter_rejects_short_period() {
        assert!(PoleFilter::super_smoother(1).is_err());
        assert!(PoleFilter::butterworth3(0).is_err());
    }

    #[test]
    fn test_laguerre_filter() {
        assert!(LaguerreFilter::new(1.0).is_err());
        assert!(LaguerreFilter::new(-0.1).is_err());

        let data = noisy();
        let result = LaguerreFilter::new(0.8).unwrap().compute(&data);
        assert_eq!(result.len(), data.len());
        assert!(roughness(&result) < roughness(&data));
    }

    #[test]
    fn test_kalman_smoother() {
        assert!(KalmanSmoother::new(0.0, 1.0).is_err());
        assert!(KalmanSmoother::new(0.1, f64::NAN).is_err());

        let data = noisy();
        let result = KalmanSmoother::new(0.01, 1.0).unwrap().compute(&data);
        assert_eq!(result[0], data[0]);
        assert!(roughness(&result) < roughness(&data));
    }
}
