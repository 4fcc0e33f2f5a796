//! Stop-loss levels for an open position.
//!
//! Stop handlers read the position through [`PositionView`] and produce
//! one stop price per bar. Bars before the entry bar are 0.0. After entry
//! the level only ever moves in the position's favour.

use barwise_core::{BarIndicator, Bars, IndicatorError, PositionView, Series, SeriesCache};

use crate::volatility::Atr;

/// A per-bar stop level for one position.
pub trait StopHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Stop price per bar.
    fn compute(
        &self,
        bars: &Bars,
        position: &dyn PositionView,
        cache: &mut dyn SeriesCache,
    ) -> Series;
}

/// Walk the bars from entry, ratcheting `candidate(i, extreme)`.
fn ratchet(
    len: usize,
    position: &dyn PositionView,
    mut candidate: impl FnMut(usize, f64) -> f64,
) -> Series {
    let long = position.is_long();
    let mut stops = vec![0.0; len];
    let mut current: Option<f64> = None;

    for (i, stop) in stops.iter_mut().enumerate().skip(position.entry_bar()) {
        let Some(extreme) = position.favorable_extreme(i) else {
            break;
        };
        let level = candidate(i, extreme);
        let next = match current {
            // Long: move stop up if price moved up
            Some(prev) if long => prev.max(level),
            // Short: move stop down if price moved down
            Some(prev) => prev.min(level),
            None => level,
        };
        current = Some(next);
        *stop = next;
    }

    stops.into()
}

/// First bar at or after entry whose range reaches the stop.
pub fn first_trigger(bars: &Bars, stops: &[f64], position: &dyn PositionView) -> Option<usize> {
    bars.iter()
        .zip(stops)
        .enumerate()
        .skip(position.entry_bar())
        .find(|(_, (bar, stop))| {
            if position.is_long() {
                bar.low <= **stop
            } else {
                bar.high >= **stop
            }
        })
        .map(|(i, _)| i)
}

/// Trailing stop a fixed percentage behind the favourable extreme.
#[derive(Debug, Clone)]
pub struct TrailingPercentStop {
    percent: f64,
}

impl TrailingPercentStop {
    /// `percent` in `(0, 100)`.
    pub fn new(percent: f64) -> Result<Self, IndicatorError> {
        if !(percent > 0.0 && percent < 100.0) {
            return Err(IndicatorError::ParamOutOfRange {
                param: "percent",
                value: percent,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(Self { percent })
    }
}

impl StopHandler for TrailingPercentStop {
    fn name(&self) -> &str {
        "TRAILING_PERCENT"
    }

    fn compute(
        &self,
        bars: &Bars,
        position: &dyn PositionView,
        _cache: &mut dyn SeriesCache,
    ) -> Series {
        let offset = self.percent / 100.0;
        let long = position.is_long();
        ratchet(bars.len(), position, |_, extreme| {
            if long {
                extreme * (1.0 - offset)
            } else {
                extreme * (1.0 + offset)
            }
        })
    }
}

/// Chandelier stop: favourable extreme minus (long) or plus (short) a
/// multiple of ATR.
#[derive(Debug, Clone)]
pub struct AtrTrailingStop {
    atr: Atr,
    multiplier: f64,
}

impl AtrTrailingStop {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, IndicatorError> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(IndicatorError::InvalidParameter(format!(
                "ATR multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(Self {
            atr: Atr::new(period)?,
            multiplier,
        })
    }
}

impl StopHandler for AtrTrailingStop {
    fn name(&self) -> &str {
        "ATR_TRAILING"
    }

    fn compute(
        &self,
        bars: &Bars,
        position: &dyn PositionView,
        cache: &mut dyn SeriesCache,
    ) -> Series {
        let atr = self.atr.compute_cached(bars, cache);
        let long = position.is_long();
        ratchet(bars.len(), position, |i, extreme| {
            let offset = self.multiplier * atr[i];
            if long {
                extreme - offset
            } else {
                extreme + offset
            }
        })
    }
}

/// Fixed initial stop that moves to the entry price once the trade has
/// run `trigger` points in its favour.
#[derive(Debug, Clone)]
pub struct BreakevenStop {
    risk: f64,
    trigger: f64,
}

impl BreakevenStop {
    /// `risk` and `trigger` are price distances from entry; both positive.
    pub fn new(risk: f64, trigger: f64) -> Result<Self, IndicatorError> {
        for (param, value) in [("risk", risk), ("trigger", trigger)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(IndicatorError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    param, value
                )));
            }
        }
        Ok(Self { risk, trigger })
    }
}

impl StopHandler for BreakevenStop {
    fn name(&self) -> &str {
        "BREAKEVEN"
    }

    fn compute(
        &self,
        bars: &Bars,
        position: &dyn PositionView,
        _cache: &mut dyn SeriesCache,
    ) -> Series {
        let entry = position.entry_price();
        let long = position.is_long();
        ratchet(bars.len(), position, |_, extreme| {
            let excursion = if long { extreme - entry } else { entry - extreme };
            if excursion >= self.trigger {
                entry
            } else if long {
                entry - self.risk
            } else {
                entry + self.risk
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoCache;
    use barwise_core::{Bar, NoCache, OpenPosition};

    fn bars_from(closes: &[f64]) -> Bars {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64, c, c + 1.0, c - 1.0, c, 100.0))
            .collect()
    }

    fn open(bars: &Bars, entry_bar: usize, long: bool) -> OpenPosition {
        let entry = bars.as_slice()[entry_bar].close;
        OpenPosition::new(entry, entry_bar, long, &bars.highs(), &bars.lows())
    }

    #[test]
    fn test_trailing_percent_long() {
        let bars = bars_from(&[100.0, 100.0, 105.0, 110.0, 104.0, 108.0]);
        let pos = open(&bars, 1, true);
        let stops = TrailingPercentStop::new(10.0)
            .unwrap()
            .compute(&bars, &pos, &mut NoCache);

        assert_eq!(stops.len(), bars.len());
        assert_eq!(stops[0], 0.0);
        // Highest high after entry is 101, then 106, then 111
        assert!((stops[1] - 101.0 * 0.9).abs() < 1e-10);
        assert!((stops[3] - 111.0 * 0.9).abs() < 1e-10);
        // Pullback does not lower the stop
        assert_eq!(stops[4], stops[3]);
        assert_eq!(stops[5], stops[3]);
    }

    #[test]
    fn test_trailing_percent_short() {
        let bars = bars_from(&[100.0, 95.0, 97.0, 90.0]);
        let pos = open(&bars, 0, false);
        let stops = TrailingPercentStop::new(5.0)
            .unwrap()
            .compute(&bars, &pos, &mut NoCache);

        assert!((stops[0] - 99.0 * 1.05).abs() < 1e-10);
        assert!((stops[1] - 94.0 * 1.05).abs() < 1e-10);
        assert_eq!(stops[2], stops[1]);
        assert!(stops[3] < stops[2]);
    }

    #[test]
    fn test_atr_trailing_never_loosens() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 50.0 + i as f64 * 0.5 + if i % 3 == 0 { -2.0 } else { 1.0 })
            .collect();
        let bars = bars_from(&closes);
        let pos = open(&bars, 5, true);
        let mut cache = MemoCache::new();
        let stops = AtrTrailingStop::new(14, 3.0)
            .unwrap()
            .compute(&bars, &pos, &mut cache);

        assert!(stops[..5].iter().all(|&s| s == 0.0));
        for w in stops[5..].windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert!(cache.contains(&barwise_core::CacheKey::new(
            "ATR",
            "14",
            bars.source_id()
        )));
    }

    #[test]
    fn test_breakeven_moves_to_entry() {
        let bars = bars_from(&[100.0, 101.0, 103.0, 106.0, 102.0]);
        let pos = open(&bars, 0, true);
        let stops = BreakevenStop::new(2.0, 5.0)
            .unwrap()
            .compute(&bars, &pos, &mut NoCache);

        // Highs: 101, 102, 104, 107: trigger at bar 3
        assert_eq!(stops[0], 98.0);
        assert_eq!(stops[2], 98.0);
        assert_eq!(stops[3], 100.0);
        assert_eq!(stops[4], 100.0);
    }

    #[test]
    fn test_first_trigger() {
        let bars = bars_from(&[100.0, 100.0, 105.0, 110.0, 98.0]);
        let pos = open(&bars, 1, true);
        let stops = TrailingPercentStop::new(5.0)
            .unwrap()
            .compute(&bars, &pos, &mut NoCache);

        // Stop at 111 * 0.95 = 105.45; bar 4 low is 97
        assert_eq!(first_trigger(&bars, &stops, &pos), Some(4));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TrailingPercentStop::new(0.0).is_err());
        assert!(TrailingPercentStop::new(100.0).is_err());
        assert!(AtrTrailingStop::new(0, 2.0).is_err());
        assert!(AtrTrailingStop::new(14, -1.0).is_err());
        assert!(BreakevenStop::new(1.0, f64::NAN).is_err());
    }
}
