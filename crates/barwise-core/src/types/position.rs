//! Read-only position accessor for trade-management handlers.

use serde::{Deserialize, Serialize};

/// What a stop handler may read about an open position.
pub trait PositionView {
    /// Average entry price.
    fn entry_price(&self) -> f64;

    /// Index of the entry bar in the evaluated bars.
    fn entry_bar(&self) -> usize;

    /// Long (`true`) or short (`false`).
    fn is_long(&self) -> bool;

    /// Most favourable price reached from the entry bar up to and
    /// including `bar`: the highest high for longs, the lowest low for shorts.
    ///
    /// Returns `None` for bars before entry.
    fn favorable_extreme(&self, bar: usize) -> Option<f64>;
}

/// A position opened at a known bar, tracking its extreme against the
/// bars it is evaluated on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Entry price
    pub entry_price: f64,
    /// Entry bar index
    pub entry_bar: usize,
    /// Direction
    pub long: bool,
    /// Favourable extreme per bar, starting at the entry bar
    extremes: Vec<f64>,
}

impl OpenPosition {
    /// Open a position and precompute the running favourable extreme from
    /// the given highs and lows.
    pub fn new(
        entry_price: f64,
        entry_bar: usize,
        long: bool,
        highs: &[f64],
        lows: &[f64],
    ) -> Self {
        let len = highs.len().min(lows.len());
        let mut extremes = Vec::with_capacity(len.saturating_sub(entry_bar));
        let mut extreme = entry_price;

        for i in entry_bar..len {
            extreme = if long {
                extreme.max(highs[i])
            } else {
                extreme.min(lows[i])
            };
            extremes.push(extreme);
        }

        Self {
            entry_price,
            entry_bar,
            long,
            extremes,
        }
    }
}

impl PositionView for OpenPosition {
    fn entry_price(&self) -> f64 {
        self.entry_price
    }

    fn entry_bar(&self) -> usize {
        self.entry_bar
    }

    fn is_long(&self) -> bool {
        self.long
    }

    fn favorable_extreme(&self, bar: usize) -> Option<f64> {
        bar.checked_sub(self.entry_bar)
            .and_then(|offset| self.extremes.get(offset).copied())
    }
}
