//! Series-computation core and a representative indicator catalog.
//!
//! The core is a small set of pure, single-pass building blocks:
//! - Trailing-window statistics with explicit clamping (`window`)
//! - Recursive filters: exponential smoothing, EMA cascades, multi-pole
//!   low-pass designs, Laguerre and Kalman passes (`filters`)
//! - Closed-form window kernels and moving medians (`kernels`)
//! - Adaptive smoothing coefficients (`adaptive`)
//! - An in-memory memoization cache (`cache`)
//!
//! The catalog modules build concrete indicators from those pieces, and
//! [`Catalog`] exposes them by name. Every indicator returns one value per
//! input bar and validates its parameters when constructed.

pub mod adaptive;
pub mod cache;
pub mod catalog;
pub mod filters;
pub mod kernels;
pub mod momentum;
pub mod moving_average;
pub mod simd;
pub mod smoothers;
pub mod stops;
pub mod volatility;
pub mod window;

pub use adaptive::{AdaptiveRule, ER_EPSILON};
pub use cache::{CacheStats, MemoCache};
pub use catalog::{Catalog, HandlerInfo};
pub use filters::{CascadeKind, LinearFilter};
pub use kernels::Kernel;
pub use momentum::{Cmo, LaguerreRsi, Macd, MacdOutput, RankNormalizer, Rsi, StochasticK};
pub use moving_average::{
    CascadeMa, Ema, Frama, Kama, MaMethod, MovingAverage, MovingMedian, Sma, Smma, Vidya,
    VolatilityAdaptiveMa, VolatilityMeasure, WeightedMa,
};
pub use smoothers::{KalmanSmoother, LaguerreFilter, PoleDesign, PoleFilter};
pub use stops::{first_trigger, AtrTrailingStop, BreakevenStop, StopHandler, TrailingPercentStop};
pub use volatility::{
    Atr, BollingerBands, BollingerOutput, ChannelLine, DonchianChannel, DonchianOutput, StdDev,
    TrueRange,
};
pub use window::Window;
