//! Core traits for barwise.

mod cache;
mod indicator;

pub use cache::{CacheKey, NoCache, SeriesCache};
pub use indicator::{
    price_series, BarHandler, BarIndicator, Handler, Indicator, MultiOutputIndicator,
    NamedOutputs, OutputHandler, SeriesHandler,
};
