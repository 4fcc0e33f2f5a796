//! Core data types.

mod bar;
mod position;
mod series;

pub use bar::{Bar, Bars, PriceSource};
pub use position::{OpenPosition, PositionView};
pub use series::{Series, SourceId};
