//! Core types and traits for the series-computation core.
//!
//! This crate provides the foundational building blocks including:
//! - Bar data (`Bar`, `Bars`) and price selection (`PriceSource`)
//! - The immutable, index-aligned `Series` buffer and its `SourceId`
//! - A read-only position accessor for trade-management handlers
//! - Core traits for indicators, handlers and the memoization cache

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BarwiseError, BarwiseResult, DataError, IndicatorError};
pub use traits::*;
pub use types::*;
