//! Core domain types for the tickr price and prediction cache.
//!
//! This crate provides the records shared by every other crate:
//! - `Symbol`: Case-normalized cache key
//! - `Price`: Exact decimal price, never stored as a float
//! - `PriceRecord`: Latest price snapshot for one symbol
//! - `PredictionRecord`: Immutable multi-timeframe analysis for one symbol

pub mod decimal;
pub mod error;
pub mod prediction;
pub mod types;

pub use decimal::Price;
pub use error::{CoreError, Result};
pub use prediction::{
    Analysis, Confidence, PredictionDraft, PredictionRecord, TimeframePrediction, Trend,
};
pub use types::{PriceRecord, Symbol};
