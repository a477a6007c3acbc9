//! Error types for tickr-core.

use thiserror::Error;

/// Validation failures for prices, symbols and prediction records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Empty after trimming, or contains non-alphanumeric characters.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Confidence out of range (0-100): {0}")]
    ConfidenceOutOfRange(i64),

    #[error("Prediction has no timeframes")]
    EmptyPredictions,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
