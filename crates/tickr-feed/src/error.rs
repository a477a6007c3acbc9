//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Frame is not valid JSON or not a JSON object.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Frame is well-formed but a field fails validation.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Payload shape does not match the event it claims to be.
    #[error("Payload mismatch: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
