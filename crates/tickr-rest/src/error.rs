//! Remote fetch error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Outcome classes of a remote call.
///
/// `InvalidSymbol` is user-facing: the remote side rejected the symbol itself.
/// Everything else (network, timeout, 5xx, throttling, bad body) is
/// `FetchFailed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

impl FetchError {
    /// Classify a non-success HTTP status.
    ///
    /// Client errors mean the request itself was wrong, which for a
    /// single-parameter lookup means the symbol. 408 and 429 are transient.
    pub fn from_status(symbol: &str, status: StatusCode, body: &str) -> Self {
        if status.is_client_error()
            && status != StatusCode::REQUEST_TIMEOUT
            && status != StatusCode::TOO_MANY_REQUESTS
        {
            FetchError::InvalidSymbol(symbol.to_string())
        } else {
            FetchError::FetchFailed(format!("HTTP {status}: {body}"))
        }
    }

    pub fn is_invalid_symbol(&self) -> bool {
        matches!(self, FetchError::InvalidSymbol(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::FetchFailed(format!("request timed out: {e}"))
        } else {
            FetchError::FetchFailed(format!("HTTP request failed: {e}"))
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let cases = [
            (StatusCode::BAD_REQUEST, true),
            (StatusCode::NOT_FOUND, true),
            (StatusCode::REQUEST_TIMEOUT, false),
            (StatusCode::TOO_MANY_REQUESTS, false),
            (StatusCode::INTERNAL_SERVER_ERROR, false),
            (StatusCode::SERVICE_UNAVAILABLE, false),
        ];
        for (status, invalid) in cases {
            let err = FetchError::from_status("BADSYMBOL", status, "");
            assert_eq!(err.is_invalid_symbol(), invalid, "status {status}");
        }
    }
}
