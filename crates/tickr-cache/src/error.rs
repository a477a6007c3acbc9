//! Cache error types.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid freshness policy: aging threshold {aging_after:?} must be below ttl {ttl:?}")]
    InvalidPolicy { aging_after: Duration, ttl: Duration },
}

pub type CacheResult<T> = Result<T, CacheError>;
