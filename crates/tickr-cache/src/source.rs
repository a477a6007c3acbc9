//! Remote record sources.

use async_trait::async_trait;
use tickr_core::Symbol;

/// Point-in-time fetch of one record from outside the cache.
///
/// Implemented by the exchange REST client (prices) and by the generative
/// analysis call (predictions). Used both for synchronous cache-miss
/// fallback and for background refresh.
#[async_trait]
pub trait RecordSource: Send + Sync + 'static {
    type Record: Clone + Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, symbol: &Symbol) -> Result<Self::Record, Self::Error>;
}
