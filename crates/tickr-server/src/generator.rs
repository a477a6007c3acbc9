//! Prediction source: current price from the live cache, analysis from the
//! generative endpoint.

use crate::service::LivePriceCache;
use async_trait::async_trait;
use std::sync::Arc;
use tickr_cache::RecordSource;
use tickr_core::{PredictionRecord, Symbol};
use tickr_rest::{AnalysisClient, FetchError};
use tracing::debug;

/// Generates a prediction anchored at the symbol's current price.
///
/// An unknown symbol fails at the price lookup, before any generative call
/// is made.
pub struct AnalysisGenerator {
    prices: Arc<LivePriceCache>,
    client: AnalysisClient,
}

impl AnalysisGenerator {
    pub fn new(prices: Arc<LivePriceCache>, client: AnalysisClient) -> Self {
        Self { prices, client }
    }
}

#[async_trait]
impl RecordSource for AnalysisGenerator {
    type Record = PredictionRecord;
    type Error = FetchError;

    async fn fetch(&self, symbol: &Symbol) -> Result<PredictionRecord, FetchError> {
        let current = self.prices.get(symbol).await?;
        debug!(symbol = %symbol, price = %current.price, "Generating prediction");
        self.client.analyze(symbol, current.price).await
    }
}
