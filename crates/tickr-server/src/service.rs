//! Read API over the live price and prediction caches.

use crate::generator::AnalysisGenerator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tickr_cache::{PredictionCache, PriceCache};
use tickr_core::{PredictionRecord, PriceRecord, Symbol};
use tickr_rest::{FetchError, FetchResult, RemoteFetcher};
use tickr_ws::StreamConnection;

/// Live prices: stream-fed store with REST fallback.
pub type LivePriceCache = PriceCache<RemoteFetcher>;

/// Predictions: generative source over the live prices.
pub type LivePredictionCache = PredictionCache<AnalysisGenerator>;

/// Feed health snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatus {
    pub connected: bool,
    pub state: &'static str,
    /// Most recent write into the price store, from any source.
    pub last_update: Option<DateTime<Utc>>,
    pub cached_symbols: usize,
    pub reconnects: u64,
}

pub struct PriceService {
    prices: Arc<LivePriceCache>,
    predictions: Arc<LivePredictionCache>,
    connection: Arc<StreamConnection>,
}

impl PriceService {
    pub fn new(
        prices: Arc<LivePriceCache>,
        predictions: Arc<LivePredictionCache>,
        connection: Arc<StreamConnection>,
    ) -> Self {
        Self {
            prices,
            predictions,
            connection,
        }
    }

    /// Current price for a raw, user-supplied symbol.
    ///
    /// Served from the store when fresh or aging; otherwise fetched over
    /// REST. Malformed input is reported as `InvalidSymbol` without a
    /// remote call.
    pub async fn get(&self, raw_symbol: &str) -> FetchResult<PriceRecord> {
        let symbol = parse_symbol(raw_symbol)?;
        self.prices.get(&symbol).await
    }

    /// Every non-expired price, sorted by symbol.
    pub fn get_all(&self) -> Vec<PriceRecord> {
        self.prices.get_all()
    }

    pub fn status(&self) -> FeedStatus {
        FeedStatus {
            connected: self.connection.is_connected(),
            state: self.connection.state().as_str(),
            last_update: self.prices.last_update(),
            cached_symbols: self.prices.store().count(),
            reconnects: self.connection.reconnect_count(),
        }
    }

    /// Prediction for a raw symbol. Blocks on generation only when nothing
    /// servable is cached.
    pub async fn prediction(&self, raw_symbol: &str) -> FetchResult<PredictionRecord> {
        let symbol = parse_symbol(raw_symbol)?;
        self.predictions.get(&symbol).await
    }
}

fn parse_symbol(raw: &str) -> FetchResult<Symbol> {
    Symbol::new(raw).map_err(|_| FetchError::InvalidSymbol(raw.to_string()))
}
