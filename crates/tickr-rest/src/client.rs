//! Exchange REST client for the ticker-price fallback.
//!
//! Used when the live store has nothing servable for a symbol (synchronous
//! path) and when an aging entry is refreshed in the background.

use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tickr_cache::{Clock, RecordSource};
use tickr_core::{Price, PriceRecord, Symbol};
use tracing::{debug, warn};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TICKER_PRICE_PATH: &str = "/api/v3/ticker/price";

/// Response of `GET /api/v3/ticker/price?symbol=...`.
#[derive(Debug, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    /// Decimal string, parsed without loss.
    pub price: String,
}

/// Client for the exchange's ticker-price endpoint.
pub struct RemoteFetcher {
    client: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl RemoteFetcher {
    /// Create a new fetcher.
    ///
    /// # Arguments
    /// * `base_url` - REST root (e.g., "https://api.binance.com")
    /// * `timeout` - per-request timeout; bounds the synchronous read path
    /// * `clock` - stamps `observed_at` on fetched records
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::FetchFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            clock,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the latest trade price for `symbol`.
    ///
    /// A 4xx (other than 408/429) is `InvalidSymbol`; every other failure,
    /// including an unparseable body, is `FetchFailed`.
    pub async fn fetch_price(&self, symbol: &Symbol) -> FetchResult<PriceRecord> {
        let url = format!("{}{}", self.base_url, TICKER_PRICE_PATH);
        debug!(symbol = %symbol, url = %url, "Fetching ticker price");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = FetchError::from_status(symbol.as_str(), status, &body);
            warn!(symbol = %symbol, %status, error = %err, "Ticker price request rejected");
            return Err(err);
        }

        let body: TickerPriceResponse = response
            .json()
            .await
            .map_err(|e| FetchError::FetchFailed(format!("Failed to parse response: {e}")))?;

        if !body.symbol.eq_ignore_ascii_case(symbol.as_str()) {
            return Err(FetchError::FetchFailed(format!(
                "response for {} does not match requested {symbol}",
                body.symbol
            )));
        }

        let price = Price::parse(&body.price)
            .map_err(|e| FetchError::FetchFailed(format!("Invalid price in response: {e}")))?;

        Ok(PriceRecord::new(symbol.clone(), price, self.clock.now()))
    }
}

#[async_trait]
impl RecordSource for RemoteFetcher {
    type Record = PriceRecord;
    type Error = FetchError;

    async fn fetch(&self, symbol: &Symbol) -> Result<PriceRecord, FetchError> {
        self.fetch_price(symbol).await
    }
}
