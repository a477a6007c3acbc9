//! Generative analysis endpoint client.
//!
//! The analysis service takes a symbol and its current price and answers
//! with a full prediction document. This client only moves the request and
//! validates the answer; prompt construction lives behind the endpoint.

use crate::error::{FetchError, FetchResult};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tickr_cache::Clock;
use tickr_core::{Price, PredictionDraft, PredictionRecord, Symbol};
use tracing::{debug, info, warn};

/// Request body sent to the analysis endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest<'a> {
    pub symbol: &'a str,
    pub current_price: Price,
}

pub struct AnalysisClient {
    client: Client,
    url: String,
    clock: Arc<dyn Clock>,
}

impl AnalysisClient {
    pub fn new(url: impl Into<String>, timeout: Duration, clock: Arc<dyn Clock>) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::FetchFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            clock,
        })
    }

    /// Request a prediction for `symbol` anchored at `current_price`.
    ///
    /// The response must satisfy the record invariants (non-empty
    /// predictions, confidences within 0..=100); otherwise the call fails
    /// as `FetchFailed` and nothing is cached. The record is stamped with
    /// this client's clock; a `generatedAt` in the response is kept only as
    /// `reported_at`.
    pub async fn analyze(&self, symbol: &Symbol, current_price: Price) -> FetchResult<PredictionRecord> {
        info!(symbol = %symbol, %current_price, "Requesting analysis");

        let request = AnalysisRequest {
            symbol: symbol.as_str(),
            current_price,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = FetchError::from_status(symbol.as_str(), status, &body);
            warn!(symbol = %symbol, %status, error = %err, "Analysis request rejected");
            return Err(err);
        }

        let draft: PredictionDraft = response
            .json()
            .await
            .map_err(|e| FetchError::FetchFailed(format!("Failed to parse analysis: {e}")))?;

        let record = PredictionRecord::from_draft(draft, self.clock.now())
            .map_err(|e| FetchError::FetchFailed(format!("Invalid analysis: {e}")))?;

        if record.symbol() != symbol {
            return Err(FetchError::FetchFailed(format!(
                "analysis for {} does not match requested {symbol}",
                record.symbol()
            )));
        }

        debug!(
            symbol = %symbol,
            timeframes = record.predictions().len(),
            confidence = record.overall_confidence().value(),
            "Analysis received"
        );
        Ok(record)
    }
}
