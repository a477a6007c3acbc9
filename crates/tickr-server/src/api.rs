//! HTTP read API using axum.

use crate::service::{FeedStatus, PriceService};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tickr_core::{PredictionRecord, PriceRecord};
use tickr_rest::FetchError;
use tickr_telemetry::Metrics;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Error body: `{"error": "...", "symbol": "..."}`.
///
/// `InvalidSymbol` is the caller's fault (400); `FetchFailed` means nothing
/// was cached and the upstream could not be reached (502).
pub struct ApiError(FetchError);

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            FetchError::InvalidSymbol(symbol) => {
                debug!(%symbol, "Rejected invalid symbol");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid symbol", "symbol": symbol})),
                )
                    .into_response()
            }
            FetchError::FetchFailed(reason) => {
                error!(%reason, "Upstream fetch failed with nothing cached");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": "upstream unavailable", "detail": reason})),
                )
                    .into_response()
            }
        }
    }
}

/// Create the axum router.
pub fn create_router(service: Arc<PriceService>) -> Router {
    Router::new()
        .route("/prices", get(get_all_prices))
        .route("/prices/{symbol}", get(get_price))
        .route("/predictions/{symbol}", get(get_prediction))
        .route("/status", get(get_status))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn get_price(
    State(service): State<Arc<PriceService>>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceRecord>, ApiError> {
    Ok(Json(service.get(&symbol).await?))
}

async fn get_all_prices(State(service): State<Arc<PriceService>>) -> Json<Vec<PriceRecord>> {
    Json(service.get_all())
}

async fn get_status(State(service): State<Arc<PriceService>>) -> Json<FeedStatus> {
    Json(service.status())
}

async fn get_prediction(
    State(service): State<Arc<PriceService>>,
    Path(symbol): Path<String>,
) -> Result<Json<PredictionRecord>, ApiError> {
    Ok(Json(service.prediction(&symbol).await?))
}

async fn get_metrics() -> Response {
    match Metrics::encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
