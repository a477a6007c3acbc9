//! Mock exchange REST and analysis endpoints.
//!
//! - `GET /api/v3/ticker/price?symbol=` answers ETHUSDT and BTCUSDT, 503 for
//!   DOWNUSDT, 400 for anything else
//! - `POST /analyze` echoes the request into a two-timeframe prediction

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Default)]
pub struct CallCounts {
    pub ticker: AtomicUsize,
    pub analyze: AtomicUsize,
}

pub struct MockHttp {
    addr: SocketAddr,
    pub calls: Arc<CallCounts>,
}

impl MockHttp {
    pub async fn start() -> Self {
        let calls = Arc::new(CallCounts::default());
        let router = Router::new()
            .route("/api/v3/ticker/price", get(ticker_price))
            .route("/analyze", post(analyze))
            .with_state(calls.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, calls }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn analysis_url(&self) -> String {
        format!("http://{}/analyze", self.addr)
    }

    pub fn ticker_calls(&self) -> usize {
        self.calls.ticker.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.calls.analyze.load(Ordering::SeqCst)
    }
}

async fn ticker_price(
    State(calls): State<Arc<CallCounts>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    calls.ticker.fetch_add(1, Ordering::SeqCst);
    let symbol = params.get("symbol").cloned().unwrap_or_default();
    let price = match symbol.as_str() {
        "ETHUSDT" => "3000.00",
        "BTCUSDT" => "49999.00",
        "DOWNUSDT" => {
            return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"code": -1121, "msg": "Invalid symbol."})),
            )
                .into_response();
        }
    };
    Json(json!({"symbol": symbol, "price": price})).into_response()
}

async fn analyze(State(calls): State<Arc<CallCounts>>, Json(body): Json<Value>) -> Json<Value> {
    calls.analyze.fetch_add(1, Ordering::SeqCst);
    let symbol = body["symbol"].clone();
    let price = body["currentPrice"].clone();
    Json(json!({
        "symbol": symbol,
        "currentPrice": price,
        "predictions": [
            {"timeframe": "1h", "predictedPrice": price, "confidence": 70, "trend": "bullish"},
            {"timeframe": "24h", "predictedPrice": price, "confidence": 50, "trend": "neutral"}
        ],
        "supportLevels": [],
        "resistanceLevels": [],
        "overallConfidence": 60,
        "analysis": {"summary": "mock", "keyFactors": [], "risks": []}
    }))
}
