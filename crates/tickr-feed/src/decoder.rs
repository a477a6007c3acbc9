//! Frame decoding for the exchange stream.
//!
//! Accepted frame shapes:
//! 1. Subscription ack: `{"result": null, "id": 1}`
//! 2. Subscription error: `{"error": {"code": 2, "msg": "..."}, "id": 1}`
//! 3. Combined stream: `{"stream": "btcusdt@ticker", "data": {"e": "24hrTicker", ...}}`
//! 4. Bare event: `{"e": "24hrTicker", ...}`
//!
//! Event payloads are dispatched on their `"e"` tag. Unknown tags decode to
//! `FeedEvent::Unknown`; anything that is not a JSON object, or an event
//! whose fields do not match its tag, is a `FeedError`.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tickr_core::{Price, PriceRecord, Symbol};
use tickr_telemetry::Metrics;
use tracing::{debug, trace};

/// Per-kind frame counters.
#[derive(Debug, Default)]
pub struct DecodeStats {
    tickers: AtomicU64,
    trades: AtomicU64,
    acks: AtomicU64,
    rejected: AtomicU64,
    unknown: AtomicU64,
    malformed: AtomicU64,
}

impl DecodeStats {
    fn record(&self, kind: &'static str) {
        let counter = match kind {
            "ticker" => &self.tickers,
            "trade" => &self.trades,
            "ack" => &self.acks,
            "rejected" => &self.rejected,
            "unknown" => &self.unknown,
            _ => &self.malformed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Metrics::feed_frame(kind);
    }

    pub fn tickers(&self) -> u64 {
        self.tickers.load(Ordering::Relaxed)
    }

    pub fn trades(&self) -> u64 {
        self.trades.load(Ordering::Relaxed)
    }

    pub fn acks(&self) -> u64 {
        self.acks.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn unknown(&self) -> u64 {
        self.unknown.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }
}

/// 24h rolling ticker snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerUpdate {
    pub symbol: Symbol,
    pub last_price: Price,
    pub volume: Option<Decimal>,
    pub change_24h_pct: Option<Decimal>,
    /// Exchange-side event time, if present.
    pub event_time: Option<DateTime<Utc>>,
}

impl TickerUpdate {
    /// Build the store record. `observed_at` is the local receive time so
    /// freshness is measured against our clock, not the exchange's.
    pub fn into_record(self, observed_at: DateTime<Utc>) -> PriceRecord {
        PriceRecord::new(self.symbol, self.last_price, observed_at)
            .with_stats(self.volume, self.change_24h_pct)
    }
}

/// Individual trade print.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeUpdate {
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Decimal,
    pub trade_time: Option<DateTime<Utc>>,
}

/// Decoded stream frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Subscription acknowledged.
    Ack { id: Option<u64> },
    /// Subscription request rejected by the exchange.
    Rejected { id: Option<u64>, reason: String },
    Ticker(TickerUpdate),
    Trade(TradeUpdate),
    /// Well-formed event of a type we do not consume.
    Unknown { event_type: String },
}

impl FeedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::Ack { .. } => "ack",
            FeedEvent::Rejected { .. } => "rejected",
            FeedEvent::Ticker(_) => "ticker",
            FeedEvent::Trade(_) => "trade",
            FeedEvent::Unknown { .. } => "unknown",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
enum RawEvent {
    #[serde(rename = "24hrTicker")]
    Ticker(RawTicker),
    #[serde(rename = "trade")]
    Trade(RawTrade),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    #[serde(rename = "s")]
    symbol: Symbol,
    #[serde(rename = "c")]
    last_price: Price,
    #[serde(rename = "v", default, with = "rust_decimal::serde::str_option")]
    volume: Option<Decimal>,
    #[serde(rename = "P", default, with = "rust_decimal::serde::str_option")]
    change_pct: Option<Decimal>,
    #[serde(rename = "E", default)]
    event_time_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    #[serde(rename = "s")]
    symbol: Symbol,
    #[serde(rename = "p")]
    price: Price,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    quantity: Decimal,
    #[serde(rename = "T", default)]
    trade_time_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

/// Stateless apart from its counters; share it behind an `Arc` if needed.
#[derive(Debug, Default)]
pub struct FeedDecoder {
    stats: DecodeStats,
}

impl FeedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Decode one text frame.
    pub fn decode(&self, text: &str) -> FeedResult<FeedEvent> {
        let result = self.decode_inner(text);
        match &result {
            Ok(event) => {
                trace!(kind = event.kind(), "Decoded frame");
                self.stats.record(event.kind());
            }
            Err(e) => {
                debug!(error = %e, "Frame decode failed");
                self.stats.record("malformed");
            }
        }
        result
    }

    fn decode_inner(&self, text: &str) -> FeedResult<FeedEvent> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| FeedError::Decode(format!("not JSON: {e}")))?;
        let Value::Object(mut frame) = value else {
            return Err(FeedError::Decode("frame is not a JSON object".to_string()));
        };

        let id = frame.get("id").and_then(Value::as_u64);

        if let Some(raw) = frame.remove("error") {
            let err: RawError = serde_json::from_value(raw)?;
            let reason = match (err.code, err.msg) {
                (Some(code), Some(msg)) => format!("{code}: {msg}"),
                (None, Some(msg)) => msg,
                (Some(code), None) => format!("code {code}"),
                (None, None) => "unspecified".to_string(),
            };
            return Ok(FeedEvent::Rejected { id, reason });
        }

        if frame.contains_key("result") {
            return Ok(FeedEvent::Ack { id });
        }

        let payload = match (frame.remove("stream"), frame.remove("data")) {
            (Some(_), Some(data)) => data,
            (None, None) => Value::Object(frame),
            _ => {
                return Err(FeedError::Decode(
                    "combined frame needs both stream and data".to_string(),
                ))
            }
        };

        decode_event(payload)
    }
}

fn decode_event(payload: Value) -> FeedResult<FeedEvent> {
    let Some(event_type) = payload.get("e").and_then(Value::as_str).map(str::to_string) else {
        return Err(FeedError::Decode("event has no \"e\" tag".to_string()));
    };

    match serde_json::from_value::<RawEvent>(payload)? {
        RawEvent::Ticker(raw) => {
            check_price(&raw.last_price, &raw.symbol)?;
            Ok(FeedEvent::Ticker(TickerUpdate {
                symbol: raw.symbol,
                last_price: raw.last_price,
                volume: raw.volume,
                change_24h_pct: raw.change_pct,
                event_time: raw.event_time_ms.and_then(DateTime::from_timestamp_millis),
            }))
        }
        RawEvent::Trade(raw) => {
            check_price(&raw.price, &raw.symbol)?;
            Ok(FeedEvent::Trade(TradeUpdate {
                symbol: raw.symbol,
                price: raw.price,
                quantity: raw.quantity,
                trade_time: raw.trade_time_ms.and_then(DateTime::from_timestamp_millis),
            }))
        }
        RawEvent::Other => Ok(FeedEvent::Unknown { event_type }),
    }
}

fn check_price(price: &Price, symbol: &Symbol) -> FeedResult<()> {
    if price.inner().is_sign_negative() {
        return Err(FeedError::InvalidData(format!(
            "negative price {price} for {symbol}"
        )));
    }
    Ok(())
}
