//! Prometheus metrics for tickr.
//!
//! Covers:
//! - Cache lookups by freshness class
//! - Background refresh outcomes
//! - Store sizes and sweep evictions
//! - Feed frames and WebSocket connection state
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! (duplicate metric name) is a startup configuration error and only happens
//! during static initialization, never at runtime.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, register_int_gauge_vec,
    CounterVec, Encoder, Gauge, HistogramVec, IntGaugeVec, TextEncoder,
};

/// Cache lookups by result.
/// Labels: cache (prices/predictions), freshness (fresh/aging/expired/miss)
pub static CACHE_LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickr_cache_lookups_total",
        "Total cache lookups by freshness class",
        &["cache", "freshness"]
    )
    .unwrap()
});

/// Background refresh outcomes.
/// Labels: cache, outcome (launched/deduplicated/succeeded/failed)
pub static CACHE_REFRESH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickr_cache_refresh_total",
        "Background refresh attempts by outcome",
        &["cache", "outcome"]
    )
    .unwrap()
});

/// Remote fetch latency in milliseconds.
/// Labels: cache, path (sync/refresh)
pub static CACHE_FETCH_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tickr_cache_fetch_latency_ms",
        "Remote fetch latency in milliseconds",
        &["cache", "path"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 30000.0]
    )
    .unwrap()
});

/// Current entry count per store.
pub static CACHE_ENTRIES: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "tickr_cache_entries",
        "Current number of entries per store",
        &["cache"]
    )
    .unwrap()
});

/// Entries removed by the TTL sweep.
pub static CACHE_SWEEP_EVICTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickr_cache_sweep_evicted_total",
        "Entries evicted by TTL sweep",
        &["cache"]
    )
    .unwrap()
});

/// Feed frames by decoded kind.
/// Labels: kind (ticker/trade/ack/rejected/unknown/malformed)
pub static FEED_FRAMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickr_feed_frames_total",
        "Feed frames received by decoded kind",
        &["kind"]
    )
    .unwrap()
});

/// WebSocket connection state (1 = connected, 0 = disconnected).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "tickr_ws_connected",
        "WebSocket connection state (1=connected)"
    )
    .unwrap()
});

/// Total WebSocket reconnection attempts.
pub static WS_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickr_ws_reconnect_total",
        "Total WebSocket reconnection attempts",
        &["reason"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a cache lookup.
    pub fn cache_lookup(cache: &str, freshness: &str) {
        CACHE_LOOKUPS_TOTAL
            .with_label_values(&[cache, freshness])
            .inc();
    }

    /// Record a background refresh outcome.
    pub fn cache_refresh(cache: &str, outcome: &str) {
        CACHE_REFRESH_TOTAL
            .with_label_values(&[cache, outcome])
            .inc();
    }

    /// Record remote fetch latency.
    pub fn fetch_latency(cache: &str, path: &str, latency_ms: f64) {
        CACHE_FETCH_LATENCY_MS
            .with_label_values(&[cache, path])
            .observe(latency_ms);
    }

    /// Update store size.
    pub fn cache_entries(cache: &str, count: usize) {
        CACHE_ENTRIES
            .with_label_values(&[cache])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record sweep evictions.
    pub fn sweep_evicted(cache: &str, count: usize) {
        CACHE_SWEEP_EVICTED_TOTAL
            .with_label_values(&[cache])
            .inc_by(count as f64);
    }

    /// Record a received feed frame.
    pub fn feed_frame(kind: &str) {
        FEED_FRAMES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record WebSocket connected.
    pub fn ws_connected() {
        WS_CONNECTED.set(1.0);
    }

    /// Record WebSocket disconnected.
    pub fn ws_disconnected() {
        WS_CONNECTED.set(0.0);
    }

    /// Record WebSocket reconnection.
    pub fn ws_reconnect(reason: &str) {
        WS_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn encode() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
