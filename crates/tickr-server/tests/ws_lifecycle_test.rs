//! Stream connection lifecycle integration tests.
//!
//! Tests the connection lifecycle:
//! - Connection establishment and subscribe message
//! - Ticker frames landing in the store, bad frames dropped
//! - Reconnect after a server-side close
//! - Explicit disconnect

mod integration;
use integration::common::mock_ws::{ticker_frame, MockExchange};

use std::sync::Arc;
use std::time::Duration;
use tickr_cache::{FreshnessPolicy, KeyedTtlStore, PriceStore, SystemClock};
use tickr_core::Symbol;
use tickr_ws::{ConnectionConfig, ConnectionState, ReconnectPolicy, StreamConnection, StreamTarget};
use tokio::time::timeout;
use tokio_test::assert_ok;

fn price_store() -> Arc<PriceStore> {
    Arc::new(KeyedTtlStore::new(
        "prices",
        FreshnessPolicy::PRICES,
        Arc::new(SystemClock),
    ))
}

fn connection(url: String, delay_ms: u64, store: Arc<PriceStore>) -> Arc<StreamConnection> {
    let config = ConnectionConfig {
        url,
        targets: vec![
            StreamTarget::ticker(Symbol::new("BTCUSDT").unwrap()),
            StreamTarget::ticker(Symbol::new("ETHUSDT").unwrap()),
        ],
        reconnect: ReconnectPolicy::Fixed { delay_ms },
        idle_timeout: Duration::from_secs(60),
    };
    Arc::new(StreamConnection::new(config, store, Arc::new(SystemClock)))
}

async fn wait_until<F: Fn() -> bool>(what: &str, check: F) {
    timeout(Duration::from_secs(3), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

async fn wait_for_connections(server: &MockExchange, n: u32) {
    timeout(Duration::from_secs(3), async {
        while server.connection_count().await < n {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {n} connections"));
}

#[tokio::test]
async fn test_connects_and_subscribes() {
    let server = MockExchange::start().await;
    let conn = connection(server.url(), 5_000, price_store());

    let runner = conn.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    wait_until("connected", || conn.is_connected()).await;

    let received = timeout(Duration::from_secs(2), async {
        loop {
            let messages = server.received_messages().await;
            if !messages.is_empty() {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("subscribe should arrive");

    assert_eq!(
        received[0],
        r#"{"method":"SUBSCRIBE","params":["btcusdt@ticker","ethusdt@ticker"],"id":1}"#
    );

    conn.disconnect();
    assert_ok!(handle.await);
    server.shutdown().await;
}

#[tokio::test]
async fn test_ticker_frames_reach_store_and_bad_frames_are_dropped() {
    let server = MockExchange::start().await;
    let store = price_store();
    let conn = connection(server.url(), 5_000, store.clone());

    let runner = conn.clone();
    let handle = tokio::spawn(async move { runner.run().await });
    wait_until("connected", || conn.is_connected()).await;
    wait_until("ack", || conn.decode_stats().acks() == 1).await;

    server.push_text("not json");
    server.push_text(ticker_frame("BTCUSDT", "50000.01"));

    let btc = Symbol::new("BTCUSDT").unwrap();
    wait_until("ticker stored", || store.count() == 1).await;

    let record = store.get(&btc).into_value().unwrap();
    assert_eq!(record.price.to_string(), "50000.01");
    assert_eq!(conn.decode_stats().malformed(), 1);
    assert!(conn.is_connected(), "bad frame must not drop the connection");
    assert_eq!(conn.reconnect_count(), 0);

    conn.disconnect();
    assert_ok!(handle.await);
    server.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_once_after_server_close() {
    let server = MockExchange::start().await;
    let conn = connection(server.url(), 300, price_store());

    let runner = conn.clone();
    let handle = tokio::spawn(async move { runner.run().await });
    wait_for_connections(&server, 1).await;
    wait_until("connected", || conn.is_connected()).await;

    server.close_all();
    wait_until("disconnected", || !conn.is_connected()).await;

    // Still inside the reconnect delay.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.connection_count().await, 1);
    assert_ne!(conn.state(), ConnectionState::Connected);

    wait_for_connections(&server, 2).await;
    wait_until("reconnected", || conn.is_connected()).await;
    assert_eq!(conn.reconnect_count(), 1);

    // Subscription is restored on the new connection.
    timeout(Duration::from_secs(2), async {
        while server.received_messages().await.len() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("second subscribe should arrive");

    conn.disconnect();
    assert_ok!(handle.await);
    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_stops_reconnecting() {
    let server = MockExchange::start().await;
    let conn = connection(server.url(), 50, price_store());

    let runner = conn.clone();
    let handle = tokio::spawn(async move { runner.run().await });
    wait_until("connected", || conn.is_connected()).await;

    conn.disconnect();
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("run loop should exit after disconnect")
        .unwrap();

    assert_eq!(conn.state(), ConnectionState::Disconnected);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connection_count().await, 1);
    assert_eq!(conn.reconnect_count(), 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_keeps_retrying() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let conn = connection(format!("ws://{addr}"), 100, price_store());
    let runner = conn.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    // Refused connects fail instantly, so the 100ms delay bounds the rate:
    // at most one attempt per delay, plus the first.
    tokio::time::sleep(Duration::from_millis(600)).await;
    let attempts = conn.reconnect_count();
    assert!(attempts >= 2, "should keep retrying, got {attempts}");
    assert!(attempts <= 8, "retry delay not honoured, got {attempts}");
    assert!(!conn.is_connected());

    conn.disconnect();
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("run loop should exit after disconnect")
        .unwrap();
}
