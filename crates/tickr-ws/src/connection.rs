//! Exchange stream connection.
//!
//! Owns the socket lifecycle: connect, subscribe, receive, and reconnect
//! after a policy-driven delay, looping until `disconnect()` is called.
//! Every decoded ticker is written straight into the price store.

use crate::error::{WsError, WsResult};
use crate::heartbeat::IdleMonitor;
use crate::message::{StreamRequest, StreamTarget};
use crate::reconnect::ReconnectPolicy;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickr_cache::{Clock, PriceStore};
use tickr_core::Symbol;
use tickr_feed::{DecodeStats, FeedDecoder, FeedEvent};
use tickr_telemetry::Metrics;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Combined-stream endpoint.
    pub url: String,
    /// Streams subscribed on every (re)connect.
    pub targets: Vec<StreamTarget>,
    pub reconnect: ReconnectPolicy,
    /// Silence longer than this forces a reconnect.
    pub idle_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "wss://stream.binance.com:9443/stream".to_string(),
            targets: Vec::new(),
            reconnect: ReconnectPolicy::default(),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Connection state.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected`, then back to
/// `Connecting` after the reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Long-lived stream connection feeding the price store.
pub struct StreamConnection {
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    store: Arc<PriceStore>,
    clock: Arc<dyn Clock>,
    decoder: FeedDecoder,
    idle: IdleMonitor,
    /// Consecutive failed attempts since the last successful connect.
    attempt: AtomicU32,
    /// Reconnects scheduled over the connection's lifetime.
    reconnects: AtomicU64,
    next_request_id: AtomicU64,
    shutdown_token: CancellationToken,
}

impl StreamConnection {
    pub fn new(config: ConnectionConfig, store: Arc<PriceStore>, clock: Arc<dyn Clock>) -> Self {
        let idle = IdleMonitor::new(config.idle_timeout);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            store,
            clock,
            decoder: FeedDecoder::new(),
            idle,
            attempt: AtomicU32::new(0),
            reconnects: AtomicU64::new(0),
            next_request_id: AtomicU64::new(1),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Tie the connection to an external shutdown token (e.g. a child of the
    /// process root token).
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    pub fn decode_stats(&self) -> &DecodeStats {
        self.decoder.stats()
    }

    /// Stop the loop and close the socket. Idempotent.
    pub fn disconnect(&self) {
        info!("Stream disconnect requested");
        self.shutdown_token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect and keep reconnecting until `disconnect()`.
    ///
    /// Connection errors never escape: they are logged, counted and followed
    /// by a reconnect after the policy delay.
    pub async fn run(&self) {
        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting stream loop");
                self.set_state(ConnectionState::Disconnected);
                return;
            }

            self.set_state(ConnectionState::Connecting);
            let result = self.session().await;

            if self.set_state(ConnectionState::Disconnected) == ConnectionState::Connected {
                Metrics::ws_disconnected();
            }

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                return;
            }

            let reason = match &result {
                Ok(()) => {
                    info!("Stream connection closed");
                    "closed"
                }
                Err(e) => {
                    error!(error = %e, "Stream connection error");
                    e.reason()
                }
            };

            let attempt = self.attempt.fetch_add(1, Ordering::Relaxed) + 1;
            self.reconnects.fetch_add(1, Ordering::Relaxed);
            Metrics::ws_reconnect(reason);

            let delay = self.config.reconnect.delay(attempt);
            warn!(attempt, reason, delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during reconnect delay, exiting");
                    return;
                }
            }
        }
    }

    /// One connection session: connect, subscribe, receive until it ends.
    async fn session(&self) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to stream");

        let connect = connect_async_tls_with_config(&self.config.url, None, true, None);
        let (ws_stream, _response) = tokio::select! {
            result = connect => result.map_err(|e| WsError::ConnectionFailed(e.to_string()))?,
            () = self.shutdown_token.cancelled() => return Ok(()),
        };
        let (mut write, mut read) = ws_stream.split();

        self.set_state(ConnectionState::Connected);
        self.attempt.store(0, Ordering::Relaxed);
        Metrics::ws_connected();
        info!("Stream connected");

        self.subscribe(&mut write).await?;
        self.idle.reset();

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in receive loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.idle.record_frame();
                            self.handle_text(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            self.idle.record_frame();
                            trace!("Received ping, sending pong");
                            write
                                .send(Message::Pong(data))
                                .await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {
                            self.idle.record_frame();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "Stream closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => {
                            error!(?e, "Stream read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Stream ended");
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "Stream ended".to_string(),
                            });
                        }
                    }
                }

                () = self.idle.wait_for_check() => {
                    if self.idle.is_idle() {
                        warn!(
                            idle_ms = self.idle.idle_for().as_millis() as u64,
                            "No frames within idle timeout"
                        );
                        return Err(WsError::IdleTimeout(self.idle.idle_timeout()));
                    }
                }
            }
        }
    }

    async fn subscribe(&self, write: &mut WsSink) -> WsResult<()> {
        if self.config.targets.is_empty() {
            warn!("No stream targets configured, skipping subscribe");
            return Ok(());
        }

        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let request = StreamRequest::subscribe(&self.config.targets, id);
        let text = serde_json::to_string(&request)?;
        write
            .send(Message::Text(text))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))?;

        info!(id, streams = ?request.params, "Subscribe sent");
        Ok(())
    }

    /// Decode one text frame and apply it.
    ///
    /// Returns the symbol written to the store, if any. Undecodable frames
    /// are logged and dropped.
    pub fn handle_text(&self, text: &str) -> Option<Symbol> {
        match self.decoder.decode(text) {
            Ok(FeedEvent::Ticker(update)) => {
                let record = update.into_record(self.clock.now());
                let symbol = record.symbol.clone();
                trace!(symbol = %symbol, price = %record.price, "Ticker stored");
                self.store.set(&symbol, record);
                Some(symbol)
            }
            Ok(FeedEvent::Ack { id }) => {
                debug!(?id, "Subscription acknowledged");
                None
            }
            Ok(FeedEvent::Rejected { id, reason }) => {
                warn!(?id, %reason, "Subscription rejected");
                None
            }
            Ok(FeedEvent::Trade(trade)) => {
                trace!(symbol = %trade.symbol, price = %trade.price, "Trade ignored");
                None
            }
            Ok(FeedEvent::Unknown { event_type }) => {
                debug!(%event_type, "Ignoring unhandled event type");
                None
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                None
            }
        }
    }

    /// Returns the previous state.
    fn set_state(&self, next: ConnectionState) -> ConnectionState {
        let mut state = self.state.write();
        let prev = *state;
        *state = next;
        if prev != next {
            debug!(from = prev.as_str(), to = next.as_str(), "Connection state changed");
        }
        prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickr_cache::{Freshness, FreshnessPolicy, KeyedTtlStore, ManualClock};

    fn connection() -> (StreamConnection, Arc<PriceStore>, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(KeyedTtlStore::new(
            "prices",
            FreshnessPolicy::PRICES,
            Arc::new(clock.clone()),
        ));
        let conn = StreamConnection::new(
            ConnectionConfig::default(),
            store.clone(),
            Arc::new(clock.clone()),
        );
        (conn, store, clock)
    }

    #[test]
    fn test_initial_state() {
        let (conn, _, _) = connection();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_connected());
        assert_eq!(conn.reconnect_count(), 0);
    }

    #[test]
    fn test_malformed_frame_writes_nothing() {
        let (conn, store, _) = connection();
        assert!(conn.handle_text("not json").is_none());
        assert_eq!(store.count(), 0);
        assert_eq!(conn.decode_stats().malformed(), 1);
    }

    #[test]
    fn test_ack_is_ignored() {
        let (conn, store, _) = connection();
        assert!(conn.handle_text(r#"{"result":null,"id":1}"#).is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_ticker_is_stored_fresh() {
        let (conn, store, clock) = connection();
        let frame = r#"{"stream":"btcusdt@ticker","data":{"e":"24hrTicker","E":1700000000000,"s":"BTCUSDT","c":"50000.01","v":"100.5","P":"1.25"}}"#;

        let symbol = conn.handle_text(frame).unwrap();
        assert_eq!(symbol.as_str(), "BTCUSDT");

        let lookup = store.get(&symbol);
        assert_eq!(lookup.freshness(), Freshness::Fresh);
        let record = lookup.into_value().unwrap();
        assert_eq!(record.price.to_string(), "50000.01");
        assert_eq!(record.observed_at, clock.now());
    }

    #[tokio::test]
    async fn test_run_exits_immediately_when_already_disconnected() {
        let (conn, _, _) = connection();
        conn.disconnect();
        conn.run().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(conn.reconnect_count(), 0);
    }
}
