//! Mock exchange stream for integration tests.
//!
//! Accepts WebSocket connections, acks SUBSCRIBE requests the way the
//! exchange does (`{"result":null,"id":N}`), records every text frame it
//! receives and can push frames to (or close) all live sessions.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Push {
    Text(String),
    Close,
}

#[derive(Default)]
struct Shared {
    received: Mutex<Vec<String>>,
    /// Completed handshakes only.
    sessions: AtomicU32,
}

pub struct MockExchange {
    addr: SocketAddr,
    shared: Arc<Shared>,
    push: broadcast::Sender<Push>,
    stop: CancellationToken,
}

impl MockExchange {
    /// Bind an ephemeral port and start accepting.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared::default());
        let (push, _) = broadcast::channel(64);
        let stop = CancellationToken::new();

        let accept_shared = shared.clone();
        let accept_push = push.clone();
        let accept_stop = stop.clone();
        tokio::spawn(async move {
            loop {
                let stream = tokio::select! {
                    _ = accept_stop.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, _)) => stream,
                        Err(_) => continue,
                    },
                };
                tokio::spawn(serve_session(
                    stream,
                    accept_shared.clone(),
                    accept_push.subscribe(),
                    accept_stop.child_token(),
                ));
            }
        });

        Self {
            addr,
            shared,
            push,
            stop,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn connection_count(&self) -> u32 {
        self.shared.sessions.load(Ordering::SeqCst)
    }

    pub async fn received_messages(&self) -> Vec<String> {
        self.shared.received.lock().await.clone()
    }

    /// Send a text frame to every live session.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.push.send(Push::Text(text.into()));
    }

    /// Close every live session from the server side.
    pub fn close_all(&self) {
        let _ = self.push.send(Push::Close);
    }

    /// Stop accepting and drop all sessions.
    pub async fn shutdown(self) {
        self.stop.cancel();
    }
}

/// Combined-stream 24hr ticker frame.
pub fn ticker_frame(symbol: &str, price: &str) -> String {
    json!({
        "stream": format!("{}@ticker", symbol.to_ascii_lowercase()),
        "data": {
            "e": "24hrTicker",
            "E": 1_700_000_000_000_i64,
            "s": symbol,
            "c": price,
            "v": "1000.0",
            "P": "1.50"
        }
    })
    .to_string()
}

fn subscribe_ack(text: &str) -> Option<String> {
    let request: Value = serde_json::from_str(text).ok()?;
    if request.get("method")?.as_str()? != "SUBSCRIBE" {
        return None;
    }
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    Some(json!({"result": null, "id": id}).to_string())
}

async fn serve_session(
    stream: TcpStream,
    shared: Arc<Shared>,
    mut push: broadcast::Receiver<Push>,
    stop: CancellationToken,
) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    shared.sessions.fetch_add(1, Ordering::SeqCst);
    let (mut sink, mut source) = ws.split();

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    shared.received.lock().await.push(text.clone());
                    if let Some(ack) = subscribe_ack(&text) {
                        let _ = sink.send(Message::Text(ack)).await;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            command = push.recv() => match command {
                Ok(Push::Text(text)) => {
                    let _ = sink.send(Message::Text(text)).await;
                }
                Ok(Push::Close) | Err(_) => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_ack_echoes_id() {
        let ack = subscribe_ack(r#"{"method":"SUBSCRIBE","params":[],"id":7}"#).unwrap();
        let ack: Value = serde_json::from_str(&ack).unwrap();
        assert_eq!(ack, json!({"result": null, "id": 7}));
        assert!(subscribe_ack(r#"{"method":"UNSUBSCRIBE","id":1}"#).is_none());
        assert!(subscribe_ack("not json").is_none());
    }
}
