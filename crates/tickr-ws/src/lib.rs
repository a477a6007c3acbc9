//! Exchange stream connection for tickr.
//!
//! Provides:
//! - `StreamConnection`: connect, subscribe, receive and reconnect loop that
//!   writes decoded tickers into the price store
//! - `ReconnectPolicy`: fixed delay (default 5s) or capped exponential backoff
//! - `IdleMonitor`: forces a reconnect on a silently dead socket

pub mod connection;
pub mod error;
pub mod heartbeat;
pub mod message;
pub mod reconnect;

pub use connection::{ConnectionConfig, ConnectionState, StreamConnection};
pub use error::{WsError, WsResult};
pub use heartbeat::IdleMonitor;
pub use message::{StreamKind, StreamRequest, StreamTarget};
pub use reconnect::ReconnectPolicy;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any `wss://` connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
