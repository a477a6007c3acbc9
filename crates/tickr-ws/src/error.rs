//! WebSocket error types.

use thiserror::Error;

/// Connection-level failures. None of these reach readers of the store;
/// each one ends the current session and schedules a reconnect.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("No frames for {0:?}")]
    IdleTimeout(std::time::Duration),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WsError {
    /// Label for the reconnect counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connect_failed",
            Self::ConnectionClosed { .. } => "closed",
            Self::SendFailed(_) => "send_failed",
            Self::IdleTimeout(_) => "idle",
            Self::Tungstenite(_) => "error",
            Self::Json(_) => "error",
        }
    }
}

pub type WsResult<T> = Result<T, WsError>;
