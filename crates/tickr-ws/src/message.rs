//! Outbound stream control messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use tickr_core::Symbol;

/// Per-symbol stream kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// 24h rolling ticker (`<symbol>@ticker`).
    Ticker,
    /// Individual trades (`<symbol>@trade`).
    Trade,
}

impl StreamKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Ticker => "ticker",
            Self::Trade => "trade",
        }
    }
}

/// One symbol/stream pair to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamTarget {
    pub symbol: Symbol,
    pub kind: StreamKind,
}

impl StreamTarget {
    pub fn ticker(symbol: Symbol) -> Self {
        Self {
            symbol,
            kind: StreamKind::Ticker,
        }
    }

    /// Exchange stream name, e.g. "btcusdt@ticker".
    pub fn stream_name(&self) -> String {
        format!("{}@{}", self.symbol.stream_name(), self.kind.suffix())
    }
}

impl fmt::Display for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stream_name())
    }
}

/// Subscribe control frame.
///
/// Format: `{"method":"SUBSCRIBE","params":["btcusdt@ticker"],"id":1}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub method: String,
    pub params: Vec<String>,
    pub id: u64,
}

impl StreamRequest {
    pub fn subscribe(targets: &[StreamTarget], id: u64) -> Self {
        Self {
            method: "SUBSCRIBE".to_string(),
            params: targets.iter().map(StreamTarget::stream_name).collect(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_wire_format() {
        let targets = vec![
            StreamTarget::ticker(Symbol::new("BTCUSDT").unwrap()),
            StreamTarget::ticker(Symbol::new("ethusdt").unwrap()),
            StreamTarget {
                symbol: Symbol::new("SOLUSDT").unwrap(),
                kind: StreamKind::Trade,
            },
        ];
        let request = StreamRequest::subscribe(&targets, 1);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"method":"SUBSCRIBE","params":["btcusdt@ticker","ethusdt@ticker","solusdt@trade"],"id":1}"#
        );
    }
}
