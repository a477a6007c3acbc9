//! Price data types.
//!
//! Contains the normalized `Symbol` key and the `PriceRecord` snapshot
//! written by the feed and by REST fallback fetches.

use crate::error::CoreError;
use crate::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading pair symbol, upper-cased and trimmed (e.g., "BTCUSDT").
///
/// Every cache key goes through this type, so "btcusdt" and " BTCUSDT "
/// address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize and validate a raw symbol.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidSymbol(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form used in exchange stream names ("btcusdt@ticker").
    pub fn stream_name(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Latest price snapshot for one symbol.
///
/// Overwritten wholesale on every tick (last write wins, no merge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// Normalized symbol; always equal to the store key.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: Price,
    /// When this snapshot was observed locally.
    pub observed_at: DateTime<Utc>,
    /// 24h base-asset volume (feed only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    /// 24h price change in percent (feed only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h_pct: Option<Decimal>,
}

impl PriceRecord {
    /// Create a record without volume or change data (REST fallback path).
    pub fn new(symbol: Symbol, price: Price, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            price,
            observed_at,
            volume: None,
            change_24h_pct: None,
        }
    }

    /// Attach 24h statistics.
    pub fn with_stats(mut self, volume: Option<Decimal>, change_24h_pct: Option<Decimal>) -> Self {
        self.volume = volume;
        self.change_24h_pct = change_24h_pct;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new("btcusdt").unwrap().as_str(), "BTCUSDT");
        assert_eq!(Symbol::new("  EthUsdt ").unwrap().as_str(), "ETHUSDT");
        assert_eq!(Symbol::new("btcusdt").unwrap().stream_name(), "btcusdt");
    }

    #[test]
    fn test_symbol_rejects_empty_and_punctuation() {
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("   ").is_err());
        assert!(Symbol::new("BTC/USDT").is_err());
        assert!(Symbol::new("btc@ticker").is_err());
    }

    #[test]
    fn test_symbol_deserialize_normalizes() {
        let symbol: Symbol = serde_json::from_str("\"solusdt\"").unwrap();
        assert_eq!(symbol.as_str(), "SOLUSDT");
        assert!(serde_json::from_str::<Symbol>("\"\"").is_err());
    }

    #[test]
    fn test_price_record_json_shape() {
        let record = PriceRecord::new(
            Symbol::new("BTCUSDT").unwrap(),
            Price::parse("50000.00").unwrap(),
            Utc::now(),
        )
        .with_stats(Some(dec!(1234.5)), Some(dec!(-1.25)));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["price"], "50000.00");
        assert!(json.get("observedAt").is_some());
        assert!(json.get("change24hPct").is_some());
    }

    #[test]
    fn test_price_record_omits_missing_stats() {
        let record = PriceRecord::new(
            Symbol::new("ETHUSDT").unwrap(),
            Price::parse("3000").unwrap(),
            Utc::now(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("volume").is_none());
        assert!(json.get("change24hPct").is_none());
    }
}
