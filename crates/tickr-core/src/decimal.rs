//! Precision-safe price type.
//!
//! Exchange prices arrive as decimal strings ("50000.01000000"). They are
//! parsed into `rust_decimal::Decimal`, which keeps the original scale, so the
//! value written back out is textually identical to what the exchange sent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Price with exact decimal precision.
///
/// Serialized as a string to keep the wire representation lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Price {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parse an exchange price string, rejecting negatives.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let value: Decimal = raw
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidPrice(raw.to_string()))?;
        if value.is_sign_negative() {
            return Err(CoreError::InvalidPrice(raw.to_string()));
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}
