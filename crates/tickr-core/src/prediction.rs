//! AI prediction records.
//!
//! A `PredictionRecord` is immutable once built: a refresh replaces the whole
//! record in the cache, fields are never patched. All invariants are checked
//! in `PredictionRecord::from_draft`, which is also the deserialization path.

use crate::error::CoreError;
use crate::{Price, Symbol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence score in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, CoreError> {
        if !(0..=i64::from(Self::MAX)).contains(&value) {
            return Err(CoreError::ConfidenceOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Confidence {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

/// Expected direction over a timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Prediction for a single timeframe (e.g., "1h", "24h", "7d").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframePrediction {
    pub timeframe: String,
    pub predicted_price: Price,
    pub confidence: Confidence,
    pub trend: Trend,
    #[serde(default)]
    pub rationale: String,
}

/// Narrative analysis block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// Unvalidated prediction as produced by the generative call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDraft {
    pub symbol: Symbol,
    pub current_price: Price,
    pub predictions: Vec<TimeframePrediction>,
    #[serde(default)]
    pub support_levels: Vec<Price>,
    #[serde(default)]
    pub resistance_levels: Vec<Price>,
    pub overall_confidence: Confidence,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub analysis: Analysis,
}

/// Validated, immutable multi-timeframe prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PredictionDraft")]
pub struct PredictionRecord {
    symbol: Symbol,
    current_price: Price,
    predictions: Vec<TimeframePrediction>,
    support_levels: Vec<Price>,
    resistance_levels: Vec<Price>,
    overall_confidence: Confidence,
    /// Local receive time. Freshness is measured from here.
    generated_at: DateTime<Utc>,
    /// Generation time claimed by the producer, kept for display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reported_at: Option<DateTime<Utc>>,
    analysis: Analysis,
}

fn check_price(field: &str, price: Price) -> Result<(), CoreError> {
    if price.inner().is_sign_negative() {
        return Err(CoreError::InvalidPrice(format!("{field}: {price}")));
    }
    Ok(())
}

impl PredictionRecord {
    /// Validate a draft and stamp it with the local time `now`.
    ///
    /// A `generatedAt` supplied by the producer never drives aging; a skewed
    /// remote clock would otherwise expire or pin the cached record.
    pub fn from_draft(draft: PredictionDraft, now: DateTime<Utc>) -> Result<Self, CoreError> {
        if draft.predictions.is_empty() {
            return Err(CoreError::EmptyPredictions);
        }

        check_price("currentPrice", draft.current_price)?;
        for p in &draft.predictions {
            check_price("predictedPrice", p.predicted_price)?;
        }
        for level in &draft.support_levels {
            check_price("supportLevels", *level)?;
        }
        for level in &draft.resistance_levels {
            check_price("resistanceLevels", *level)?;
        }

        Ok(Self {
            symbol: draft.symbol,
            current_price: draft.current_price,
            predictions: draft.predictions,
            support_levels: draft.support_levels,
            resistance_levels: draft.resistance_levels,
            overall_confidence: draft.overall_confidence,
            generated_at: now,
            reported_at: draft.generated_at,
            analysis: draft.analysis,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn current_price(&self) -> Price {
        self.current_price
    }

    pub fn predictions(&self) -> &[TimeframePrediction] {
        &self.predictions
    }

    pub fn support_levels(&self) -> &[Price] {
        &self.support_levels
    }

    pub fn resistance_levels(&self) -> &[Price] {
        &self.resistance_levels
    }

    pub fn overall_confidence(&self) -> Confidence {
        self.overall_confidence
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        self.reported_at
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Prediction for a given timeframe tag, if present.
    pub fn timeframe(&self, tag: &str) -> Option<&TimeframePrediction> {
        self.predictions.iter().find(|p| p.timeframe == tag)
    }
}

impl TryFrom<PredictionDraft> for PredictionRecord {
    type Error = CoreError;

    fn try_from(draft: PredictionDraft) -> Result<Self, Self::Error> {
        Self::from_draft(draft, Utc::now())
    }
}
