//! Freshness classification.

use crate::error::{CacheError, CacheResult};
use std::fmt;
use std::time::Duration;

/// Result class of a store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// age < aging threshold.
    Fresh,
    /// aging threshold <= age < ttl. Still served, caller should refresh.
    Aging,
    /// age >= ttl. Unusable, treated as a miss.
    Expired,
    /// No entry.
    Miss,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Aging => "aging",
            Self::Expired => "expired",
            Self::Miss => "miss",
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aging threshold and TTL for one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    aging_after: Duration,
    ttl: Duration,
}

impl FreshnessPolicy {
    /// Live prices: 25s aging, 30s TTL.
    pub const PRICES: Self = Self {
        aging_after: Duration::from_secs(25),
        ttl: Duration::from_secs(30),
    };

    /// Predictions: 50min aging, 60min TTL.
    pub const PREDICTIONS: Self = Self {
        aging_after: Duration::from_secs(50 * 60),
        ttl: Duration::from_secs(60 * 60),
    };

    pub fn new(aging_after: Duration, ttl: Duration) -> CacheResult<Self> {
        if aging_after >= ttl {
            return Err(CacheError::InvalidPolicy { aging_after, ttl });
        }
        Ok(Self { aging_after, ttl })
    }

    pub fn aging_after(&self) -> Duration {
        self.aging_after
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn classify(&self, age: Duration) -> Freshness {
        if age >= self.ttl {
            Freshness::Expired
        } else if age >= self.aging_after {
            Freshness::Aging
        } else {
            Freshness::Fresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let policy = FreshnessPolicy::PRICES;
        assert_eq!(policy.classify(Duration::ZERO), Freshness::Fresh);
        assert_eq!(policy.classify(Duration::from_millis(24_999)), Freshness::Fresh);
        assert_eq!(policy.classify(Duration::from_secs(25)), Freshness::Aging);
        assert_eq!(policy.classify(Duration::from_millis(29_999)), Freshness::Aging);
        assert_eq!(policy.classify(Duration::from_secs(30)), Freshness::Expired);
    }

    #[test]
    fn test_prediction_policy() {
        let policy = FreshnessPolicy::PREDICTIONS;
        assert_eq!(policy.classify(Duration::from_secs(49 * 60)), Freshness::Fresh);
        assert_eq!(policy.classify(Duration::from_secs(55 * 60)), Freshness::Aging);
        assert_eq!(policy.classify(Duration::from_secs(61 * 60)), Freshness::Expired);
    }

    #[test]
    fn test_rejects_aging_not_below_ttl() {
        assert!(FreshnessPolicy::new(Duration::from_secs(30), Duration::from_secs(30)).is_err());
        assert!(FreshnessPolicy::new(Duration::from_secs(31), Duration::from_secs(30)).is_err());
        assert!(FreshnessPolicy::new(Duration::from_secs(5), Duration::from_secs(30)).is_ok());
    }
}
