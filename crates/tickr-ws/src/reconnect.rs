//! Reconnect delay policies.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay before reconnecting after the connection drops.
///
/// Config form:
/// ```toml
/// [feed.reconnect]
/// mode = "backoff"
/// base_ms = 1000
/// max_ms = 60000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Same delay before every attempt.
    Fixed { delay_ms: u64 },
    /// `base * 2^(attempt-1)` capped at `max`, plus up to 25% jitter.
    Backoff { base_ms: u64, max_ms: u64 },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed { delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Backoff { base_ms, max_ms } => {
                // attempt=1 -> base, attempt=2 -> 2*base, attempt=3 -> 4*base
                let exponent = attempt.saturating_sub(1).min(20);
                let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
                Duration::from_millis(delay + jitter(delay / 4))
            }
        }
    }
}

/// Cheap jitter in `0..=bound` ms from the sub-second clock.
fn jitter(bound: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    if bound == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % (bound + 1)
}
