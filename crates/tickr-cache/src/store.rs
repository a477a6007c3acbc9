//! Keyed TTL store.
//!
//! One mutex guards both the entries and the set of keys with a refresh in
//! flight, so "is a refresh running" and "what is cached" are always read
//! consistently. Values are cloned out; callers never hold a reference into
//! the map.

use crate::clock::Clock;
use crate::freshness::{Freshness, FreshnessPolicy};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tickr_core::{PredictionRecord, PriceRecord, Symbol};
use tickr_telemetry::Metrics;
use tracing::debug;

/// Records that carry their own observation time.
///
/// `None` means the store stamps the entry with the current clock time.
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for PriceRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.observed_at)
    }
}

impl Timestamped for PredictionRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.generated_at())
    }
}

/// Result of a store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    Fresh(V),
    Aging(V),
    Expired,
    Miss,
}

impl<V> Lookup<V> {
    pub fn freshness(&self) -> Freshness {
        match self {
            Self::Fresh(_) => Freshness::Fresh,
            Self::Aging(_) => Freshness::Aging,
            Self::Expired => Freshness::Expired,
            Self::Miss => Freshness::Miss,
        }
    }

    /// Servable value, if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Fresh(v) | Self::Aging(v) => Some(v),
            Self::Expired | Self::Miss => None,
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<Symbol, Entry<V>>,
    refreshing: HashSet<Symbol>,
}

/// Thread-safe map from symbol to timestamped record.
pub struct KeyedTtlStore<V> {
    name: &'static str,
    policy: FreshnessPolicy,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone + Timestamped> KeyedTtlStore<V> {
    /// Create an empty store. `name` labels logs and metrics.
    pub fn new(name: &'static str, policy: FreshnessPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            policy,
            clock,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                refreshing: HashSet::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Unconditional overwrite (last write wins).
    pub fn set(&self, key: &Symbol, value: V) {
        let stored_at = value.timestamp().unwrap_or_else(|| self.clock.now());
        let count = {
            let mut inner = self.inner.lock();
            inner.entries.insert(key.clone(), Entry { value, stored_at });
            inner.entries.len()
        };
        Metrics::cache_entries(self.name, count);
    }

    /// Look up a key and classify it by age.
    pub fn get(&self, key: &Symbol) -> Lookup<V> {
        let now = self.clock.now();
        let lookup = {
            let inner = self.inner.lock();
            match inner.entries.get(key) {
                None => Lookup::Miss,
                Some(entry) => match self.policy.classify(age(now, entry.stored_at)) {
                    Freshness::Fresh => Lookup::Fresh(entry.value.clone()),
                    Freshness::Aging => Lookup::Aging(entry.value.clone()),
                    Freshness::Expired | Freshness::Miss => Lookup::Expired,
                },
            }
        };
        Metrics::cache_lookup(self.name, lookup.freshness().as_str());
        lookup
    }

    /// Remove every entry with age >= `ttl`. Returns the number removed.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let now = self.clock.now();
        let (removed, remaining) = {
            let mut inner = self.inner.lock();
            let before = inner.entries.len();
            inner
                .entries
                .retain(|_, entry| age(now, entry.stored_at) < ttl);
            (before - inner.entries.len(), inner.entries.len())
        };

        if removed > 0 {
            debug!(store = self.name, removed, remaining, "Swept expired entries");
            Metrics::sweep_evicted(self.name, removed);
        }
        Metrics::cache_entries(self.name, remaining);
        removed
    }

    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<Symbol> {
        let mut keys: Vec<Symbol> = self.inner.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copies of every entry younger than the TTL, sorted by key.
    pub fn servable_values(&self) -> Vec<V> {
        let now = self.clock.now();
        let inner = self.inner.lock();
        let mut values: Vec<(&Symbol, V)> = inner
            .entries
            .iter()
            .filter(|(_, entry)| age(now, entry.stored_at) < self.policy.ttl())
            .map(|(key, entry)| (key, entry.value.clone()))
            .collect();
        values.sort_by(|a, b| a.0.cmp(b.0));
        let sorted: Vec<V> = values.into_iter().map(|(_, v)| v).collect();
        sorted
    }

    /// Timestamp of the most recent entry.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .entries
            .values()
            .map(|entry| entry.stored_at)
            .max()
    }

    /// Mark a refresh in flight. Returns `false` if one already is.
    pub fn try_begin_refresh(&self, key: &Symbol) -> bool {
        self.inner.lock().refreshing.insert(key.clone())
    }

    /// Clear the in-flight marker for `key`.
    pub fn end_refresh(&self, key: &Symbol) {
        self.inner.lock().refreshing.remove(key);
    }

    pub fn is_refreshing(&self, key: &Symbol) -> bool {
        self.inner.lock().refreshing.contains(key)
    }
}

/// Age of an entry; timestamps ahead of the clock count as zero age.
fn age(now: DateTime<Utc>, stored_at: DateTime<Utc>) -> Duration {
    (now - stored_at).to_std().unwrap_or(Duration::ZERO)
}
