//! Stale-while-revalidate read path.

use crate::refresh::RefreshScheduler;
use crate::source::RecordSource;
use crate::store::{KeyedTtlStore, Lookup, Timestamped};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tickr_core::{PriceRecord, Symbol};
use tickr_telemetry::Metrics;
use tracing::debug;

/// Live price store shared by the feed and the read path.
pub type PriceStore = KeyedTtlStore<PriceRecord>;

/// Price read path backed by a REST fallback.
pub type PriceCache<S> = ReadThroughCache<S>;

/// Store + source + refresh scheduler.
///
/// - Fresh: value returned.
/// - Aging: value returned immediately, background refresh launched.
/// - Expired / Miss: synchronous fetch; the result is stored and returned,
///   errors go to the caller.
pub struct ReadThroughCache<S: RecordSource> {
    store: Arc<KeyedTtlStore<S::Record>>,
    source: Arc<S>,
    scheduler: RefreshScheduler<S>,
}

impl<S> ReadThroughCache<S>
where
    S: RecordSource,
    S::Record: Timestamped,
{
    pub fn new(store: Arc<KeyedTtlStore<S::Record>>, source: Arc<S>) -> Self {
        let scheduler = RefreshScheduler::new(store.clone(), source.clone());
        Self {
            store,
            source,
            scheduler,
        }
    }

    pub fn store(&self) -> &Arc<KeyedTtlStore<S::Record>> {
        &self.store
    }

    /// Read a record, fetching synchronously only when nothing servable is cached.
    pub async fn get(&self, symbol: &Symbol) -> Result<S::Record, S::Error> {
        match self.store.get(symbol) {
            Lookup::Fresh(value) => Ok(value),
            Lookup::Aging(value) => {
                self.scheduler.maybe_refresh(symbol);
                Ok(value)
            }
            Lookup::Expired | Lookup::Miss => self.fetch_now(symbol).await,
        }
    }

    /// Cached value only; never touches the network.
    pub fn peek(&self, symbol: &Symbol) -> Option<S::Record> {
        self.store.get(symbol).into_value()
    }

    /// Copies of all non-expired records.
    pub fn get_all(&self) -> Vec<S::Record> {
        self.store.servable_values()
    }

    /// Time of the most recent write.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.store.last_update()
    }

    async fn fetch_now(&self, symbol: &Symbol) -> Result<S::Record, S::Error> {
        let cache = self.store.name();
        debug!(cache, symbol = %symbol, "Cache miss, fetching synchronously");

        let started = Instant::now();
        let result = self.source.fetch(symbol).await;
        Metrics::fetch_latency(cache, "sync", started.elapsed().as_secs_f64() * 1000.0);

        let record = result?;
        self.store.set(symbol, record.clone());
        Ok(record)
    }
}
