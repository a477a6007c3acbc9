//! Background refresh with per-key single-flight.

use crate::source::RecordSource;
use crate::store::{KeyedTtlStore, Timestamped};
use std::sync::Arc;
use std::time::Instant;
use tickr_core::Symbol;
use tickr_telemetry::Metrics;
use tracing::{debug, warn};

/// Launches detached refresh tasks for aging entries.
///
/// Refresh failures never reach the caller: the stale entry keeps serving
/// reads until it expires or a later refresh succeeds.
pub struct RefreshScheduler<S: RecordSource> {
    store: Arc<KeyedTtlStore<S::Record>>,
    source: Arc<S>,
}

impl<S: RecordSource> Clone for RefreshScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            source: self.source.clone(),
        }
    }
}

impl<S> RefreshScheduler<S>
where
    S: RecordSource,
    S::Record: Timestamped,
{
    pub fn new(store: Arc<KeyedTtlStore<S::Record>>, source: Arc<S>) -> Self {
        Self { store, source }
    }

    /// Launch a refresh for `symbol` unless one is already in flight.
    ///
    /// Returns `true` if a task was spawned. Must be called from within a
    /// tokio runtime.
    pub fn maybe_refresh(&self, symbol: &Symbol) -> bool {
        let cache = self.store.name();
        if !self.store.try_begin_refresh(symbol) {
            debug!(cache, symbol = %symbol, "Refresh already in flight");
            Metrics::cache_refresh(cache, "deduplicated");
            return false;
        }

        Metrics::cache_refresh(cache, "launched");
        let guard = InFlight {
            store: self.store.clone(),
            symbol: symbol.clone(),
        };
        let source = self.source.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let result = source.fetch(&guard.symbol).await;
            Metrics::fetch_latency(cache, "refresh", started.elapsed().as_secs_f64() * 1000.0);

            match result {
                Ok(record) => {
                    guard.store.set(&guard.symbol, record);
                    debug!(cache, symbol = %guard.symbol, "Background refresh stored");
                    Metrics::cache_refresh(cache, "succeeded");
                }
                Err(e) => {
                    warn!(
                        cache,
                        symbol = %guard.symbol,
                        error = %e,
                        "Background refresh failed, keeping stale entry"
                    );
                    Metrics::cache_refresh(cache, "failed");
                }
            }
        });

        true
    }
}

/// Clears the in-flight marker when the refresh task ends, however it ends.
struct InFlight<V: Clone + Timestamped> {
    store: Arc<KeyedTtlStore<V>>,
    symbol: Symbol,
}

impl<V: Clone + Timestamped> Drop for InFlight<V> {
    fn drop(&mut self) {
        self.store.end_refresh(&self.symbol);
    }
}
