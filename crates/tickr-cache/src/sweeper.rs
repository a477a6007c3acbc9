//! Periodic TTL sweep.

use crate::store::{KeyedTtlStore, Timestamped};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run `store.sweep(ttl)` every `every` until `shutdown` is cancelled.
///
/// Independent of reads: an entry nobody asks for still leaves the store.
pub fn spawn_sweeper<V>(
    store: Arc<KeyedTtlStore<V>>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Timestamped + Send + 'static,
{
    tokio::spawn(async move {
        let ttl = store.policy().ttl();
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!(store = store.name(), "Sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    store.sweep(ttl);
                }
            }
        }
    })
}
