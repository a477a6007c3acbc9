//! Keyed TTL store with stale-while-revalidate refresh.
//!
//! Reads are classified by age:
//! - Fresh: returned as-is
//! - Aging: returned immediately, one background refresh is launched per key
//! - Expired / Miss: the caller blocks on a synchronous fetch
//!
//! The same machinery backs the live price cache (short TTL, fed by the
//! exchange stream) and the prediction cache (long TTL, fed by a generative
//! analysis call).

pub mod clock;
pub mod error;
pub mod freshness;
pub mod prediction;
pub mod read_through;
pub mod refresh;
pub mod source;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CacheResult};
pub use freshness::{Freshness, FreshnessPolicy};
pub use prediction::{PredictionCache, PredictionStore};
pub use read_through::{PriceCache, PriceStore, ReadThroughCache};
pub use refresh::RefreshScheduler;
pub use source::RecordSource;
pub use store::{KeyedTtlStore, Lookup, Timestamped};
pub use sweeper::spawn_sweeper;
