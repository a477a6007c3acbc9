//! Exchange stream decoding for tickr.
//!
//! Turns raw text frames from the exchange's combined stream into typed
//! events. Subscription acks and unrecognized event types decode to
//! explicit variants; malformed frames fail closed with a `FeedError`.

pub mod decoder;
pub mod error;

pub use decoder::{DecodeStats, FeedDecoder, FeedEvent, TickerUpdate, TradeUpdate};
pub use error::{FeedError, FeedResult};
