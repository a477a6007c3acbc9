//! HTTP boundaries for tickr.
//!
//! `RemoteFetcher` is the exchange REST fallback used on cache misses and
//! background refreshes of live prices. `AnalysisClient` is the generative
//! analysis call behind the prediction cache.

pub mod analysis;
pub mod client;
pub mod error;

pub use analysis::{AnalysisClient, AnalysisRequest};
pub use client::{RemoteFetcher, TickerPriceResponse};
pub use error::{FetchError, FetchResult};
