//! Prometheus metrics and structured logging for tickr.
//!
//! - Prometheus metrics for cache freshness, background refreshes and the feed
//! - Structured JSON logging with tracing

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use metrics::Metrics;
