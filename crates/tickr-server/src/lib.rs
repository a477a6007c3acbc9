//! Live price and prediction cache service.
//!
//! Wires the exchange stream, the REST fallback and the generative analysis
//! endpoint into two read-through caches and serves them over HTTP:
//! - `GET /prices/{symbol}`, `GET /prices`
//! - `GET /predictions/{symbol}`
//! - `GET /status`, `GET /metrics`

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod generator;
pub mod service;

pub use api::create_router;
pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use generator::AnalysisGenerator;
pub use service::{FeedStatus, LivePredictionCache, LivePriceCache, PriceService};
