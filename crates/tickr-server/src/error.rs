//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] tickr_core::CoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] tickr_cache::CacheError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] tickr_rest::FetchError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tickr_ws::WsError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tickr_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
