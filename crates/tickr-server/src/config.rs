//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tickr_cache::FreshnessPolicy;
use tickr_core::Symbol;
use tickr_ws::{ConnectionConfig, ReconnectPolicy, StreamTarget};

/// Environment variable consulted when no `--config` flag is given.
pub const CONFIG_ENV_VAR: &str = "TICKR_CONFIG";

/// Fallback config path.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Exchange stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Combined-stream endpoint.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Symbols subscribed as `<symbol>@ticker`.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Force a reconnect after this long without any frame (seconds).
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

fn default_ws_url() -> String {
    "wss://stream.binance.com:9443/stream".to_string()
}

fn default_symbols() -> Vec<String> {
    ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_idle_timeout_secs() -> u64 {
    60
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            symbols: default_symbols(),
            idle_timeout_secs: default_idle_timeout_secs(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// REST fallback and analysis endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_base_url")]
    pub base_url: String,
    /// Per-request timeout (ms). Bounds the synchronous miss path.
    #[serde(default = "default_rest_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_analysis_url")]
    pub analysis_url: String,
    /// Generative calls are slow; this is separate from `timeout_ms`.
    #[serde(default = "default_analysis_timeout_ms")]
    pub analysis_timeout_ms: u64,
}

fn default_rest_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_rest_timeout_ms() -> u64 {
    10_000
}

fn default_analysis_url() -> String {
    "http://127.0.0.1:8081/analyze".to_string()
}

fn default_analysis_timeout_ms() -> u64 {
    60_000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_base_url(),
            timeout_ms: default_rest_timeout_ms(),
            analysis_url: default_analysis_url(),
            analysis_timeout_ms: default_analysis_timeout_ms(),
        }
    }
}

/// Live price cache timing. Default: 25s aging, 30s TTL, sweep every 10s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCacheConfig {
    #[serde(default = "default_price_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_price_aging_secs")]
    pub aging_secs: u64,
    #[serde(default = "default_price_sweep_secs")]
    pub sweep_interval_secs: u64,
}

fn default_price_ttl_secs() -> u64 {
    30
}

fn default_price_aging_secs() -> u64 {
    25
}

fn default_price_sweep_secs() -> u64 {
    10
}

impl Default for PriceCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_price_ttl_secs(),
            aging_secs: default_price_aging_secs(),
            sweep_interval_secs: default_price_sweep_secs(),
        }
    }
}

impl PriceCacheConfig {
    pub fn policy(&self) -> AppResult<FreshnessPolicy> {
        policy("prices", self.aging_secs, self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Prediction cache timing. Default: 50min aging, 60min TTL, sweep every 5min.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionCacheConfig {
    #[serde(default = "default_prediction_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_prediction_aging_secs")]
    pub aging_secs: u64,
    #[serde(default = "default_prediction_sweep_secs")]
    pub sweep_interval_secs: u64,
}

fn default_prediction_ttl_secs() -> u64 {
    60 * 60
}

fn default_prediction_aging_secs() -> u64 {
    50 * 60
}

fn default_prediction_sweep_secs() -> u64 {
    5 * 60
}

impl Default for PredictionCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_prediction_ttl_secs(),
            aging_secs: default_prediction_aging_secs(),
            sweep_interval_secs: default_prediction_sweep_secs(),
        }
    }
}

impl PredictionCacheConfig {
    pub fn policy(&self) -> AppResult<FreshnessPolicy> {
        policy("predictions", self.aging_secs, self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn policy(section: &str, aging_secs: u64, ttl_secs: u64) -> AppResult<FreshnessPolicy> {
    FreshnessPolicy::new(
        Duration::from_secs(aging_secs),
        Duration::from_secs(ttl_secs),
    )
    .map_err(|e| AppError::Config(format!("[{section}] {e}")))
}

/// HTTP read API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub prices: PriceCacheConfig,
    #[serde(default)]
    pub predictions: PredictionCacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path precedence: `cli_path` > `TICKR_CONFIG` > `config/default.toml`.
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load(cli_path: Option<&str>) -> AppResult<Self> {
        let config_path = cli_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let config = if Path::new(&config_path).exists() {
            tracing::info!(path = %config_path, "Loading configuration");
            Self::from_file(&config_path)?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject configurations the caches and feed cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        self.prices.policy()?;
        self.predictions.policy()?;

        if self.prices.sweep_interval_secs == 0 || self.predictions.sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.feed.symbols.is_empty() {
            return Err(AppError::Config("[feed] symbols must not be empty".to_string()));
        }
        if self.feed.idle_timeout_secs == 0 {
            return Err(AppError::Config(
                "[feed] idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.rest.timeout_ms == 0 || self.rest.analysis_timeout_ms == 0 {
            return Err(AppError::Config("[rest] timeouts must be greater than zero".to_string()));
        }
        if let ReconnectPolicy::Backoff { base_ms, max_ms } = self.feed.reconnect {
            if base_ms == 0 || max_ms < base_ms {
                return Err(AppError::Config(format!(
                    "[feed.reconnect] invalid backoff base_ms={base_ms} max_ms={max_ms}"
                )));
            }
        }
        self.symbols()?;
        Ok(())
    }

    /// Normalized feed symbols, deduplicated in config order.
    pub fn symbols(&self) -> AppResult<Vec<Symbol>> {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(self.feed.symbols.len());
        for raw in &self.feed.symbols {
            let symbol = Symbol::new(raw)
                .map_err(|e| AppError::Config(format!("[feed] symbols: {e}")))?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    pub fn connection_config(&self) -> AppResult<ConnectionConfig> {
        Ok(ConnectionConfig {
            url: self.feed.ws_url.clone(),
            targets: self.symbols()?.into_iter().map(StreamTarget::ticker).collect(),
            reconnect: self.feed.reconnect,
            idle_timeout: Duration::from_secs(self.feed.idle_timeout_secs),
        })
    }

    pub fn rest_timeout(&self) -> Duration {
        Duration::from_millis(self.rest.timeout_ms)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.rest.analysis_timeout_ms)
    }
}
