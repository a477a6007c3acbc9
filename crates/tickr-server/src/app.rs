//! Application wiring and lifecycle.
//!
//! Coordinates:
//! - Stream connection feeding the price store
//! - Price and prediction read-through caches
//! - Periodic sweepers for both stores
//! - HTTP read API
//!
//! A single root `CancellationToken` stops the feed loop, both sweepers and
//! the HTTP server.

use crate::api::create_router;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::generator::AnalysisGenerator;
use crate::service::{LivePredictionCache, LivePriceCache, PriceService};
use std::sync::Arc;
use tickr_cache::{
    spawn_sweeper, Clock, KeyedTtlStore, PredictionStore, PriceStore, ReadThroughCache,
    SystemClock,
};
use tickr_rest::{AnalysisClient, RemoteFetcher};
use tickr_ws::StreamConnection;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    price_store: Arc<PriceStore>,
    prediction_store: Arc<PredictionStore>,
    connection: Arc<StreamConnection>,
    service: Arc<PriceService>,
    shutdown: CancellationToken,
}

impl Application {
    /// Build every component. Nothing runs until `run()` / `serve()`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        config.validate()?;
        let shutdown = CancellationToken::new();

        let price_store = Arc::new(KeyedTtlStore::new(
            "prices",
            config.prices.policy()?,
            clock.clone(),
        ));
        let prediction_store = Arc::new(KeyedTtlStore::new(
            "predictions",
            config.predictions.policy()?,
            clock.clone(),
        ));

        let fetcher = RemoteFetcher::new(&config.rest.base_url, config.rest_timeout(), clock.clone())?;
        let prices: Arc<LivePriceCache> =
            Arc::new(ReadThroughCache::new(price_store.clone(), Arc::new(fetcher)));

        let analysis = AnalysisClient::new(
            &config.rest.analysis_url,
            config.analysis_timeout(),
            clock.clone(),
        )?;
        let generator = AnalysisGenerator::new(prices.clone(), analysis);
        let predictions: Arc<LivePredictionCache> = Arc::new(ReadThroughCache::new(
            prediction_store.clone(),
            Arc::new(generator),
        ));

        let connection = Arc::new(
            StreamConnection::new(config.connection_config()?, price_store.clone(), clock)
                .with_shutdown_token(shutdown.child_token()),
        );

        let service = Arc::new(PriceService::new(prices, predictions, connection.clone()));

        Ok(Self {
            config,
            price_store,
            prediction_store,
            connection,
            service,
            shutdown,
        })
    }

    pub fn service(&self) -> Arc<PriceService> {
        self.service.clone()
    }

    pub fn connection(&self) -> Arc<StreamConnection> {
        self.connection.clone()
    }

    /// Cancelling this token shuts the application down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until ctrl-c.
    pub async fn run(self) -> AppResult<()> {
        let listener = TcpListener::bind(&self.config.server.bind_addr).await?;

        let token = self.shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!(error = %e, "Failed to listen for ctrl-c, shutting down"),
            }
            token.cancel();
        });

        self.serve(listener).await
    }

    /// Start the feed and sweepers and serve the read API on `listener`
    /// until the shutdown token is cancelled.
    pub async fn serve(self, listener: TcpListener) -> AppResult<()> {
        info!(
            addr = ?listener.local_addr().ok(),
            symbols = self.config.feed.symbols.len(),
            "Starting tickr"
        );

        let connection = self.connection.clone();
        let feed_handle = tokio::spawn(async move { connection.run().await });

        let price_sweeper = spawn_sweeper(
            self.price_store.clone(),
            self.config.prices.sweep_interval(),
            self.shutdown.child_token(),
        );
        let prediction_sweeper = spawn_sweeper(
            self.prediction_store.clone(),
            self.config.predictions.sweep_interval(),
            self.shutdown.child_token(),
        );

        let router = create_router(self.service.clone());
        let shutdown = self.shutdown.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        // Server exit (clean or not) tears everything else down.
        self.shutdown.cancel();
        for handle in [feed_handle, price_sweeper, prediction_sweeper] {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }

        info!(
            prices = self.price_store.count(),
            predictions = self.prediction_store.count(),
            "Shut down"
        );
        served?;
        Ok(())
    }
}
