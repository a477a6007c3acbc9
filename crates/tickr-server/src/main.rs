//! tickr - live price and prediction cache service.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Live price and prediction cache service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TICKR_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP bind address from the config file
    #[arg(long)]
    bind: Option<String>,

    /// Emit JSON logs regardless of RUST_ENV
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // TLS provider must be installed before the first wss:// connect
    tickr_ws::init_crypto();

    let args = Args::parse();

    if args.json_logs {
        tickr_telemetry::init_logging_with(tickr_telemetry::LogFormat::Json)?;
    } else {
        tickr_telemetry::init_logging()?;
    }

    info!("Starting tickr v{}", env!("CARGO_PKG_VERSION"));

    let mut config = tickr_server::AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    info!(
        ws_url = %config.feed.ws_url,
        rest_url = %config.rest.base_url,
        bind = %config.server.bind_addr,
        "Configuration loaded"
    );

    let app = tickr_server::Application::new(config)?;
    app.run().await?;

    Ok(())
}
