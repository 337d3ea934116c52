use std::sync::Arc;

use carebook_api::config::ApiConfig;
use carebook_core::time::SystemClock;
use carebook_db::{Gateway, open_gateway};
use carebook_engine::{BookingEngine, ExpirySweeper};
use color_eyre::eyre::Result;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Open the datastore
    let gateway = open_gateway(&config.gateway_options()).await?;
    let engine = BookingEngine::new(gateway.clone(), Arc::new(SystemClock), config.booking_policy());

    // Start the expiry sweeper
    let sweeper_cancel = CancellationToken::new();
    let sweeper = ExpirySweeper::new(engine.clone(), config.sweep_interval).spawn(sweeper_cancel.clone());

    // Stop serving on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
        }
        info!("Shutdown requested");
        signal.cancel();
    });

    let served = carebook_api::start_server(&config, engine, shutdown).await;

    // Let an in-flight sweep finish before the datastore goes away
    sweeper_cancel.cancel();
    if let Err(err) = sweeper.await {
        error!(error = %err, "Expiry sweeper task failed");
    }
    gateway.close().await;

    served
}
