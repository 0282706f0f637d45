use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use ticker_forecast::coinbase::ws::CoinbaseWsClient;
use ticker_forecast::config::Config;
use ticker_forecast::engine::MetricsEngine;
use ticker_forecast::model::snapshot::MetricsSnapshot;
use ticker_forecast::report;
use ticker_forecast::ticker_store::TickerStore;

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .logging
            .level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.with_ansi(false).json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let cli_product = std::env::args().nth(1);
    let product_id = config.product_id(cli_product.as_deref());
    let engine_cfg = config.engine.engine_config();

    tracing::info!(
        product = %product_id,
        ws_url = %config.feed.ws_url,
        mode = ?engine_cfg.forecast_mode,
        alignment = ?engine_cfg.error_alignment,
        "Starting ticker-forecast"
    );

    let store = Arc::new(TickerStore::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<MetricsSnapshot>(16);

    let feed = CoinbaseWsClient::new(&config.feed.ws_url, &product_id);
    let feed_store = Arc::clone(&store);
    let feed_shutdown = shutdown_rx.clone();
    let feed_task = tokio::spawn(async move {
        if let Err(e) = feed.connect_and_run(feed_store, feed_shutdown).await {
            tracing::error!(error = %e, "feed task failed");
        }
    });

    let engine = MetricsEngine::new(Arc::clone(&store), engine_cfg);
    let engine_task = tokio::spawn(engine.run(snapshot_tx, shutdown_rx.clone()));
    let reporter_task = tokio::spawn(report::run_reporter(snapshot_rx, config.report.format));

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = ctrl_c_shutdown.send(true);
    });

    let engine_result = engine_task.await.context("engine task panicked")?;
    // engine may also exit on a store error, so stop the feed explicitly
    let _ = shutdown_tx.send(true);
    if let Err(e) = &engine_result {
        let reason = format!("{:#}", e);
        tracing::error!(error = %reason, "metrics engine stopped");
    }

    feed_task.await.context("feed task panicked")?;
    reporter_task
        .await
        .context("reporter task panicked")?
        .context("reporter failed")?;

    tracing::info!("Shutdown complete");
    engine_result
}
