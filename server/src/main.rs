//! ratesvc binary.
//!
//! Loads configuration, performs the startup snapshot fetch (fatal on
//! failure), and serves the rates API.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratesvc_common::CurrencyCode;
use ratesvc_rates::{FixerProvider, RateCache, RateResolver};
use ratesvc_server::config::ServerConfig;
use ratesvc_server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting ratesvc");

    let config = ServerConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let provider = Arc::new(
        FixerProvider::new(
            config.upstream_url.clone(),
            CurrencyCode::new(config.reference_currency.clone()),
            config.upstream_timeout,
        )
        .context("Building upstream client")?,
    );

    // There is no serving state without one successful fetch.
    let cache = Arc::new(
        RateCache::warm(provider.clone())
            .await
            .context("Initial snapshot fetch failed")?,
    );
    let resolver = Arc::new(RateResolver::new(cache.clone(), provider));

    if let Some(interval) = config.refresh_interval {
        let cache = cache.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The warm fetch covers the first tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = cache.refresh().await {
                    warn!(error = %e, "Snapshot refresh failed, keeping previous snapshot");
                }
            }
        });
    }

    let app = router(AppState { cache, resolver });

    let addr = format!("{}:{}", config.listen_addr, config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Binding {addr}"))?;
    info!(listen_addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for Ctrl+C");
            info!("Shutdown signal received");
        })
        .await?;

    info!("ratesvc shutdown complete");
    Ok(())
}
