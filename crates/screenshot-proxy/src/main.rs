//! Portfolio screenshot proxy
//!
//! Serves project thumbnails for the portfolio site. Screenshots are
//! rendered by a third-party service and kept in a disk cache keyed by
//! page URL and viewport size.

mod config;
mod error;
mod fetcher;
mod placeholder;
mod server;
mod types;

use crate::config::ServiceConfig;
use crate::error::{ProxyError, Result};
use crate::fetcher::ScreenshotFetcher;
use crate::server::{start_server, ServerState, SharedState};
use screenshot_cache::ScreenshotCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("screenshot_proxy=info".parse()?)
        .add_directive("screenshot_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting portfolio screenshot proxy...");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache.cache_dir);
    info!(
        "Max cache size: {} MB",
        config.cache.max_size / (1024 * 1024)
    );
    info!("Cache max age: {} seconds", config.cache.max_age.as_secs());
    info!("Screenshot service: {}", config.screenshot_api_url);

    // Create cache and fetcher
    let cache = ScreenshotCache::new(config.cache);
    cache.init().await?;

    let fetcher = ScreenshotFetcher::new(
        config.screenshot_api_url,
        config.screenshot_api_key,
        config.fetch_timeout,
    )?;

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(cache, fetcher));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
