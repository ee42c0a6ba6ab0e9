use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

mod api;
mod cache;
mod config;
mod error;
mod games;
mod providers;
mod upstream;

use api::AppState;
use cache::{FileCache, Refresher};
use config::Config;
use providers::{NbaProvider, SoccerProvider};
use upstream::{JsonSource, UpstreamClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let cache = FileCache::new(config.cache_dir()?);
    cache.ensure_dir().await?;
    info!("Cache directory: {}", cache.dir().display());

    let static_dir = config.static_dir()?;
    info!("Serving static files from {}", static_dir.display());

    let source: Arc<dyn JsonSource> = Arc::new(UpstreamClient::new(config.request_timeout())?);

    let state = AppState {
        refresher: Refresher::new(cache),
        nba: NbaProvider::new(source.clone(), config.nba_settings()),
        soccer: SoccerProvider::new(source, config.soccer_settings()),
    };
    let app = api::router(state, &static_dir);

    let addr = config.listen_addr()?;
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
