mod cli;

use crate::cli::{CacheBackendArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use zipline_cache::{MemoryCache, NoopCache, RedisCache};
use zipline_core::{KvCache, UrlStore};
use zipline_gateway::{App, AppState};
use zipline_service::{CacheEngine, UrlService};
use zipline_storage::{InMemoryStore, MySqlStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = CLI::try_parse()?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting gateway HTTP server"
    );

    let store: Arc<dyn UrlStore> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(InMemoryStore::new()),
        StorageBackendArg::Mysql => {
            let mysql_url = config
                .mysql_url
                .as_deref()
                .context("mysql url is required when the storage backend is mysql")?;
            Arc::new(MySqlStore::connect(mysql_url).await?)
        }
    };

    let cache: Arc<dyn KvCache> = match config.cache {
        CacheBackendArg::InMemory => Arc::new(MemoryCache::new()),
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when the cache backend is redis")?;
            Arc::new(RedisCache::connect(redis_url).await?)
        }
        CacheBackendArg::Disabled => Arc::new(NoopCache::new()),
    };

    let engine = CacheEngine::new(store, cache, config.ttls());
    let service = Arc::new(UrlService::with_engine(engine));
    let state = AppState::new(service, config.base_url);

    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install the shutdown handler");
        return;
    }
    info!("shutdown signal received, stopping server");
}
