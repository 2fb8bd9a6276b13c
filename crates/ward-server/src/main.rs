//! Ward server — process bootstrap.
//!
//! Loads configuration, connects to SurrealDB, applies migrations, seeds
//! the system catalog, and wires the cache, enforcer and admin services.

use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ward_authz::{AnyPermissionCache, AuthzConfig, MemoryPermissionCache};
use ward_db::DbManager;

use ward_server::app::AppState;
use ward_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ward=info".parse()?),
        )
        .json()
        .init();

    info!("Starting Ward server...");

    let config = ServerConfig::from_env().context("load configuration")?;
    debug!(?config, "Configuration loaded");

    let manager = DbManager::connect(&config.db).await?;
    let applied = ward_db::run_migrations(manager.client())
        .await
        .context("apply schema migrations")?;
    info!(applied, "Schema ready");
    if config.seed_system {
        ward_db::seed_system_catalog(manager.client())
            .await
            .context("seed system catalog")?;
    }

    let cache = build_cache(&config).await?;
    let shutdown = CancellationToken::new();
    let purge_task = match &cache {
        AnyPermissionCache::Memory(memory) => Some(tokio::spawn(purge_expired(
            memory.clone(),
            config.authz.cache_ttl(),
            shutdown.clone(),
        ))),
        #[cfg(feature = "redis")]
        AnyPermissionCache::Redis(_) => None,
    };

    let _state = AppState::new(manager.client().clone(), cache, &config.authz);
    info!(
        cache_ttl_secs = config.authz.cache_ttl_secs,
        decision_timeout_ms = config.authz.decision_timeout_ms,
        "Ward server ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("listen for shutdown signal")?;
    info!("Shutdown signal received");

    shutdown.cancel();
    if let Some(task) = purge_task {
        let _ = task.await;
    }

    info!("Ward server stopped.");
    Ok(())
}

async fn build_cache(config: &ServerConfig) -> anyhow::Result<AnyPermissionCache> {
    match &config.redis_url {
        Some(url) => redis_cache(url, &config.authz).await,
        None => {
            info!("Using in-process permission cache");
            Ok(memory_cache(&config.authz))
        }
    }
}

fn memory_cache(authz: &AuthzConfig) -> AnyPermissionCache {
    AnyPermissionCache::Memory(MemoryPermissionCache::new(authz.cache_key_prefix.clone()))
}

#[cfg(feature = "redis")]
async fn redis_cache(url: &str, authz: &AuthzConfig) -> anyhow::Result<AnyPermissionCache> {
    let cache = ward_authz::RedisPermissionCache::connect(url, authz.cache_key_prefix.clone())
        .await
        .context("connect to Redis")?;
    info!("Using Redis permission cache");
    Ok(AnyPermissionCache::Redis(cache))
}

#[cfg(not(feature = "redis"))]
async fn redis_cache(_url: &str, authz: &AuthzConfig) -> anyhow::Result<AnyPermissionCache> {
    tracing::warn!(
        "WARD_REDIS_URL is set but the redis feature is disabled; using the in-process cache"
    );
    Ok(memory_cache(authz))
}

/// Drop expired entries once per TTL.
async fn purge_expired(cache: MemoryPermissionCache, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!(purged, remaining = cache.len(), "Purged expired permission sets");
                }
            }
        }
    }
}
