use anyhow::{Context, Result};
use kabu_cache::{MemCache, SqliteCache};
use kabu_core::cache::port::Cache;
use kabu_core::config::{AppConfig, CacheBackend};
use kabu_core::market::port::MarketDataProvider;
use kabu_feed::{CacheTtls, CachedProvider, EastmoneyProvider, FixtureProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// # Summary
/// 按配置打开缓存后端。
///
/// # Arguments
/// * `config`: 应用配置。
/// * `no_cache`: 命令行要求跳过缓存。
///
/// # Returns
/// 缓存被禁用时返回 `None`。
pub async fn open_cache(config: &AppConfig, no_cache: bool) -> Result<Option<Arc<dyn Cache>>> {
    let backend = if no_cache {
        CacheBackend::Disabled
    } else {
        config.cache.backend
    };
    let cache: Arc<dyn Cache> = match backend {
        CacheBackend::Disabled => return Ok(None),
        CacheBackend::Memory => Arc::new(MemCache::new()),
        CacheBackend::Sqlite => Arc::new(
            SqliteCache::open(&config.cache.path)
                .await
                .with_context(|| format!("failed to open cache {}", config.cache.path.display()))?,
        ),
    };
    Ok(Some(cache))
}

/// 清理过期条目，失败只记录告警，返回清理数量。
pub async fn purge_on_start(cache: &dyn Cache) -> usize {
    match cache.purge_expired().await {
        Ok(purged) => purged,
        Err(e) => {
            warn!(error = %e, "Cache purge failed");
            0
        }
    }
}

/// # Summary
/// 按配置装配数据源。
///
/// # Logic
/// 1. 配置了 `feed.fixture_dir` 时使用本地 JSON 数据源，否则使用东方财富。
/// 2. 未禁用缓存时，先清理过期条目，再用所选后端的缓存包装数据源。
///
/// # Arguments
/// * `config`: 应用配置。
/// * `no_cache`: 命令行要求跳过缓存。
pub async fn build_provider(config: &AppConfig, no_cache: bool) -> Result<Arc<dyn MarketDataProvider>> {
    let base: Arc<dyn MarketDataProvider> = match &config.feed.fixture_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using fixture data source");
            Arc::new(FixtureProvider::new(dir.clone()))
        }
        None => Arc::new(
            EastmoneyProvider::new(&config.feed).context("failed to build Eastmoney client")?,
        ),
    };

    let Some(cache) = open_cache(config, no_cache).await? else {
        return Ok(base);
    };
    let purged = purge_on_start(cache.as_ref()).await;
    info!(backend = ?config.cache.backend, purged, "Cache ready");
    Ok(Arc::new(CachedProvider::new(
        base,
        cache,
        CacheTtls::from(&config.cache),
    )))
}
