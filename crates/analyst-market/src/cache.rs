//! TTL cache for market snapshots

use crate::config::MarketConfig;
use crate::error::Result;
use crate::provider::MarketDataProvider;
use analyst_core::{Interval, MarketSnapshot, Period, Symbol};
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key for one snapshot request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub symbol: Symbol,
    pub period: Period,
    pub interval: Interval,
}

impl SnapshotKey {
    pub fn new(symbol: Symbol, period: Period, interval: Interval) -> Self {
        Self {
            symbol,
            period,
            interval,
        }
    }
}

/// Thread-safe snapshot cache; clones share the same storage
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Arc<RwLock<TimedCache<SnapshotKey, MarketSnapshot>>>,
}

impl SnapshotCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, key: &SnapshotKey) -> Option<MarketSnapshot> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: SnapshotKey, snapshot: MarketSnapshot) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, snapshot);
    }

    /// Return the cached snapshot or run `fetcher` and cache its success
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: SnapshotKey,
        fetcher: F,
    ) -> std::result::Result<MarketSnapshot, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<MarketSnapshot, E>>,
    {
        if let Some(snapshot) = self.get(&key).await {
            debug!(symbol = %key.symbol, "snapshot cache hit");
            return Ok(snapshot);
        }

        debug!(symbol = %key.symbol, "snapshot cache miss");
        let snapshot = fetcher().await?;
        self.insert(key, snapshot.clone()).await;
        Ok(snapshot)
    }

    pub async fn invalidate(&self, key: &SnapshotKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Caching decorator over any [`MarketDataProvider`]
pub struct CachedMarketData<P> {
    inner: P,
    cache: SnapshotCache,
}

impl<P: MarketDataProvider> CachedMarketData<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: SnapshotCache::new(ttl),
        }
    }

    /// Wrap `inner` using the TTL from `config`
    pub fn from_config(inner: P, config: &MarketConfig) -> Self {
        Self::new(inner, config.cache_ttl)
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedMarketData<P> {
    async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<MarketSnapshot> {
        let key = SnapshotKey::new(symbol.clone(), period, interval);
        self.cache
            .get_or_fetch(key, || self.inner.fetch(symbol, period, interval))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
