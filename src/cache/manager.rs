//! Memoizing response cache.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::backend::{CacheBackend, LruMemoryCache, NullCache};
use super::key::CacheKey;
use crate::monitor::{Counter, PerformanceMonitor};
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Value returned by [`ResponseCache::get_or_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub value: String,
    /// True when served from the cache without calling the fetcher.
    pub hit: bool,
}

/// Memoizes fetched responses by fingerprint.
///
/// Entries are never invalidated within a run; the backend bounds memory.
pub struct ResponseCache {
    backend: Box<dyn CacheBackend>,
    stats: AtomicStats,
    monitor: Option<Arc<PerformanceMonitor>>,
}

impl ResponseCache {
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self {
            backend,
            stats: AtomicStats::default(),
            monitor: None,
        }
    }

    /// LRU cache holding at most `capacity` responses.
    pub fn lru(capacity: NonZeroUsize) -> Self {
        Self::new(Box::new(LruMemoryCache::new(capacity)))
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Box::new(NullCache::new()))
    }

    /// Mirror hit/miss counts into a shared monitor.
    pub fn with_monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Return the cached value for `key`, or run `fetch`, store its result and return it.
    ///
    /// A failing fetch is propagated and nothing is stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<Fetched>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(value) = self.backend.get(key).await? {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            self.bump(Counter::CacheHits);
            debug!(key = %key, "cache hit");
            return Ok(Fetched { value, hit: true });
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        self.bump(Counter::CacheMisses);
        debug!(key = %key, "cache miss");

        let value = fetch().await?;
        self.insert(key, value.clone()).await?;
        Ok(Fetched { value, hit: false })
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        self.backend.get(key).await
    }

    pub async fn insert(&self, key: &CacheKey, value: String) -> Result<()> {
        let evicted = self.backend.put(key, value).await?;
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
        if let Some(old) = evicted {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(evicted = %old, "cache eviction");
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    pub async fn len(&self) -> Result<usize> {
        self.backend.len().await
    }

    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn bump(&self, counter: Counter) {
        if let Some(m) = &self.monitor {
            m.incr(counter);
        }
    }
}
