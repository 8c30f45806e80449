//! Cache backend implementations.

use super::key::CacheKey;
use crate::{Error, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a value. Implementations with recency tracking refresh it here.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>>;
    /// Store a value; returns the key evicted to make room, if any.
    async fn put(&self, key: &CacheKey, value: String) -> Result<Option<CacheKey>>;
    async fn remove(&self, key: &CacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    fn capacity(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Bounded in-memory store with least-recently-used eviction.
pub struct LruMemoryCache {
    entries: Mutex<LruCache<String, String>>,
}

impl LruMemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::runtime(format!("Failed to acquire cache lock: {}", e)))
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.iter().map(|(k, _)| k.clone()).collect())
    }
}

#[async_trait]
impl CacheBackend for LruMemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        Ok(self.lock()?.get(&key.hash).cloned())
    }
    async fn put(&self, key: &CacheKey, value: String) -> Result<Option<CacheKey>> {
        // `push` hands back the displaced pair: either the old value for this
        // key or the LRU entry that fell out.
        let displaced = self.lock()?.push(key.hash.clone(), value);
        Ok(displaced
            .filter(|(k, _)| *k != key.hash)
            .map(|(k, _)| CacheKey::new(k)))
    }
    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.lock()?.pop(&key.hash).is_some())
    }
    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
    fn capacity(&self) -> usize {
        self.lock().map(|c| c.cap().get()).unwrap_or(0)
    }
    fn name(&self) -> &'static str {
        "lru-memory"
    }
}

/// Stores nothing; every lookup misses.
pub struct NullCache;
impl NullCache {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheKey) -> Result<Option<String>> {
        Ok(None)
    }
    async fn put(&self, _: &CacheKey, _: String) -> Result<Option<CacheKey>> {
        Ok(None)
    }
    async fn remove(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    fn capacity(&self) -> usize {
        0
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
