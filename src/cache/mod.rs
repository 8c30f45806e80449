//! Response caching: memoizes model responses by request fingerprint.
//!
//! # Response Caching Module
//!
//! Identical requests (same normalized query, same data snapshot) are served
//! from memory instead of calling the hosted model again.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | `get_or_fetch` memoization with hit/miss statistics |
//! | [`CacheBackend`] | Trait for storage backends |
//! | [`LruMemoryCache`] | Bounded in-memory store with LRU eviction |
//! | [`NullCache`] | No-op backend for disabling caching |
//! | [`CacheKeyGenerator`] | Fingerprints from query, snapshot and model |
//!
//! ## Example
//!
//! ```rust
//! use supplychain_assistant::cache::{CacheKeyGenerator, ResponseCache};
//! use std::num::NonZeroUsize;
//!
//! # async fn demo() -> supplychain_assistant::Result<()> {
//! let cache = ResponseCache::lru(NonZeroUsize::new(128).unwrap());
//! let key = CacheKeyGenerator::new().generate("ask", None, "What is EOQ?", None);
//! let first = cache.get_or_fetch(&key, || async { Ok("Economic order quantity".to_string()) }).await?;
//! let again = cache.get_or_fetch(&key, || async { Ok("unused".to_string()) }).await?;
//! assert!(!first.hit && again.hit);
//! # Ok(())
//! # }
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, LruMemoryCache, NullCache};
pub use key::{normalize_query, CacheKey, CacheKeyGenerator};
pub use manager::{CacheStats, Fetched, ResponseCache};
