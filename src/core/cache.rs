//! Time-bound read cache.
//!
//! Results are stored as serialized JSON keyed by query kind and predicate
//! fingerprint. Entries expire after a fixed TTL per kind, and every
//! mutation clears the whole cache.

use crate::models::config::CacheConfig;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which read produced a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Summary,
    DailyCounts,
    List,
    Facets,
}

/// Cache key: query kind plus a fingerprint of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: QueryKind,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(kind: QueryKind, fingerprint: impl Into<String>) -> Self {
        Self {
            kind,
            fingerprint: fingerprint.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResult {
    value: Arc<[u8]>,
    cached_at: Instant,
}

impl CachedResult {
    fn new(value: Vec<u8>) -> Self {
        Self {
            value: value.into(),
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// TTL-bounded cache of read results.
pub struct ReadCache {
    entries: DashMap<CacheKey, CachedResult>,
    read_ttl: Duration,
    facet_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl ReadCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttls(
            Duration::from_secs(config.read_ttl_secs),
            Duration::from_secs(config.facet_ttl_secs),
        )
    }

    pub fn with_ttls(read_ttl: Duration, facet_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            read_ttl,
            facet_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn ttl(&self, kind: QueryKind) -> Duration {
        match kind {
            QueryKind::Facets => self.facet_ttl,
            _ => self.read_ttl,
        }
    }

    /// Cached value, or `None` when absent, expired or undecodable.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(self.ttl(key.kind)) {
                if let Ok(value) = serde_json::from_slice(&entry.value) {
                    return Some(value);
                }
            }
        }
        // The shard guard must be released before removing.
        self.entries.remove(key);
        None
    }

    /// Store a value.
    pub fn insert<T: Serialize>(&self, key: CacheKey, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.entries.insert(key, CachedResult::new(bytes));
            }
            Err(e) => tracing::warn!("Not caching {:?}: {}", key.kind, e),
        }
    }

    /// Read through the cache: return a fresh cached value or compute,
    /// store and return a new one. Errors are not cached.
    pub fn get_or_try_insert_with<T, E, F>(&self, key: CacheKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit: {:?}", key.kind);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        self.insert(key, &value);
        Ok(value)
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        tracing::debug!("Cache cleared ({} entries)", dropped);
    }

    /// Drop expired entries.
    pub fn prune_expired(&self) {
        self.entries
            .retain(|key, entry| !entry.is_expired(self.ttl(key.kind)));
    }

    /// Entry count and read-through hit/miss totals since creation.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn key(kind: QueryKind) -> CacheKey {
        CacheKey::new(kind, "i.started_at BETWEEN :date_from AND :date_to")
    }

    #[test]
    fn test_read_through_hits_cache() {
        let cache = ReadCache::default();
        let calls = Cell::new(0);
        let compute = || -> Result<i64, ()> {
            calls.set(calls.get() + 1);
            Ok(42)
        };

        assert_eq!(cache.get_or_try_insert_with(key(QueryKind::Summary), compute), Ok(42));
        assert_eq!(cache.get_or_try_insert_with(key(QueryKind::Summary), compute), Ok(42));
        assert_eq!(calls.get(), 1);
        let stats = cache.stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ReadCache::default();
        let failed: Result<i64, &str> =
            cache.get_or_try_insert_with(key(QueryKind::List), || Err("boom"));
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_all_clears_every_kind() {
        let cache = ReadCache::default();
        cache.insert(key(QueryKind::Summary), &1i64);
        cache.insert(key(QueryKind::Facets), &vec!["iOS".to_string()]);
        assert_eq!(cache.len(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<i64>(&key(QueryKind::Summary)), None);
    }

    #[test]
    fn test_entries_expire() {
        let cache = ReadCache::with_ttls(Duration::from_millis(1), Duration::from_secs(60));
        cache.insert(key(QueryKind::List), &7i64);
        cache.insert(key(QueryKind::Facets), &8i64);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get::<i64>(&key(QueryKind::List)), None);
        assert_eq!(cache.get::<i64>(&key(QueryKind::Facets)), Some(8));
    }

    #[test]
    fn test_prune_expired() {
        let cache = ReadCache::with_ttls(Duration::from_millis(1), Duration::from_millis(1));
        cache.insert(key(QueryKind::DailyCounts), &1i64);
        std::thread::sleep(Duration::from_millis(20));
        cache.prune_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_different_fingerprints_are_separate() {
        let cache = ReadCache::default();
        cache.insert(CacheKey::new(QueryKind::Summary, "a"), &1i64);
        cache.insert(CacheKey::new(QueryKind::Summary, "b"), &2i64);
        assert_eq!(cache.get::<i64>(&CacheKey::new(QueryKind::Summary, "a")), Some(1));
        assert_eq!(cache.get::<i64>(&CacheKey::new(QueryKind::Summary, "b")), Some(2));
    }
}
