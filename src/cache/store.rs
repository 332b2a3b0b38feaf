//! Bounded cache store with LRU-with-frequency-bias eviction.
//!
//! One store instance serves one resource class (images, API responses,
//! generic responses). Entries carry an optional TTL and an optional
//! component tag used by leak remediation.
//!
//! Uses parking_lot::Mutex for fast synchronous locking; victim selection
//! needs a consistent view of all entries, which rules out sharded maps.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::{CacheCapacity, CacheMetrics, PerformanceRating};
use crate::error::PulseError;
use crate::memory::ManagedCache;
use crate::telemetry::{record_cache_hit, record_cache_miss, record_evictions};

/// Configuration for a cache store.
#[derive(Debug, Clone)]
pub struct CacheStoreConfig {
    /// Store name, used in metrics labels and cleanup reports.
    pub name: String,
    pub max_entries: usize,
    pub max_bytes: usize,
    /// Applied to inserts that do not specify their own TTL.
    pub default_ttl: Option<Duration>,
    /// Pressure cleanup evicts down to this fraction of capacity.
    pub cleanup_target_ratio: f64,
    /// Hit-rate at or above this is rated `good`.
    pub hit_rate_good: f64,
    /// Hit-rate at or above this is rated `fair`.
    pub hit_rate_fair: f64,
}

impl Default for CacheStoreConfig {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            max_entries: 256,
            max_bytes: 16 * 1024 * 1024,
            default_ttl: None,
            cleanup_target_ratio: 0.7,
            hit_rate_good: 0.8,
            hit_rate_fair: 0.5,
        }
    }
}

impl CacheStoreConfig {
    /// Defaults for decoded image payloads: large byte budget, no TTL.
    pub fn image() -> Self {
        Self {
            name: "image".to_string(),
            max_entries: 256,
            max_bytes: 64 * 1024 * 1024,
            default_ttl: None,
            ..Self::default()
        }
    }

    /// Defaults for API responses: small payloads, 5 minute TTL.
    pub fn api_response() -> Self {
        Self {
            name: "api_response".to_string(),
            max_entries: 512,
            max_bytes: 8 * 1024 * 1024,
            default_ttl: Some(Duration::from_secs(300)),
            ..Self::default()
        }
    }

    /// Defaults for generic response payloads.
    pub fn generic() -> Self {
        Self::default()
    }
}

/// An opaque cached payload with its byte size.
///
/// The store never interprets the payload; callers supply whatever bytes
/// they fetched. `size_bytes` may be the exact payload length or a caller
/// estimate (e.g., decoded image dimensions).
#[derive(Debug, Clone)]
pub struct CachedValue {
    data: Arc<Vec<u8>>,
    size_bytes: usize,
}

impl CachedValue {
    /// Wrap a payload; size is the payload length.
    pub fn new(data: Vec<u8>) -> Self {
        let size_bytes = data.len();
        Self {
            data: Arc::new(data),
            size_bytes,
        }
    }

    /// Wrap a payload with a caller-estimated size.
    pub fn with_size(data: Vec<u8>, size_bytes: usize) -> Self {
        Self {
            data: Arc::new(data),
            size_bytes,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

struct CacheEntry {
    value: CachedValue,
    inserted_at: Instant,
    last_accessed_at: Instant,
    access_count: u64,
    ttl: Option<Duration>,
    component_tag: Option<String>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(self.inserted_at) > ttl,
            None => false,
        }
    }

    /// Victim score: frequency biased by recency. Repeatedly accessed
    /// entries survive large one-off fetches even when those are newer.
    fn score(&self, now: Instant) -> f64 {
        let idle_secs = now.duration_since(self.last_accessed_at).as_secs_f64();
        self.access_count as f64 / (idle_secs + 1.0)
    }
}

struct StoreInner {
    entries: HashMap<String, CacheEntry>,
    current_bytes: usize,
    hits: u64,
    misses: u64,
}

/// Bounded key-value cache for one resource class.
///
/// Invariant: `current_bytes <= max_bytes` and `len() <= max_entries` after
/// every mutating operation returns. The store exclusively owns its entries'
/// lifecycle; eviction happens only inside `insert`, `get` (lazy TTL), and
/// the cleanup paths.
pub struct CacheStore {
    config: CacheStoreConfig,
    inner: Mutex<StoreInner>,
}

impl CacheStore {
    pub fn new(config: CacheStoreConfig) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                entries: HashMap::with_capacity(config.max_entries.min(1024)),
                current_bytes: 0,
                hits: 0,
                misses: 0,
            }),
            config,
        }
    }

    /// Store sized for decoded image payloads.
    pub fn image() -> Self {
        Self::new(CacheStoreConfig::image())
    }

    /// Store sized for API response bodies, with a default TTL.
    pub fn api_response() -> Self {
        Self::new(CacheStoreConfig::api_response())
    }

    /// General-purpose store with the default configuration.
    pub fn generic() -> Self {
        Self::new(CacheStoreConfig::generic())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn capacity(&self) -> CacheCapacity {
        CacheCapacity {
            max_entries: self.config.max_entries,
            max_bytes: self.config.max_bytes,
        }
    }

    /// Look up a cached value.
    ///
    /// A hit refreshes recency and frequency tracking. An absent or
    /// TTL-expired key counts as a miss; expired entries are evicted
    /// lazily on this read.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let mut hit = None;
        let mut expired = false;
        if let Some(entry) = inner.entries.get_mut(key) {
            if entry.is_expired(now) {
                expired = true;
            } else {
                entry.last_accessed_at = now;
                entry.access_count += 1;
                hit = Some(entry.value.clone());
            }
        }

        match hit {
            Some(value) => {
                inner.hits += 1;
                record_cache_hit(&self.config.name);
                Some(value)
            }
            None => {
                if expired {
                    Self::remove_locked(&mut inner, key);
                }
                inner.misses += 1;
                record_cache_miss(&self.config.name);
                None
            }
        }
    }

    /// Insert or replace an entry with the store's default TTL.
    pub fn insert(&self, key: impl Into<String>, value: CachedValue) -> Result<(), PulseError> {
        self.insert_with(key, value, None, None)
    }

    /// Insert or replace an entry.
    ///
    /// Victims are evicted *before* insertion so the capacity invariant
    /// holds when this returns. A single item larger than `max_bytes` is
    /// rejected with `EntryTooLarge` and the store is left unchanged.
    pub fn insert_with(
        &self,
        key: impl Into<String>,
        value: CachedValue,
        ttl: Option<Duration>,
        component_tag: Option<String>,
    ) -> Result<(), PulseError> {
        let key = key.into();
        if key.is_empty() {
            return Err(PulseError::InvalidKey("empty key".to_string()));
        }
        if value.size_bytes > self.config.max_bytes {
            return Err(PulseError::EntryTooLarge {
                store: self.config.name.clone(),
                size: value.size_bytes,
                limit: self.config.max_bytes,
            });
        }

        let now = Instant::now();
        let size = value.size_bytes;
        let mut inner = self.inner.lock();

        // Replacement: retire the old entry's accounting first.
        Self::remove_locked(&mut inner, &key);

        Self::evict_expired_locked(&mut inner, now, &self.config.name);

        let mut evicted = 0usize;
        while inner.entries.len() >= self.config.max_entries
            || inner.current_bytes + size > self.config.max_bytes
        {
            if !Self::evict_victim_locked(&mut inner, now) {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            record_evictions(&self.config.name, evicted);
            tracing::trace!(
                store = %self.config.name,
                evicted,
                "evicted victims to fit insert"
            );
        }

        inner.current_bytes += size;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                last_accessed_at: now,
                access_count: 0,
                ttl: ttl.or(self.config.default_ttl),
                component_tag,
            },
        );
        Ok(())
    }

    /// Remove a specific key. Returns true if the key was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        Self::remove_locked(&mut inner, key)
    }

    /// Drop all entries and reset byte accounting. Hit/miss counters are
    /// retained.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.current_bytes = 0;
    }

    /// Whether a key is present and unexpired. Does not count as an access.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)
            .map(|e| !e.is_expired(now))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn current_bytes(&self) -> usize {
        self.inner.lock().current_bytes
    }

    /// Proactive cleanup for memory pressure.
    ///
    /// Evicts all expired entries, then evicts by victim score down to
    /// `cleanup_target_ratio` of both capacity limits. Returns the number
    /// of entries evicted.
    pub fn perform_cleanup(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let mut evicted = Self::evict_expired_locked(&mut inner, now, &self.config.name);

        let ratio = self.config.cleanup_target_ratio;
        if ratio < 1.0 {
            let target_bytes = (self.config.max_bytes as f64 * ratio) as usize;
            let target_entries = (self.config.max_entries as f64 * ratio) as usize;
            while inner.current_bytes > target_bytes || inner.entries.len() > target_entries {
                if !Self::evict_victim_locked(&mut inner, now) {
                    break;
                }
                evicted += 1;
            }
        }

        if evicted > 0 {
            record_evictions(&self.config.name, evicted);
            tracing::debug!(store = %self.config.name, evicted, "cleanup evicted entries");
        }
        evicted
    }

    /// Evict every entry tagged with the given component type. Used as the
    /// remediation path when leak detection flags a type.
    pub fn evict_component(&self, component_type: &str) -> usize {
        let mut inner = self.inner.lock();
        let keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.component_tag.as_deref() == Some(component_type))
            .map(|(k, _)| k.clone())
            .collect();
        let evicted = keys.len();
        for key in keys {
            Self::remove_locked(&mut inner, &key);
        }
        if evicted > 0 {
            record_evictions(&self.config.name, evicted);
        }
        evicted
    }

    /// Snapshot hit/miss accounting and occupancy.
    ///
    /// `hit_rate` is a lifetime ratio, defined as `0.0` before the first
    /// access. The rating compares `hit_rate` against the configured
    /// thresholds.
    pub fn performance_metrics(&self) -> CacheMetrics {
        let inner = self.inner.lock();
        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            inner.hits as f64 / total as f64
        };
        let rating = if hit_rate >= self.config.hit_rate_good {
            PerformanceRating::Good
        } else if hit_rate >= self.config.hit_rate_fair {
            PerformanceRating::Fair
        } else {
            PerformanceRating::Poor
        };
        CacheMetrics {
            store: self.config.name.clone(),
            hit_rate,
            hits: inner.hits,
            misses: inner.misses,
            current_bytes: inner.current_bytes,
            current_count: inner.entries.len(),
            rating,
        }
    }

    fn remove_locked(inner: &mut StoreInner, key: &str) -> bool {
        if let Some(entry) = inner.entries.remove(key) {
            inner.current_bytes = inner.current_bytes.saturating_sub(entry.value.size_bytes);
            true
        } else {
            false
        }
    }

    /// TTL-expired entries are always evicted before scored eviction runs.
    fn evict_expired_locked(inner: &mut StoreInner, now: Instant, store: &str) -> usize {
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        let count = expired.len();
        for key in expired {
            Self::remove_locked(inner, &key);
        }
        if count > 0 {
            tracing::trace!(store, expired = count, "evicted expired entries");
        }
        count
    }

    /// Evict the lowest-scoring entry; ties break by oldest insertion.
    fn evict_victim_locked(inner: &mut StoreInner, now: Instant) -> bool {
        let victim = inner
            .entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.score(now)
                    .partial_cmp(&b.score(now))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.inserted_at.cmp(&b.inserted_at))
            })
            .map(|(k, _)| k.clone());
        match victim {
            Some(key) => Self::remove_locked(inner, &key),
            None => false,
        }
    }
}

impl ManagedCache for CacheStore {
    fn name(&self) -> &str {
        CacheStore::name(self)
    }

    fn len(&self) -> usize {
        CacheStore::len(self)
    }

    fn current_bytes(&self) -> usize {
        CacheStore::current_bytes(self)
    }

    fn capacity(&self) -> CacheCapacity {
        CacheStore::capacity(self)
    }

    fn perform_cleanup(&self) -> Result<usize, PulseError> {
        Ok(CacheStore::perform_cleanup(self))
    }

    fn performance_metrics(&self) -> CacheMetrics {
        CacheStore::performance_metrics(self)
    }

    fn evict_component(&self, component_type: &str) -> usize {
        CacheStore::evict_component(self, component_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(access_count: u64, inserted_at: Instant, last_accessed_at: Instant) -> CacheEntry {
        CacheEntry {
            value: CachedValue::new(vec![0u8; 8]),
            inserted_at,
            last_accessed_at,
            access_count,
            ttl: None,
            component_tag: None,
        }
    }

    #[test]
    fn score_prefers_accessed_entries() {
        let now = Instant::now();
        let read = entry(2, now, now);
        let unread = entry(0, now, now);
        assert!(read.score(now) > unread.score(now));
    }

    #[test]
    fn score_decays_with_idle_time() {
        let base = Instant::now();
        let now = base + Duration::from_secs(10);
        let recent = entry(1, base, base + Duration::from_secs(9));
        let stale = entry(1, base, base);
        assert!(recent.score(now) > stale.score(now));
    }

    #[test]
    fn unread_entries_all_score_zero() {
        let base = Instant::now();
        let now = base + Duration::from_secs(5);
        let a = entry(0, base, base);
        let b = entry(0, base + Duration::from_secs(1), base + Duration::from_secs(1));
        assert_eq!(a.score(now), 0.0);
        assert_eq!(b.score(now), 0.0);
    }
}
