//! Bounded resource caches.
//!
//! One `CacheStore` per resource class (image, API response, generic
//! response), each with LRU+TTL eviction and hit/miss accounting.

mod stats;
mod store;

pub use stats::{CacheCapacity, CacheMetrics, PerformanceRating};
pub use store::{CacheStore, CacheStoreConfig, CachedValue};
