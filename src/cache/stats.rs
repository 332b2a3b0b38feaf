//! Cache metrics snapshot types.

use serde::{Deserialize, Serialize};

/// Coarse performance rating shared by cache stores and benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceRating {
    Good,
    Fair,
    Poor,
    /// The data source could not produce a measurement.
    Unknown,
}

impl PerformanceRating {
    /// Whether this rating counts as a pass in score aggregation.
    pub fn is_passing(self) -> bool {
        matches!(self, Self::Good | Self::Fair)
    }
}

impl std::fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Point-in-time metrics for one cache store.
///
/// `hit_rate` is `hits / (hits + misses)` over the store's lifetime, defined
/// as `0.0` before the first access. Counters are lifetime counters, not
/// windowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub store: String,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub current_bytes: usize,
    pub current_count: usize,
    pub rating: PerformanceRating,
}

/// Configured capacity limits of a store, exposed for validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheCapacity {
    pub max_entries: usize,
    pub max_bytes: usize,
}
