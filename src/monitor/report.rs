//! Performance report aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheMetrics, PerformanceRating};
use crate::memory::{LeakSuspect, MemoryStatistics, PressureLevel};
use crate::monitor::benchmarks::BenchmarkOutcome;

/// Score weights: cache hit-rate average, inverse memory pressure,
/// benchmark pass rate.
const WEIGHT_CACHE: f64 = 0.4;
const WEIGHT_MEMORY: f64 = 0.4;
const WEIGHT_BENCHMARKS: f64 = 0.2;

/// Aggregated snapshot of cache, memory, and benchmark state.
///
/// A pure projection of the other components at the sampling instant;
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Weighted composite in `0..=100`.
    pub overall_score: f64,
    pub memory: MemoryStatistics,
    pub stores: Vec<CacheMetrics>,
    pub benchmarks: Vec<BenchmarkOutcome>,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl PerformanceReport {
    /// Combine the latest snapshots into a scored report.
    ///
    /// Missing sources degrade to documented defaults rather than aborting:
    /// no stores means a cache component of 0, no benchmarks a pass rate
    /// of 0.
    pub fn compute(
        memory: MemoryStatistics,
        stores: Vec<CacheMetrics>,
        benchmarks: Vec<BenchmarkOutcome>,
        leak_suspects: &[LeakSuspect],
    ) -> Self {
        let cache_component = if stores.is_empty() {
            0.0
        } else {
            stores.iter().map(|m| m.hit_rate).sum::<f64>() / stores.len() as f64
        };
        let memory_component = (1.0 - memory.usage_ratio).clamp(0.0, 1.0);
        let benchmark_component = if benchmarks.is_empty() {
            0.0
        } else {
            let passing = benchmarks.iter().filter(|b| b.rating.is_passing()).count();
            passing as f64 / benchmarks.len() as f64
        };

        let overall_score = 100.0
            * (WEIGHT_CACHE * cache_component
                + WEIGHT_MEMORY * memory_component
                + WEIGHT_BENCHMARKS * benchmark_component);

        let mut critical_issues = Vec::new();
        let mut warnings = Vec::new();

        if memory.pressure >= PressureLevel::Critical {
            critical_issues.push(format!(
                "memory pressure {} at {:.0}% of budget",
                memory.pressure,
                memory.usage_ratio * 100.0
            ));
        }
        for store in &stores {
            if store.rating == PerformanceRating::Poor {
                warnings.push(format!(
                    "cache '{}' hit rate {:.2} below fair threshold",
                    store.store, store.hit_rate
                ));
            }
        }
        for bench in &benchmarks {
            if bench.rating == PerformanceRating::Poor {
                warnings.push(format!("benchmark '{}' rated poor", bench.name));
            }
        }
        for suspect in leak_suspects {
            warnings.push(format!(
                "suspected leak in '{}': {}",
                suspect.component_type, suspect.suspicion_reason
            ));
        }

        Self {
            overall_score,
            memory,
            stores,
            benchmarks,
            critical_issues,
            warnings,
            generated_at: Utc::now(),
        }
    }
}
