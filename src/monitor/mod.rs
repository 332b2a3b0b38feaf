//! Performance monitoring.
//!
//! Orchestrates timed measurements and micro-benchmarks, and merges cache
//! and memory snapshots into a single scored report.

mod benchmarks;
mod report;
mod timing;

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;

use crate::error::PulseError;
use crate::memory::MemoryManager;

pub use benchmarks::BenchmarkOutcome;
pub use report::PerformanceReport;
pub use timing::{TimerBenchmark, TimingRegistry};

/// Orchestrates benchmarks and report generation over a memory manager's
/// registered stores.
pub struct PerformanceMonitor {
    memory: MemoryManager,
    timings: TimingRegistry,
    /// Latest outcome per benchmark name.
    benchmark_results: Mutex<HashMap<String, BenchmarkOutcome>>,
}

impl PerformanceMonitor {
    pub fn new(memory: MemoryManager) -> Self {
        Self {
            memory,
            timings: TimingRegistry::new(),
            benchmark_results: Mutex::new(HashMap::new()),
        }
    }

    /// Execute `f` and record its wall time under `label`. The result,
    /// success or error, passes through unchanged.
    pub fn measure<R>(&self, label: &str, f: impl FnOnce() -> R) -> R {
        self.timings.measure(label, f)
    }

    /// Await `fut` and record its wall time under `label`.
    pub async fn measure_async<F: Future>(&self, label: &str, fut: F) -> F::Output {
        self.timings.measure_async(label, fut).await
    }

    /// Open an interaction window; measures recorded until
    /// `stop_timer_benchmark` are aggregated.
    pub fn start_timer_benchmark(&self) {
        self.timings.start_window();
    }

    /// Close the window and return count/mean/p95 over its measures.
    pub fn stop_timer_benchmark(&self) -> TimerBenchmark {
        self.timings.stop_window()
    }

    /// Scroll micro-benchmark over `sample_count` synthetic frames.
    pub fn benchmark_scroll(&self, sample_count: usize) -> BenchmarkOutcome {
        self.run("scroll", || benchmarks::run_scroll(sample_count))
    }

    /// Orientation-change micro-benchmark.
    pub fn benchmark_orientation(&self) -> BenchmarkOutcome {
        self.run("orientation", benchmarks::run_orientation)
    }

    /// Capacity and hit-rate validation of every registered store.
    pub fn validate_cache(&self) -> BenchmarkOutcome {
        self.run("cache_validation", || {
            benchmarks::run_cache_validation(&self.memory)
        })
    }

    /// Cached-footprint utilization against the memory budget.
    pub fn analyze_bundle(&self) -> BenchmarkOutcome {
        self.run("bundle_analysis", || {
            benchmarks::run_bundle_analysis(&self.memory)
        })
    }

    /// Merge the latest memory statistics, per-store metrics, and
    /// benchmark results into a scored report.
    ///
    /// Store metrics are gathered concurrently. Missing sources degrade to
    /// defaults rather than failing the report.
    pub async fn generate_report(&self) -> PerformanceReport {
        let stores = self.memory.live_stores();
        let (memory_stats, store_metrics) = futures::join!(
            async { self.memory.statistics() },
            futures::future::join_all(
                stores
                    .iter()
                    .map(|s| async move { s.performance_metrics() }),
            ),
        );

        let benchmarks: Vec<BenchmarkOutcome> = {
            let results = self.benchmark_results.lock();
            let mut list: Vec<BenchmarkOutcome> = results.values().cloned().collect();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            list
        };
        let leak_suspects = self.memory.detect_leaks();

        PerformanceReport::compute(memory_stats, store_metrics, benchmarks, &leak_suspects)
    }

    /// A failed benchmark degrades to an `unknown` outcome; it never
    /// crashes report generation.
    fn run(
        &self,
        name: &str,
        f: impl FnOnce() -> Result<BenchmarkOutcome, PulseError>,
    ) -> BenchmarkOutcome {
        let outcome = self.timings.measure(name, f).unwrap_or_else(|e| {
            tracing::warn!(benchmark = name, error = %e, "benchmark failed");
            BenchmarkOutcome::unknown(name, &e.to_string())
        });
        self.benchmark_results
            .lock()
            .insert(outcome.name.clone(), outcome.clone());
        outcome
    }
}
