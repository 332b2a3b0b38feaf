//! Wall-time measurement registry.
//!
//! `measure` brackets a closure and records its elapsed time under a label;
//! the closure's result passes through unchanged, and the timing is recorded
//! whether it succeeded or not.

use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Samples retained per label. Oldest samples roll off.
const MAX_SAMPLES_PER_LABEL: usize = 256;

/// Aggregate statistics for a timer-benchmark window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerBenchmark {
    pub count: usize,
    pub mean_ms: f64,
    pub p95_ms: f64,
}

struct Sample {
    at: Instant,
    elapsed_ms: f64,
}

struct TimingState {
    samples: HashMap<String, Vec<Sample>>,
    window_start: Option<Instant>,
}

/// Thread-safe store of labeled wall-time samples.
pub struct TimingRegistry {
    state: Mutex<TimingState>,
}

impl TimingRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TimingState {
                samples: HashMap::new(),
                window_start: None,
            }),
        }
    }

    /// Execute `f` and record its wall time under `label`.
    pub fn measure<R>(&self, label: &str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.record(label, start.elapsed().as_secs_f64() * 1000.0);
        result
    }

    /// Await `fut` and record its wall time under `label`.
    pub async fn measure_async<F: Future>(&self, label: &str, fut: F) -> F::Output {
        let start = Instant::now();
        let result = fut.await;
        self.record(label, start.elapsed().as_secs_f64() * 1000.0);
        result
    }

    fn record(&self, label: &str, elapsed_ms: f64) {
        let mut state = self.state.lock();
        let samples = state.samples.entry(label.to_string()).or_default();
        samples.push(Sample {
            at: Instant::now(),
            elapsed_ms,
        });
        if samples.len() > MAX_SAMPLES_PER_LABEL {
            samples.remove(0);
        }
    }

    /// Open a timer-benchmark window. An already-open window is restarted.
    pub fn start_window(&self) {
        self.state.lock().window_start = Some(Instant::now());
    }

    /// Close the window and aggregate every measure recorded inside it.
    /// Returns zeroed stats if no window was open or nothing was measured.
    pub fn stop_window(&self) -> TimerBenchmark {
        let mut state = self.state.lock();
        let window_start = state.window_start.take();
        let mut in_window: Vec<f64> = match window_start {
            Some(start) => state
                .samples
                .values()
                .flatten()
                .filter(|s| s.at >= start)
                .map(|s| s.elapsed_ms)
                .collect(),
            None => Vec::new(),
        };

        if in_window.is_empty() {
            return TimerBenchmark {
                count: 0,
                mean_ms: 0.0,
                p95_ms: 0.0,
            };
        }

        in_window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let count = in_window.len();
        let mean_ms = in_window.iter().sum::<f64>() / count as f64;
        let p95_index = ((count as f64 * 0.95).ceil() as usize).saturating_sub(1);
        let p95_ms = in_window[p95_index.min(count - 1)];

        TimerBenchmark {
            count,
            mean_ms,
            p95_ms,
        }
    }

    /// Mean recorded time for a label, if any samples exist.
    pub fn mean_ms(&self, label: &str) -> Option<f64> {
        let state = self.state.lock();
        let samples = state.samples.get(label)?;
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().map(|s| s.elapsed_ms).sum::<f64>() / samples.len() as f64)
    }
}

impl Default for TimingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_passes_result_through() {
        let registry = TimingRegistry::new();
        let value = registry.measure("op", || 41 + 1);
        assert_eq!(value, 42);
        assert!(registry.mean_ms("op").is_some());
    }

    #[test]
    fn measure_records_on_error_path() {
        let registry = TimingRegistry::new();
        let result: Result<(), String> = registry.measure("fallible", || Err("boom".to_string()));
        assert!(result.is_err());
        assert!(registry.mean_ms("fallible").is_some());
    }

    #[test]
    fn empty_window_yields_zeroes() {
        let registry = TimingRegistry::new();
        registry.start_window();
        let stats = registry.stop_window();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean_ms, 0.0);
    }
}
