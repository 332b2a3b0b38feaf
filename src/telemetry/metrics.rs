//! Metrics facade recording helpers.
//!
//! Thin wrappers over the `metrics` crate so call sites stay one-liners
//! and metric names live in one place. The host application decides which
//! exporter, if any, to install.

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::memory::PressureLevel;

pub const CACHE_HITS: &str = "pulsekit_cache_hits_total";
pub const CACHE_MISSES: &str = "pulsekit_cache_misses_total";
pub const CACHE_EVICTIONS: &str = "pulsekit_cache_evictions_total";
pub const MEMORY_USED_BYTES: &str = "pulsekit_memory_used_bytes";
pub const PRESSURE_LEVEL: &str = "pulsekit_pressure_level";

/// Register metric descriptions with the installed recorder. Safe to call
/// more than once.
pub fn init_metrics() {
    describe_counter!(CACHE_HITS, "Cache lookups that returned a value");
    describe_counter!(CACHE_MISSES, "Cache lookups that missed or hit an expired entry");
    describe_counter!(CACHE_EVICTIONS, "Entries evicted by capacity, TTL, or cleanup");
    describe_gauge!(MEMORY_USED_BYTES, "Latest sampled aggregate memory usage");
    describe_gauge!(PRESSURE_LEVEL, "Pressure level (0=normal .. 3=emergency)");
}

pub fn record_cache_hit(store: &str) {
    counter!(CACHE_HITS, "store" => store.to_string()).increment(1);
}

pub fn record_cache_miss(store: &str) {
    counter!(CACHE_MISSES, "store" => store.to_string()).increment(1);
}

pub fn record_evictions(store: &str, count: usize) {
    counter!(CACHE_EVICTIONS, "store" => store.to_string()).increment(count as u64);
}

pub fn record_memory_usage(used_bytes: usize) {
    gauge!(MEMORY_USED_BYTES).set(used_bytes as f64);
}

pub fn record_pressure_level(level: PressureLevel) {
    let value = match level {
        PressureLevel::Normal => 0.0,
        PressureLevel::Warning => 1.0,
        PressureLevel::Critical => 2.0,
        PressureLevel::Emergency => 3.0,
    };
    gauge!(PRESSURE_LEVEL).set(value);
}
