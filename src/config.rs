//! Configuration loading from environment variables.
//!
//! All configuration values are loaded from `PULSEKIT_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PULSEKIT_IMAGE_CACHE_MAX_ENTRIES` | 256 | Image cache entry limit |
//! | `PULSEKIT_IMAGE_CACHE_MAX_BYTES` | 67108864 | Image cache byte limit (64 MiB) |
//! | `PULSEKIT_API_CACHE_MAX_ENTRIES` | 512 | API response cache entry limit |
//! | `PULSEKIT_API_CACHE_MAX_BYTES` | 8388608 | API response cache byte limit (8 MiB) |
//! | `PULSEKIT_API_CACHE_TTL_SECS` | 300 | API response TTL (0 = no TTL) |
//! | `PULSEKIT_RESPONSE_CACHE_MAX_ENTRIES` | 256 | Generic response cache entry limit |
//! | `PULSEKIT_RESPONSE_CACHE_MAX_BYTES` | 16777216 | Generic response cache byte limit (16 MiB) |
//! | `PULSEKIT_CLEANUP_TARGET_RATIO` | 0.7 | Pressure cleanup target occupancy |
//! | `PULSEKIT_HIT_RATE_GOOD` | 0.8 | Hit-rate threshold for `good` |
//! | `PULSEKIT_HIT_RATE_FAIR` | 0.5 | Hit-rate threshold for `fair` |
//! | `PULSEKIT_MEMORY_BUDGET_BYTES` | 268435456 | Memory budget (256 MiB) |
//! | `PULSEKIT_SAMPLING_INTERVAL_MS` | 5000 | Pressure sampling interval |
//! | `PULSEKIT_PRESSURE_WARNING` | 0.6 | Warning pressure threshold |
//! | `PULSEKIT_PRESSURE_CRITICAL` | 0.75 | Critical pressure threshold |
//! | `PULSEKIT_PRESSURE_EMERGENCY` | 0.9 | Emergency pressure threshold |
//! | `PULSEKIT_LEAK_WINDOW_COUNT` | 6 | Leak heuristic: retained windows (N) |
//! | `PULSEKIT_LEAK_CONSECUTIVE_GROWTH` | 3 | Leak heuristic: growth windows to flag (K) |
//!
//! Logging variables (`PULSEKIT_LOG`, `PULSEKIT_LOG_FORMAT`,
//! `PULSEKIT_LOG_FILE`) are documented in [`crate::telemetry`] and read by
//! `LogConfig::from_env`.

use std::time::Duration;

use crate::cache::CacheStoreConfig;
use crate::memory::{MemoryManagerConfig, PressureThresholds};

/// All component configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub image_cache: CacheStoreConfig,
    pub api_cache: CacheStoreConfig,
    pub response_cache: CacheStoreConfig,
    pub memory: MemoryManagerConfig,
}

/// Effective configuration summary, flattened for status output.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub image_cache_max_entries: usize,
    pub image_cache_max_bytes: usize,
    pub api_cache_max_entries: usize,
    pub api_cache_max_bytes: usize,
    pub api_cache_ttl_secs: u64,
    pub response_cache_max_entries: usize,
    pub response_cache_max_bytes: usize,
    pub memory_budget_bytes: usize,
    pub sampling_interval_ms: u64,
    pub pressure_warning: f64,
    pub pressure_critical: f64,
    pub pressure_emergency: f64,
    pub leak_window_count: usize,
    pub leak_consecutive_growth: usize,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse an `f64` env var, returning `default` on missing, invalid, or
/// non-finite values.
fn parse_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(val) => match val.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => default,
        },
        Err(_) => default,
    }
}

fn load_store_config(
    name: &str,
    prefix: &str,
    default_entries: usize,
    default_bytes: usize,
    default_ttl_secs: u64,
) -> CacheStoreConfig {
    let max_entries = parse_usize(&format!("{prefix}_MAX_ENTRIES"), default_entries).max(1);
    let max_bytes = parse_usize(&format!("{prefix}_MAX_BYTES"), default_bytes).max(1024);
    let ttl_secs = parse_u64(&format!("{prefix}_TTL_SECS"), default_ttl_secs);
    let cleanup_target_ratio = parse_f64("PULSEKIT_CLEANUP_TARGET_RATIO", 0.7).clamp(0.0, 1.0);
    let hit_rate_good = parse_f64("PULSEKIT_HIT_RATE_GOOD", 0.8).clamp(0.0, 1.0);
    let hit_rate_fair = parse_f64("PULSEKIT_HIT_RATE_FAIR", 0.5).min(hit_rate_good);

    CacheStoreConfig {
        name: name.to_string(),
        max_entries,
        max_bytes,
        default_ttl: if ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(ttl_secs))
        },
        cleanup_target_ratio,
        hit_rate_good,
        hit_rate_fair,
    }
}

fn load_memory_config() -> MemoryManagerConfig {
    let memory_budget_bytes =
        parse_usize("PULSEKIT_MEMORY_BUDGET_BYTES", 256 * 1024 * 1024).max(1024 * 1024);
    let sampling_ms = parse_u64("PULSEKIT_SAMPLING_INTERVAL_MS", 5000).max(100);
    let warning = parse_f64("PULSEKIT_PRESSURE_WARNING", 0.6);
    let critical = parse_f64("PULSEKIT_PRESSURE_CRITICAL", 0.75);
    let emergency = parse_f64("PULSEKIT_PRESSURE_EMERGENCY", 0.9);
    let leak_window_count = parse_usize("PULSEKIT_LEAK_WINDOW_COUNT", 6).max(1);
    let leak_consecutive_growth = parse_usize("PULSEKIT_LEAK_CONSECUTIVE_GROWTH", 3).max(1);

    MemoryManagerConfig {
        memory_budget_bytes,
        sampling_interval: Duration::from_millis(sampling_ms),
        thresholds: PressureThresholds::new(warning, critical, emergency),
        leak_window_count,
        leak_consecutive_growth,
        alert_capacity: 64,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        image_cache: load_store_config(
            "image",
            "PULSEKIT_IMAGE_CACHE",
            256,
            64 * 1024 * 1024,
            0,
        ),
        api_cache: load_store_config(
            "api_response",
            "PULSEKIT_API_CACHE",
            512,
            8 * 1024 * 1024,
            300,
        ),
        response_cache: load_store_config(
            "response",
            "PULSEKIT_RESPONSE_CACHE",
            256,
            16 * 1024 * 1024,
            0,
        ),
        memory: load_memory_config(),
    }
}

impl EnvConfig {
    /// Flattened summary of the loaded configuration.
    pub fn effective(&self) -> EffectiveConfig {
        EffectiveConfig {
            image_cache_max_entries: self.image_cache.max_entries,
            image_cache_max_bytes: self.image_cache.max_bytes,
            api_cache_max_entries: self.api_cache.max_entries,
            api_cache_max_bytes: self.api_cache.max_bytes,
            api_cache_ttl_secs: self
                .api_cache
                .default_ttl
                .map(|d| d.as_secs())
                .unwrap_or(0),
            response_cache_max_entries: self.response_cache.max_entries,
            response_cache_max_bytes: self.response_cache.max_bytes,
            memory_budget_bytes: self.memory.memory_budget_bytes,
            sampling_interval_ms: self.memory.sampling_interval.as_millis() as u64,
            pressure_warning: self.memory.thresholds.warning,
            pressure_critical: self.memory.thresholds.critical,
            pressure_emergency: self.memory.thresholds.emergency,
            leak_window_count: self.memory.leak_window_count,
            leak_consecutive_growth: self.memory.leak_consecutive_growth,
        }
    }
}
