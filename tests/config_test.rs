//! Environment configuration tests.
//!
//! Tests run in parallel threads of one process, so each test owns the
//! env vars it mutates and the defaults test only reads vars no other
//! test touches.

use std::time::Duration;

use pulsekit::config;

#[test]
fn defaults_apply_when_env_is_unset() {
    let cfg = config::load();

    assert_eq!(cfg.image_cache.name, "image");
    assert_eq!(cfg.image_cache.max_entries, 256);
    assert_eq!(cfg.image_cache.max_bytes, 64 * 1024 * 1024);
    assert!(cfg.image_cache.default_ttl.is_none());

    assert_eq!(cfg.api_cache.name, "api_response");
    assert_eq!(cfg.api_cache.max_entries, 512);

    assert_eq!(cfg.memory.memory_budget_bytes, 256 * 1024 * 1024);
    assert_eq!(cfg.memory.leak_window_count, 6);
    assert_eq!(cfg.memory.thresholds.warning, 0.6);
}

#[test]
fn invalid_values_fall_back_to_defaults() {
    std::env::set_var("PULSEKIT_RESPONSE_CACHE_MAX_ENTRIES", "not-a-number");
    let cfg = config::load();
    assert_eq!(cfg.response_cache.max_entries, 256);
    std::env::remove_var("PULSEKIT_RESPONSE_CACHE_MAX_ENTRIES");
}

#[test]
fn sampling_interval_override_is_floored() {
    std::env::set_var("PULSEKIT_SAMPLING_INTERVAL_MS", "10");
    let cfg = config::load();
    // Floored at 100ms to keep the sampling loop sane.
    assert_eq!(cfg.memory.sampling_interval, Duration::from_millis(100));

    std::env::set_var("PULSEKIT_SAMPLING_INTERVAL_MS", "2500");
    let cfg = config::load();
    assert_eq!(cfg.memory.sampling_interval, Duration::from_millis(2500));
    std::env::remove_var("PULSEKIT_SAMPLING_INTERVAL_MS");
}

#[test]
fn response_cache_ttl_can_be_enabled() {
    std::env::set_var("PULSEKIT_RESPONSE_CACHE_TTL_SECS", "60");
    let cfg = config::load();
    assert_eq!(cfg.response_cache.default_ttl, Some(Duration::from_secs(60)));
    std::env::remove_var("PULSEKIT_RESPONSE_CACHE_TTL_SECS");
}

#[test]
fn api_cache_ttl_zero_disables_expiry() {
    std::env::set_var("PULSEKIT_API_CACHE_TTL_SECS", "0");
    let cfg = config::load();
    assert!(cfg.api_cache.default_ttl.is_none());
    std::env::remove_var("PULSEKIT_API_CACHE_TTL_SECS");
}

#[test]
fn effective_summary_mirrors_loaded_values() {
    let cfg = config::load();
    let effective = cfg.effective();

    assert_eq!(effective.image_cache_max_bytes, cfg.image_cache.max_bytes);
    assert_eq!(effective.memory_budget_bytes, cfg.memory.memory_budget_bytes);
    assert_eq!(effective.pressure_warning, cfg.memory.thresholds.warning);
    assert_eq!(
        effective.sampling_interval_ms,
        cfg.memory.sampling_interval.as_millis() as u64
    );
    assert_eq!(
        effective.leak_consecutive_growth,
        cfg.memory.leak_consecutive_growth
    );
}
