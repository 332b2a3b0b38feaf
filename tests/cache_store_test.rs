//! Cache store tests: capacity invariants, hit/miss accounting, TTL,
//! and victim selection.

use std::time::Duration;

use pulsekit::cache::{CacheStore, CacheStoreConfig, CachedValue, PerformanceRating};
use pulsekit::PulseError;

fn store(max_entries: usize, max_bytes: usize) -> CacheStore {
    CacheStore::new(CacheStoreConfig {
        name: "test".to_string(),
        max_entries,
        max_bytes,
        default_ttl: None,
        cleanup_target_ratio: 0.7,
        hit_rate_good: 0.8,
        hit_rate_fair: 0.5,
    })
}

fn value(size: usize) -> CachedValue {
    CachedValue::new(vec![0u8; size])
}

#[test]
fn capacity_invariant_holds_after_every_insert() {
    let cache = store(4, 1000);

    for i in 0..20 {
        let size = 100 + (i % 3) * 100;
        cache.insert(format!("key{i}"), value(size)).unwrap();
        assert!(cache.len() <= 4, "entry count exceeded after insert {i}");
        assert!(
            cache.current_bytes() <= 1000,
            "byte count exceeded after insert {i}"
        );
    }
}

#[test]
fn hit_rate_matches_scripted_sequence() {
    let cache = store(8, 10_000);
    cache.insert("present", value(10)).unwrap();

    for _ in 0..3 {
        assert!(cache.get("present").is_some());
    }
    for _ in 0..2 {
        assert!(cache.get("absent").is_none());
    }

    let metrics = cache.performance_metrics();
    assert_eq!(metrics.hits, 3);
    assert_eq!(metrics.misses, 2);
    assert!((metrics.hit_rate - 0.6).abs() < 1e-9);
}

#[test]
fn hit_rate_is_zero_before_first_access() {
    let cache = store(8, 10_000);
    cache.insert("k", value(10)).unwrap();
    assert_eq!(cache.performance_metrics().hit_rate, 0.0);
}

#[test]
fn oversized_entry_is_rejected_without_side_effects() {
    let cache = store(4, 100);
    cache.insert("small", value(50)).unwrap();

    let result = cache.insert("huge", value(200));
    assert!(matches!(
        result,
        Err(PulseError::EntryTooLarge {
            size: 200,
            limit: 100,
            ..
        })
    ));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.current_bytes(), 50);
    assert!(cache.contains_key("small"));
}

#[test]
fn empty_key_is_rejected() {
    let cache = store(4, 100);
    let result = cache.insert("", value(10));
    assert!(matches!(result, Err(PulseError::InvalidKey(_))));
}

#[test]
fn expired_entry_misses_and_is_lazily_evicted() {
    let cache = store(4, 10_000);
    cache
        .insert_with("short", value(10), Some(Duration::from_millis(20)), None)
        .unwrap();

    assert!(cache.get("short").is_some());
    std::thread::sleep(Duration::from_millis(60));

    assert!(cache.get("short").is_none());
    assert_eq!(cache.len(), 0, "expired entry evicted on the failed read");
    assert_eq!(cache.performance_metrics().misses, 1);
}

#[test]
fn cleanup_sweeps_expired_entries() {
    let cache = store(8, 10_000);
    cache
        .insert_with("a", value(10), Some(Duration::from_millis(20)), None)
        .unwrap();
    cache.insert("keeper", value(10)).unwrap();

    std::thread::sleep(Duration::from_millis(60));
    let evicted = cache.perform_cleanup();

    assert!(evicted >= 1);
    assert!(!cache.contains_key("a"));
    assert!(cache.contains_key("keeper"));
}

#[test]
fn eviction_spares_the_accessed_entry() {
    let cache = store(3, 10_000);
    cache.insert("a", value(10)).unwrap();
    std::thread::sleep(Duration::from_millis(2));
    cache.insert("b", value(10)).unwrap();
    std::thread::sleep(Duration::from_millis(2));
    cache.insert("c", value(10)).unwrap();

    // One access lifts a's frequency score above the unread b and c.
    assert!(cache.get("a").is_some());
    cache.insert("d", value(10)).unwrap();

    assert_eq!(cache.len(), 3);
    assert!(cache.contains_key("a"));
    assert!(!cache.contains_key("b"), "b was the lowest-scoring victim");
    assert!(cache.contains_key("c"));
    assert!(cache.contains_key("d"));
}

#[test]
fn unaccessed_entries_evict_oldest_first() {
    let cache = store(3, 10_000);
    for key in ["k1", "k2", "k3", "k4"] {
        cache.insert(key, value(10)).unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(cache.len(), 3);
    assert!(cache.get("k1").is_none(), "oldest unread entry was evicted");
    assert!(cache.contains_key("k2"));
    assert!(cache.contains_key("k3"));
    assert!(cache.contains_key("k4"));
}

#[test]
fn frequently_read_entry_survives_newer_one_off() {
    let cache = store(2, 10_000);
    cache.insert("profile", value(100)).unwrap();
    for _ in 0..5 {
        assert!(cache.get("profile").is_some());
    }
    cache.insert("feed", value(100)).unwrap();
    cache.insert("one_off", value(100)).unwrap();

    assert!(cache.contains_key("profile"));
    assert!(!cache.contains_key("feed"));
}

#[test]
fn replacing_a_key_keeps_accounting_exact() {
    let cache = store(4, 1000);
    cache.insert("k", value(400)).unwrap();
    cache.insert("k", value(100)).unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.current_bytes(), 100);
}

#[test]
fn cleanup_evicts_down_to_target_occupancy() {
    let cache = store(10, 10_000);
    for i in 0..10 {
        cache.insert(format!("k{i}"), value(10)).unwrap();
    }

    let evicted = cache.perform_cleanup();

    assert!(evicted >= 3, "expected at least 3 evictions, got {evicted}");
    assert!(cache.len() <= 7);
}

#[test]
fn remove_and_clear() {
    let cache = store(4, 1000);
    cache.insert("a", value(100)).unwrap();
    cache.insert("b", value(100)).unwrap();

    assert!(cache.remove("a"));
    assert!(!cache.remove("a"));
    assert_eq!(cache.current_bytes(), 100);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.current_bytes(), 0);
}

#[test]
fn rating_follows_hit_rate_thresholds() {
    let good = store(8, 10_000);
    good.insert("k", value(10)).unwrap();
    for _ in 0..4 {
        good.get("k");
    }
    good.get("absent");
    assert_eq!(good.performance_metrics().rating, PerformanceRating::Good);

    let fair = store(8, 10_000);
    fair.insert("k", value(10)).unwrap();
    for _ in 0..3 {
        fair.get("k");
    }
    for _ in 0..2 {
        fair.get("absent");
    }
    assert_eq!(fair.performance_metrics().rating, PerformanceRating::Fair);

    let poor = store(8, 10_000);
    poor.insert("k", value(10)).unwrap();
    poor.get("k");
    for _ in 0..4 {
        poor.get("absent");
    }
    assert_eq!(poor.performance_metrics().rating, PerformanceRating::Poor);
}

#[test]
fn tagged_entries_evict_by_component() {
    let cache = store(8, 10_000);
    cache
        .insert_with("w1", value(10), None, Some("WorkoutCard".to_string()))
        .unwrap();
    cache
        .insert_with("w2", value(10), None, Some("WorkoutCard".to_string()))
        .unwrap();
    cache.insert("plain", value(10)).unwrap();

    let evicted = cache.evict_component("WorkoutCard");

    assert_eq!(evicted, 2);
    assert!(!cache.contains_key("w1"));
    assert!(cache.contains_key("plain"));
}

#[test]
fn caller_estimated_size_drives_accounting() {
    let cache = store(4, 1000);
    cache
        .insert("thumb", CachedValue::with_size(vec![1, 2, 3], 600))
        .unwrap();
    assert_eq!(cache.current_bytes(), 600);

    // A second estimated entry forces the first out on byte budget.
    cache
        .insert("cover", CachedValue::with_size(vec![4, 5], 600))
        .unwrap();
    assert_eq!(cache.len(), 1);
    assert!(cache.contains_key("cover"));
}
