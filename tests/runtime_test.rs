//! End-to-end wiring tests for the assembled runtime.

use pulsekit::cache::CachedValue;
use pulsekit::{Runtime, RuntimeConfig};

#[test]
fn runtime_registers_all_three_stores() {
    let runtime = Runtime::new(RuntimeConfig::default());
    assert_eq!(runtime.memory.registered_store_count(), 3);
}

#[test]
fn runtime_caches_are_usable_and_tracked() {
    let runtime = Runtime::new(RuntimeConfig::default());

    runtime
        .image_cache
        .insert("avatar:42", CachedValue::new(vec![0u8; 2048]))
        .unwrap();

    let value = runtime.image_cache.get("avatar:42").unwrap();
    assert_eq!(value.size_bytes(), 2048);

    // The manager sees the store's footprint through the registry.
    let metrics = runtime.memory.store_metrics();
    let image = metrics
        .iter()
        .find(|m| m.store == "image")
        .expect("image store registered");
    assert_eq!(image.current_bytes, 2048);
    assert_eq!(image.hits, 1);
}

#[test]
fn dropping_the_runtime_unregisters_stores() {
    let runtime = Runtime::new(RuntimeConfig::default());
    let memory = runtime.memory.clone();
    drop(runtime);
    assert_eq!(memory.registered_store_count(), 0);
}

#[tokio::test]
async fn runtime_start_and_stop() {
    let runtime = Runtime::new(RuntimeConfig::default());
    runtime.start();
    assert!(runtime.memory.is_active());
    runtime.stop();
    assert!(!runtime.memory.is_active());
}

#[tokio::test]
async fn runtime_report_covers_every_store() {
    let runtime = Runtime::new(RuntimeConfig::default());
    runtime
        .api_cache
        .insert("profile", CachedValue::new(vec![1u8; 128]))
        .unwrap();

    let report = runtime.monitor.generate_report().await;
    assert_eq!(report.stores.len(), 3);
    assert!(report.overall_score >= 0.0 && report.overall_score <= 100.0);

    let names: Vec<&str> = report.stores.iter().map(|m| m.store.as_str()).collect();
    assert!(names.contains(&"image"));
    assert!(names.contains(&"api_response"));
    assert!(names.contains(&"generic"));
}
