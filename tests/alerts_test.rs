//! Alert channel tests: fan-out, leak alert dedup, and serialization.

use std::sync::Arc;
use std::time::Duration;

use pulsekit::cache::{CacheCapacity, CacheMetrics, PerformanceRating};
use pulsekit::memory::{
    AlertBus, AlertKind, AlertSeverity, ManagedCache, MemoryManager, MemoryManagerConfig,
    MemorySampler, PerformanceAlert,
};
use pulsekit::PulseError;

struct FixedSampler(usize);

impl MemorySampler for FixedSampler {
    fn sample(&self, _stores: &[Arc<dyn ManagedCache>]) -> Result<usize, PulseError> {
        Ok(self.0)
    }
}

fn manager(budget: usize, used: usize) -> MemoryManager {
    MemoryManager::with_sampler(
        MemoryManagerConfig {
            memory_budget_bytes: budget,
            sampling_interval: Duration::from_millis(20),
            ..MemoryManagerConfig::default()
        },
        Box::new(FixedSampler(used)),
    )
}

#[test]
fn emitting_with_no_subscribers_is_a_noop() {
    let bus = AlertBus::default();
    assert_eq!(bus.subscriber_count(), 0);
    bus.emit(PerformanceAlert::new(
        AlertKind::PressureEscalation,
        AlertSeverity::Warning,
        "nobody listening",
    ));
}

#[tokio::test]
async fn every_subscriber_receives_the_escalation_alert() {
    let manager = manager(1000, 950);
    let mut first = manager.subscribe_alerts();
    let mut second = manager.subscribe_alerts();

    manager.sample_now().unwrap();

    for rx in [&mut first, &mut second] {
        let alert = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("alert delivered")
            .expect("channel open");
        assert_eq!(alert.kind, AlertKind::PressureEscalation);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert!(alert.data.is_some());
    }
}

#[tokio::test]
async fn escalation_to_critical_is_a_warning_alert() {
    let manager = manager(1000, 800);
    let mut alerts = manager.subscribe_alerts();

    manager.sample_now().unwrap();

    let alert = tokio::time::timeout(Duration::from_millis(200), alerts.recv())
        .await
        .expect("alert delivered")
        .expect("channel open");
    assert_eq!(alert.severity, AlertSeverity::Warning);
}

#[tokio::test]
async fn persistent_leak_suspects_alert_once() {
    let manager = manager(1000, 0);
    let mut alerts = manager.subscribe_alerts();

    // Three growth windows flag the type on the third tick.
    for _ in 0..3 {
        manager.track_allocation("ChartPanel");
        manager.sample_now().unwrap();
    }
    let alert = tokio::time::timeout(Duration::from_millis(200), alerts.recv())
        .await
        .expect("leak alert delivered")
        .expect("channel open");
    assert_eq!(alert.kind, AlertKind::LeakSuspected);
    assert_eq!(alert.severity, AlertSeverity::Warning);

    // The suspect set is unchanged on the next tick: no second alert.
    manager.track_allocation("ChartPanel");
    manager.sample_now().unwrap();
    assert!(alerts.try_recv().is_err());
}

struct PinnedStore;

impl ManagedCache for PinnedStore {
    fn name(&self) -> &str {
        "pinned"
    }
    fn len(&self) -> usize {
        1
    }
    fn current_bytes(&self) -> usize {
        512
    }
    fn capacity(&self) -> CacheCapacity {
        CacheCapacity {
            max_entries: 1,
            max_bytes: 1024,
        }
    }
    fn perform_cleanup(&self) -> Result<usize, PulseError> {
        Err(PulseError::CleanupFailed {
            store: "pinned".to_string(),
            reason: "entries pinned by active views".to_string(),
        })
    }
    fn performance_metrics(&self) -> CacheMetrics {
        CacheMetrics {
            store: "pinned".to_string(),
            hit_rate: 0.0,
            hits: 0,
            misses: 0,
            current_bytes: 512,
            current_count: 1,
            rating: PerformanceRating::Unknown,
        }
    }
    fn evict_component(&self, _component_type: &str) -> usize {
        0
    }
}

#[test]
fn failed_store_cleanup_emits_cleanup_failure_alert() {
    let manager = manager(1000, 0);
    let _registration = manager.register_store(Arc::new(PinnedStore));
    let mut alerts = manager.subscribe_alerts();

    let report = manager.trigger_cleanup("manual");
    assert_eq!(report.total_evicted, 0);
    assert!(report.per_store[0].error.is_some());

    let alert = alerts.try_recv().expect("alert delivered");
    assert_eq!(alert.kind, AlertKind::CleanupFailure);
    assert_eq!(alert.severity, AlertSeverity::Warning);
    assert!(alert.message.contains("pinned"));
    assert!(alert.data.is_some());
}

#[test]
fn alert_serializes_with_lowercase_severity() {
    let alert = PerformanceAlert::new(
        AlertKind::PressureEscalation,
        AlertSeverity::Critical,
        "memory pressure escalated to emergency",
    );
    let json = serde_json::to_value(&alert).unwrap();
    assert_eq!(json["severity"], "critical");
    assert_eq!(json["kind"], "pressure_escalation");
    assert!(json.get("timestamp").is_some());
}
