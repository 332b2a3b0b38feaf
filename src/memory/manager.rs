//! Memory manager: pressure sampling, cleanup cascade, leak tracking.
//!
//! Explicitly constructed and dependency-injected, never a module-level
//! global, so tests can run independent instances side by side.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{CacheCapacity, CacheMetrics};
use crate::error::PulseError;
use crate::memory::alerts::{AlertBus, AlertKind, AlertSeverity, PerformanceAlert};
use crate::memory::leak::{AllocationTracker, LeakSuspect};
use crate::memory::pressure::{PressureLevel, PressureThresholds};
use crate::telemetry::{record_memory_usage, record_pressure_level};

/// Cleanup collaborator registered with the memory manager.
///
/// The manager holds these by weak reference: a dropped store disappears
/// from the registry on the next iteration without explicit unregistration.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    fn current_bytes(&self) -> usize;
    fn capacity(&self) -> CacheCapacity;
    fn perform_cleanup(&self) -> Result<usize, PulseError>;
    fn performance_metrics(&self) -> CacheMetrics;
    fn evict_component(&self, component_type: &str) -> usize;
}

/// Source of the memory usage figure sampled each tick.
pub trait MemorySampler: Send + Sync {
    fn sample(&self, stores: &[Arc<dyn ManagedCache>]) -> Result<usize, PulseError>;
}

/// Default sampler: aggregate byte usage of the registered stores.
///
/// The crate accounts its own memory rather than querying the platform,
/// so sampling never blocks and works identically on every target.
pub struct StoreAggregateSampler;

impl MemorySampler for StoreAggregateSampler {
    fn sample(&self, stores: &[Arc<dyn ManagedCache>]) -> Result<usize, PulseError> {
        Ok(stores.iter().map(|s| s.current_bytes()).sum())
    }
}

/// Configuration for the memory manager.
#[derive(Debug, Clone)]
pub struct MemoryManagerConfig {
    /// Budget the sampled usage is measured against.
    pub memory_budget_bytes: usize,
    pub sampling_interval: Duration,
    pub thresholds: PressureThresholds,
    /// Leak heuristic: number of closed windows retained per type (N).
    pub leak_window_count: usize,
    /// Leak heuristic: growth windows required to flag a type (K).
    pub leak_consecutive_growth: usize,
    /// Broadcast buffer for the alert channel.
    pub alert_capacity: usize,
}

impl Default for MemoryManagerConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: 256 * 1024 * 1024,
            sampling_interval: Duration::from_secs(5),
            thresholds: PressureThresholds::default(),
            leak_window_count: 6,
            leak_consecutive_growth: 3,
            alert_capacity: 64,
        }
    }
}

/// Latest sampled memory state. A pure snapshot; reading it never samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStatistics {
    pub used_bytes: usize,
    pub budget_bytes: usize,
    pub usage_ratio: f64,
    pub pressure: PressureLevel,
    pub emergency_mode: bool,
    pub last_sample_at: Option<DateTime<Utc>>,
}

/// Outcome of one store's cleanup inside a cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCleanup {
    pub store: String,
    pub evicted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of a cleanup cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub reason: String,
    pub total_evicted: usize,
    pub per_store: Vec<StoreCleanup>,
}

struct Registration {
    id: u64,
    store: Weak<dyn ManagedCache>,
}

struct ManagerInner {
    config: MemoryManagerConfig,
    sampler: Box<dyn MemorySampler>,
    stores: Mutex<Vec<Registration>>,
    next_registration_id: AtomicU64,
    allocations: AllocationTracker,
    latest: Mutex<MemoryStatistics>,
    last_leak_flags: Mutex<Vec<String>>,
    active: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    alerts: AlertBus,
}

/// RAII registration: dropping the handle unregisters the store on every
/// exit path.
pub struct RegistrationHandle {
    id: u64,
    inner: Weak<ManagerInner>,
}

impl RegistrationHandle {
    /// Explicitly release the registration.
    pub fn release(self) {}
}

impl Drop for RegistrationHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.stores.lock().retain(|r| r.id != self.id);
        }
    }
}

/// Samples memory usage, classifies pressure, cascades cleanup into
/// registered stores, and tracks per-component allocations for leak
/// heuristics.
///
/// Cheap to clone; clones share state. Lifecycle is explicit: `start`
/// spawns the sampling task (requires a tokio runtime), `stop` retires it.
#[derive(Clone)]
pub struct MemoryManager {
    inner: Arc<ManagerInner>,
}

impl MemoryManager {
    pub fn new(config: MemoryManagerConfig) -> Self {
        Self::with_sampler(config, Box::new(StoreAggregateSampler))
    }

    /// Construct with a custom usage sampler. Tests use this to script
    /// pressure sequences.
    pub fn with_sampler(config: MemoryManagerConfig, sampler: Box<dyn MemorySampler>) -> Self {
        let latest = MemoryStatistics {
            used_bytes: 0,
            budget_bytes: config.memory_budget_bytes,
            usage_ratio: 0.0,
            pressure: PressureLevel::Normal,
            emergency_mode: false,
            last_sample_at: None,
        };
        Self {
            inner: Arc::new(ManagerInner {
                allocations: AllocationTracker::new(
                    config.leak_window_count,
                    config.leak_consecutive_growth,
                ),
                alerts: AlertBus::new(config.alert_capacity),
                config,
                sampler,
                stores: Mutex::new(Vec::new()),
                next_registration_id: AtomicU64::new(1),
                latest: Mutex::new(latest),
                last_leak_flags: Mutex::new(Vec::new()),
                active: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    /// Begin periodic sampling. Idempotent: calling `start` while already
    /// started is a no-op. Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.inner.active.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.config.sampling_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick fires immediately; skip it so the
            // first sample lands one interval after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !inner.active.load(Ordering::SeqCst) {
                    break;
                }
                // A failed sample is logged inside tick; the loop keeps going.
                let _ = inner.tick(true);
            }
        });
        *self.inner.task.lock() = Some(handle);
        tracing::info!(
            interval_ms = self.inner.config.sampling_interval.as_millis() as u64,
            "memory manager started"
        );
    }

    /// End periodic sampling. Idempotent. Sample results already in flight
    /// are discarded rather than committed to retired state.
    pub fn stop(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.inner.task.lock().take() {
            handle.abort();
        }
        tracing::info!("memory manager stopped");
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Latest sampled statistics. Cheap and non-blocking; never samples
    /// inline.
    pub fn statistics(&self) -> MemoryStatistics {
        self.inner.latest.lock().clone()
    }

    /// Sample immediately, outside the periodic schedule. Commits the
    /// result and runs the same transition handling as a timer tick.
    pub fn sample_now(&self) -> Result<MemoryStatistics, PulseError> {
        self.inner.tick(false)?;
        Ok(self.statistics())
    }

    /// Register a cleanup collaborator. The manager keeps only a weak
    /// reference; drop the returned handle (or the store itself) to
    /// unregister.
    pub fn register_store(&self, store: Arc<dyn ManagedCache>) -> RegistrationHandle {
        let id = self.inner.next_registration_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(store = store.name(), id, "registered cache store");
        self.inner.stores.lock().push(Registration {
            id,
            store: Arc::downgrade(&store),
        });
        RegistrationHandle {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Explicitly unregister a store by consuming its handle.
    pub fn unregister_store(&self, handle: RegistrationHandle) {
        handle.release();
    }

    /// Number of live registered stores.
    pub fn registered_store_count(&self) -> usize {
        self.inner.live_stores().len()
    }

    /// Live registered stores, in registration order.
    pub fn live_stores(&self) -> Vec<Arc<dyn ManagedCache>> {
        self.inner.live_stores()
    }

    /// Metrics snapshot of every live registered store.
    pub fn store_metrics(&self) -> Vec<CacheMetrics> {
        self.inner
            .live_stores()
            .iter()
            .map(|s| s.performance_metrics())
            .collect()
    }

    /// Cascade `perform_cleanup` into every registered store, in
    /// registration order. One store's failure is isolated; the rest still
    /// run.
    pub fn trigger_cleanup(&self, reason: &str) -> CleanupReport {
        self.inner.trigger_cleanup(reason)
    }

    pub fn track_allocation(&self, component_type: &str) {
        self.inner.allocations.track_allocation(component_type);
    }

    pub fn track_deallocation(&self, component_type: &str) {
        self.inner.allocations.track_deallocation(component_type);
    }

    /// Close the current allocation window for every tracked type.
    ///
    /// The sampling task calls this each tick; headless callers and tests
    /// can drive it directly for deterministic window boundaries.
    pub fn roll_allocation_window(&self) {
        self.inner.allocations.roll_window();
    }

    /// Run the leak heuristic over closed allocation windows.
    pub fn detect_leaks(&self) -> Vec<LeakSuspect> {
        self.inner.allocations.detect_leaks()
    }

    /// Evict all entries tagged with the component type from every store
    /// and reset its allocation counters. Returns total entries evicted.
    pub fn cleanup_component_type(&self, component_type: &str) -> usize {
        let evicted: usize = self
            .inner
            .live_stores()
            .iter()
            .map(|s| s.evict_component(component_type))
            .sum();
        self.inner.allocations.reset(component_type);
        tracing::info!(component_type, evicted, "component type cleaned up");
        evicted
    }

    /// Attach an alert listener. Detach by dropping the receiver.
    pub fn subscribe_alerts(&self) -> tokio::sync::broadcast::Receiver<PerformanceAlert> {
        self.inner.alerts.subscribe()
    }
}

impl ManagerInner {
    fn live_stores(&self) -> Vec<Arc<dyn ManagedCache>> {
        let mut stores = self.stores.lock();
        let mut live: Vec<Arc<dyn ManagedCache>> = Vec::with_capacity(stores.len());
        stores.retain(|r| match r.store.upgrade() {
            Some(store) => {
                live.push(store);
                true
            }
            None => false,
        });
        live
    }

    /// One sampling tick: sample, classify, commit, and handle transitions.
    ///
    /// A failed sample is skipped and the previous pressure level retained;
    /// the timer loop never crashes on it. Timer-driven results are
    /// discarded if `stop` ran while the sample was in flight.
    fn tick(&self, from_timer: bool) -> Result<(), PulseError> {
        let stores = self.live_stores();
        let used = match self.sampler.sample(&stores) {
            Ok(used) => used,
            Err(e) => {
                tracing::warn!(error = %e, "memory sample failed, retaining previous level");
                return Err(e);
            }
        };

        let budget = self.config.memory_budget_bytes;
        let usage_ratio = if budget == 0 {
            0.0
        } else {
            used as f64 / budget as f64
        };
        let pressure = self.config.thresholds.classify(usage_ratio);

        // Late-arriving timer results must not write into retired state,
        // and that includes rolling the allocation windows.
        if from_timer && !self.active.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.allocations.roll_window();
        let suspects = self.allocations.detect_leaks();

        let previous = {
            let mut latest = self.latest.lock();
            let previous = latest.pressure;
            *latest = MemoryStatistics {
                used_bytes: used,
                budget_bytes: budget,
                usage_ratio,
                pressure,
                emergency_mode: pressure == PressureLevel::Emergency,
                last_sample_at: Some(Utc::now()),
            };
            previous
        };

        record_memory_usage(used);
        record_pressure_level(pressure);

        if pressure > previous {
            tracing::info!(%previous, current = %pressure, usage_ratio, "pressure escalated");
        }

        if pressure >= PressureLevel::Critical && previous < pressure {
            let reason = format!("pressure_{}", pressure);
            self.trigger_cleanup(&reason);
            let severity = if pressure == PressureLevel::Emergency {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };
            self.alerts.emit(
                PerformanceAlert::new(
                    AlertKind::PressureEscalation,
                    severity,
                    format!("memory pressure escalated to {}", pressure),
                )
                .with_data(serde_json::json!({
                    "usage_ratio": usage_ratio,
                    "used_bytes": used,
                    "budget_bytes": budget,
                })),
            );
        }

        self.emit_leak_alerts(&suspects);
        Ok(())
    }

    /// Alert when the flagged set changes, not on every tick a suspect
    /// persists.
    fn emit_leak_alerts(&self, suspects: &[LeakSuspect]) {
        let flagged: Vec<String> = suspects.iter().map(|s| s.component_type.clone()).collect();
        let mut last = self.last_leak_flags.lock();
        if flagged != *last {
            if !flagged.is_empty() {
                self.alerts.emit(
                    PerformanceAlert::new(
                        AlertKind::LeakSuspected,
                        AlertSeverity::Warning,
                        format!("suspected leaks in: {}", flagged.join(", ")),
                    )
                    .with_data(serde_json::json!({ "suspects": suspects })),
                );
            }
            *last = flagged;
        }
    }

    fn trigger_cleanup(&self, reason: &str) -> CleanupReport {
        let stores = self.live_stores();
        let mut per_store = Vec::with_capacity(stores.len());
        let mut total_evicted = 0usize;
        for store in &stores {
            match store.perform_cleanup() {
                Ok(evicted) => {
                    total_evicted += evicted;
                    per_store.push(StoreCleanup {
                        store: store.name().to_string(),
                        evicted,
                        error: None,
                    });
                }
                Err(e) => {
                    let err = PulseError::CleanupFailed {
                        store: store.name().to_string(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(store = store.name(), error = %err, "store cleanup failed");
                    self.alerts.emit(
                        PerformanceAlert::new(
                            AlertKind::CleanupFailure,
                            AlertSeverity::Warning,
                            format!("cleanup failed for store '{}'", store.name()),
                        )
                        .with_data(serde_json::json!({
                            "store": store.name(),
                            "reason": reason,
                            "error": err.to_string(),
                        })),
                    );
                    per_store.push(StoreCleanup {
                        store: store.name().to_string(),
                        evicted: 0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        tracing::info!(reason, total_evicted, stores = stores.len(), "cleanup cascade complete");
        CleanupReport {
            reason: reason.to_string(),
            total_evicted,
            per_store,
        }
    }
}
