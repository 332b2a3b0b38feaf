//! Memory pressure management.
//!
//! Samples aggregate usage, classifies pressure, cascades cleanup into
//! registered cache stores, and runs leak heuristics over per-component
//! allocation counters.

mod alerts;
mod leak;
mod manager;
mod pressure;

pub use alerts::{AlertBus, AlertKind, AlertSeverity, PerformanceAlert};
pub use leak::{AllocationTracker, LeakSuspect};
pub use manager::{
    CleanupReport, ManagedCache, MemoryManager, MemoryManagerConfig, MemorySampler,
    MemoryStatistics, RegistrationHandle, StoreAggregateSampler, StoreCleanup,
};
pub use pressure::{PressureLevel, PressureThresholds};
