//! Telemetry: structured logging and metrics recording.
//!
//! Logging goes through `tracing`; metrics through the `metrics` facade.
//! The host application picks the subscriber and recorder.

mod logging;
mod metrics;

pub use logging::{init_logging, LogConfig, LogError, LogFormat, DEFAULT_FILTER};
pub use metrics::{
    init_metrics, record_cache_hit, record_cache_miss, record_evictions, record_memory_usage,
    record_pressure_level,
};
