//! pulsekit — client-side resource caching and memory-pressure management.
//!
//! Bounded caches (image, API response, generic response) coordinated by a
//! memory manager that classifies system pressure, cascades eviction, and
//! flags suspected leaks, plus a performance monitor that merges everything
//! into a scored report with alert events.
//!
//! # Architecture
//!
//! - [`cache::CacheStore`]: one bounded LRU+TTL cache per resource class,
//!   with hit/miss accounting and frequency-biased victim selection.
//! - [`memory::MemoryManager`]: periodic usage sampling, pressure
//!   classification, weak-registered cleanup cascade, allocation tracking
//!   and leak heuristics, and the `performance_alert` channel.
//! - [`monitor::PerformanceMonitor`]: timed measurements, micro-benchmarks
//!   (scroll, orientation, cache validation, bundle analysis), and report
//!   generation.
//!
//! The cache stores whatever opaque payload the caller supplies; actual
//! image fetches and API calls are the caller's responsibility. Everything
//! is in-process and volatile, scoped to one running application instance.

pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod monitor;
pub mod telemetry;

use std::sync::Arc;

use cache::{CacheStore, CacheStoreConfig};
use memory::{MemoryManager, MemoryManagerConfig, RegistrationHandle};
use monitor::PerformanceMonitor;

pub use error::PulseError;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub image_cache: CacheStoreConfig,
    pub api_cache: CacheStoreConfig,
    pub response_cache: CacheStoreConfig,
    pub memory: MemoryManagerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            image_cache: CacheStoreConfig::image(),
            api_cache: CacheStoreConfig::api_response(),
            response_cache: CacheStoreConfig::generic(),
            memory: MemoryManagerConfig::default(),
        }
    }
}

impl From<config::EnvConfig> for RuntimeConfig {
    fn from(env: config::EnvConfig) -> Self {
        Self {
            image_cache: env.image_cache,
            api_cache: env.api_cache,
            response_cache: env.response_cache,
            memory: env.memory,
        }
    }
}

/// A wired runtime instance: three cache stores registered with one memory
/// manager, and a performance monitor over both.
///
/// Registrations are held RAII-style; dropping the runtime unregisters the
/// stores on every exit path.
pub struct Runtime {
    pub image_cache: Arc<CacheStore>,
    pub api_cache: Arc<CacheStore>,
    pub response_cache: Arc<CacheStore>,
    pub memory: MemoryManager,
    pub monitor: PerformanceMonitor,
    _registrations: Vec<RegistrationHandle>,
}

impl Runtime {
    /// Create a new runtime instance with the given configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        let image_cache = Arc::new(CacheStore::new(config.image_cache));
        let api_cache = Arc::new(CacheStore::new(config.api_cache));
        let response_cache = Arc::new(CacheStore::new(config.response_cache));
        let memory = MemoryManager::new(config.memory);

        let registrations = vec![
            memory.register_store(image_cache.clone()),
            memory.register_store(api_cache.clone()),
            memory.register_store(response_cache.clone()),
        ];
        let monitor = PerformanceMonitor::new(memory.clone());

        Self {
            image_cache,
            api_cache,
            response_cache,
            memory,
            monitor,
            _registrations: registrations,
        }
    }

    /// Begin pressure sampling. Must be called within a tokio runtime.
    pub fn start(&self) {
        self.memory.start();
    }

    /// Stop pressure sampling.
    pub fn stop(&self) {
        self.memory.stop();
    }
}
