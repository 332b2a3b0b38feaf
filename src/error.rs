//! Error types for pulsekit.
//!
//! Failures local to one store or one benchmark are isolated and degrade only
//! that facet of an aggregate report; they never abort report generation.

use thiserror::Error;

/// Errors that can occur in cache, memory, and monitoring operations.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("entry too large for cache '{store}': {size} bytes, limit {limit} bytes")]
    EntryTooLarge {
        store: String,
        size: usize,
        limit: usize,
    },

    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    #[error("memory sampling unavailable: {0}")]
    SamplingUnavailable(String),

    #[error("cleanup failed for store '{store}': {reason}")]
    CleanupFailed { store: String, reason: String },

    #[error("benchmark '{name}' failed: {reason}")]
    BenchmarkFailed { name: String, reason: String },
}

impl PulseError {
    /// Returns true if this error should be logged as a warning rather
    /// than an error. These conditions degrade metrics but leave the
    /// system operational.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::SamplingUnavailable(_) | Self::BenchmarkFailed { .. }
        )
    }

    /// Returns true if this error indicates caller misuse rather than a
    /// runtime condition.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidKey(_) | Self::EntryTooLarge { .. })
    }
}
