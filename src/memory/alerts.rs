//! Performance alert channel.
//!
//! Alerts fan out over a tokio broadcast channel. Zero, one, or many
//! subscribers are all valid; a lagging subscriber loses the oldest alerts
//! rather than blocking the emitter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Alert categories emitted by the memory manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PressureEscalation,
    LeakSuspected,
    CleanupFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// A `performance_alert` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl PerformanceAlert {
    pub fn new(kind: AlertKind, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Publish side of the alert channel.
pub struct AlertBus {
    sender: broadcast::Sender<PerformanceAlert>,
}

impl AlertBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a listener. The receiver detaches by being dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<PerformanceAlert> {
        self.sender.subscribe()
    }

    /// Emit an alert to all current subscribers. Emitting with no
    /// subscribers is a no-op.
    pub fn emit(&self, alert: PerformanceAlert) {
        tracing::info!(
            kind = ?alert.kind,
            severity = ?alert.severity,
            message = %alert.message,
            "performance_alert"
        );
        let _ = self.sender.send(alert);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new(64)
    }
}
