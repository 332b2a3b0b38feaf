//! Memory pressure classification.
//!
//! `classify` is the single source of truth for pressure level; no other
//! component computes it independently.

use serde::{Deserialize, Serialize};

/// Coarse classification of memory scarcity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    Normal,
    Warning,
    Critical,
    Emergency,
}

impl std::fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// Ascending usage-ratio thresholds for pressure classification.
///
/// Must satisfy `warning <= critical <= emergency` for the classifier to be
/// monotone; `new` clamps violations into order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PressureThresholds {
    pub warning: f64,
    pub critical: f64,
    pub emergency: f64,
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self {
            warning: 0.6,
            critical: 0.75,
            emergency: 0.9,
        }
    }
}

impl PressureThresholds {
    /// Build a threshold table, forcing ascending order.
    pub fn new(warning: f64, critical: f64, emergency: f64) -> Self {
        let critical = critical.max(warning);
        let emergency = emergency.max(critical);
        Self {
            warning,
            critical,
            emergency,
        }
    }

    /// Map a usage ratio to a pressure level. Pure and monotone: a higher
    /// ratio never yields a lower level.
    pub fn classify(&self, usage_ratio: f64) -> PressureLevel {
        if usage_ratio >= self.emergency {
            PressureLevel::Emergency
        } else if usage_ratio >= self.critical {
            PressureLevel::Critical
        } else if usage_ratio >= self.warning {
            PressureLevel::Warning
        } else {
            PressureLevel::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundaries() {
        let t = PressureThresholds::default();
        assert_eq!(t.classify(0.0), PressureLevel::Normal);
        assert_eq!(t.classify(0.59), PressureLevel::Normal);
        assert_eq!(t.classify(0.6), PressureLevel::Warning);
        assert_eq!(t.classify(0.75), PressureLevel::Critical);
        assert_eq!(t.classify(0.9), PressureLevel::Emergency);
        assert_eq!(t.classify(2.0), PressureLevel::Emergency);
    }

    #[test]
    fn disordered_thresholds_are_clamped() {
        let t = PressureThresholds::new(0.8, 0.5, 0.4);
        assert!(t.warning <= t.critical && t.critical <= t.emergency);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(PressureLevel::Normal < PressureLevel::Warning);
        assert!(PressureLevel::Warning < PressureLevel::Critical);
        assert!(PressureLevel::Critical < PressureLevel::Emergency);
    }
}
