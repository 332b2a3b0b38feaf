//! Sliding-window allocation tracking and leak heuristics.
//!
//! Uses DashMap for lock-free concurrent access from UI component hooks.
//! The heuristic is approximate by design: it flags suspicion, not proof,
//! and guarantees only determinism for identical input sequences.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A component type flagged by the leak heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakSuspect {
    pub component_type: String,
    pub suspicion_reason: String,
    /// How many most-recent closed windows showed positive net growth.
    pub consecutive_growth_windows: usize,
    /// Net allocations still outstanding (lifetime allocs minus deallocs).
    pub net_allocations: i64,
}

struct TypeCounters {
    /// Net delta inside the currently open window.
    open_window: i64,
    /// Per-window net deltas, oldest first, bounded at `window_count`.
    closed_windows: VecDeque<i64>,
    /// Lifetime net outstanding allocations.
    net_total: i64,
}

impl TypeCounters {
    fn new() -> Self {
        Self {
            open_window: 0,
            closed_windows: VecDeque::new(),
            net_total: 0,
        }
    }
}

/// Per-component-type allocation counters with window rolling.
pub struct AllocationTracker {
    counters: DashMap<String, TypeCounters>,
    window_count: usize,
    consecutive_growth: usize,
}

impl AllocationTracker {
    /// `window_count` (N) windows are retained; a type is flagged after
    /// `consecutive_growth` (K) most-recent windows of positive net growth.
    pub fn new(window_count: usize, consecutive_growth: usize) -> Self {
        Self {
            counters: DashMap::new(),
            window_count: window_count.max(1),
            consecutive_growth: consecutive_growth.max(1),
        }
    }

    pub fn track_allocation(&self, component_type: &str) {
        let mut entry = self
            .counters
            .entry(component_type.to_string())
            .or_insert_with(TypeCounters::new);
        entry.open_window += 1;
        entry.net_total += 1;
    }

    pub fn track_deallocation(&self, component_type: &str) {
        let mut entry = self
            .counters
            .entry(component_type.to_string())
            .or_insert_with(TypeCounters::new);
        entry.open_window -= 1;
        entry.net_total -= 1;
    }

    /// Close the current window for every tracked type. Called on each
    /// sampling tick.
    pub fn roll_window(&self) {
        for mut entry in self.counters.iter_mut() {
            let delta = entry.open_window;
            entry.open_window = 0;
            entry.closed_windows.push_back(delta);
            while entry.closed_windows.len() > self.window_count {
                entry.closed_windows.pop_front();
            }
        }
    }

    /// Flag types whose most-recent closed windows all grew.
    ///
    /// Deterministic: the same sequence of track and roll calls yields the
    /// same suspects. Output is sorted by component type.
    pub fn detect_leaks(&self) -> Vec<LeakSuspect> {
        let mut suspects: Vec<LeakSuspect> = self
            .counters
            .iter()
            .filter_map(|entry| {
                let streak = entry
                    .closed_windows
                    .iter()
                    .rev()
                    .take_while(|&&delta| delta > 0)
                    .count();
                if streak >= self.consecutive_growth && entry.net_total > 0 {
                    Some(LeakSuspect {
                        component_type: entry.key().clone(),
                        suspicion_reason: format!(
                            "net allocation growth for {} consecutive windows without \
                             a matching deallocation trend",
                            streak
                        ),
                        consecutive_growth_windows: streak,
                        net_allocations: entry.net_total,
                    })
                } else {
                    None
                }
            })
            .collect();
        suspects.sort_by(|a, b| a.component_type.cmp(&b.component_type));
        suspects
    }

    /// Reset all counters for a component type. Used after forced cleanup.
    pub fn reset(&self, component_type: &str) {
        self.counters.remove(component_type);
    }

    /// Lifetime net outstanding allocations for a type (0 if untracked).
    pub fn net_allocations(&self, component_type: &str) -> i64 {
        self.counters
            .get(component_type)
            .map(|c| c.net_total)
            .unwrap_or(0)
    }

    pub fn tracked_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.counters.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }
}
