// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Decision tally for replayed schedules.

use action_guard::AdmissionResult;

/// Decisions recorded during a replay.
#[derive(Debug, Default)]
pub struct ReplayMetrics {
    /// Instants of admitted calls, in replay order
    admitted: Vec<u64>,
    /// Retry delays of denied calls (ms)
    denied: Vec<u64>,
}

impl ReplayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now: u64, result: AdmissionResult) {
        match result {
            AdmissionResult::Allowed { .. } => self.admitted.push(now),
            AdmissionResult::Denied { .. } => self.denied.push(result.retry_after_ms()),
        }
    }

    pub fn allowed(&self) -> usize {
        self.admitted.len()
    }

    pub fn denied(&self) -> usize {
        self.denied.len()
    }

    pub fn max_retry_after_ms(&self) -> u64 {
        self.denied.iter().copied().max().unwrap_or(0)
    }

    /// Largest number of admitted calls inside any half-open window
    /// `(t - window_ms, t]`.
    pub fn max_in_window(&self, window_ms: u64) -> usize {
        self.admitted
            .iter()
            .map(|&end| {
                self.admitted
                    .iter()
                    .filter(|&&t| t <= end && end - t < window_ms)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}
