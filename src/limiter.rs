// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window admission limiter for reader actions.
//!
//! Each action key owns a persisted log of admitted call instants. A call is
//! admitted while fewer than `max_calls` entries fall inside the half-open
//! window `(now - window_ms, now]`. Denied calls never touch the log.
//!
//! The limiter is advisory. Storage failures are logged and treated as an
//! empty history so a broken store can never lock a reader out.

use crate::clock::{Clock, SystemClock};
use crate::history::ActionHistory;
use crate::policy::{ActionKey, AdmissionPolicy, PolicyError, PolicyTable};
use crate::storage::Storage;
use std::time::Duration;
use tracing::debug;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionResult {
    /// Call may proceed
    Allowed {
        /// Calls still available in the current window
        remaining: u32,
    },
    /// Call must wait
    Denied {
        /// Time until the oldest retained call leaves the window
        retry_after: Duration,
    },
}

impl AdmissionResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Retry delay in milliseconds, zero when allowed.
    pub fn retry_after_ms(&self) -> u64 {
        match self {
            Self::Allowed { .. } => 0,
            Self::Denied { retry_after } => retry_after.as_millis() as u64,
        }
    }
}

/// Admission limiter over an injected store and clock.
pub struct AdmissionLimiter<S, C = SystemClock> {
    storage: S,
    clock: C,
}

impl<S: Storage> AdmissionLimiter<S> {
    /// Create a limiter that reads the wall clock.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> AdmissionLimiter<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Check and, if allowed, record one call of `key` at `now` (ms).
    pub fn admit(&self, key: &ActionKey, policy: &AdmissionPolicy, now: u64) -> AdmissionResult {
        let mut history = ActionHistory::load(&self.storage, key);
        history.retain_recent(now, policy.window_ms());

        let max_calls = policy.max_calls() as usize;
        if history.len() >= max_calls {
            // Non-empty: max_calls >= 1
            let oldest = history.oldest().unwrap_or(now);
            let retry_after_ms = policy.window_ms().saturating_sub(now - oldest);
            debug!(action = %key, retry_after_ms, "Admission denied");
            return AdmissionResult::Denied {
                retry_after: Duration::from_millis(retry_after_ms),
            };
        }

        history.push(now);
        history.store(&self.storage);

        let remaining = (max_calls - history.len()) as u32;
        debug!(action = %key, remaining, "Admission granted");
        AdmissionResult::Allowed { remaining }
    }

    /// Fixed cooldown: at most one call of `key` per `interval_ms`.
    pub fn cooldown(
        &self,
        key: &ActionKey,
        interval_ms: u64,
        now: u64,
    ) -> Result<AdmissionResult, PolicyError> {
        let policy = AdmissionPolicy::cooldown(interval_ms)?;
        Ok(self.admit(key, &policy, now))
    }

    /// [`admit`](Self::admit) at the clock's current instant.
    pub fn admit_now(&self, key: &ActionKey, policy: &AdmissionPolicy) -> AdmissionResult {
        self.admit(key, policy, self.clock.now_ms())
    }

    /// [`cooldown`](Self::cooldown) at the clock's current instant.
    pub fn cooldown_now(
        &self,
        key: &ActionKey,
        interval_ms: u64,
    ) -> Result<AdmissionResult, PolicyError> {
        self.cooldown(key, interval_ms, self.clock.now_ms())
    }

    /// Admit `key` under its configured policy. `None` for unknown actions.
    pub fn admit_action(
        &self,
        table: &PolicyTable,
        key: &ActionKey,
        now: u64,
    ) -> Option<AdmissionResult> {
        table.get(key).map(|policy| self.admit(key, policy, now))
    }

    /// Drop stale entries from every configured history.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self, table: &PolicyTable, now: u64) -> usize {
        let mut removed = 0;
        for (key, policy) in table.iter() {
            let mut history = ActionHistory::load(&self.storage, key);
            let before = history.len();
            history.retain_recent(now, policy.window_ms());
            if history.len() < before {
                removed += before - history.len();
                history.store(&self.storage);
            }
        }
        if removed > 0 {
            debug!(removed, "Pruned stale admission entries");
        }
        removed
    }
}
