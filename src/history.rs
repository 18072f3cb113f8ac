// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Persisted timestamp log for one action.

use crate::policy::ActionKey;
use crate::storage::Storage;
use tracing::warn;

/// Admitted call instants (ms since epoch) for one action, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHistory {
    key: ActionKey,
    timestamps: Vec<u64>,
}

impl ActionHistory {
    pub fn new(key: ActionKey, timestamps: Vec<u64>) -> Self {
        Self { key, timestamps }
    }

    /// Read the history from storage.
    ///
    /// Missing, unreadable and corrupt entries all yield an empty history.
    pub fn load<S: Storage + ?Sized>(storage: &S, key: &ActionKey) -> Self {
        let storage_key = key.history_key();
        let timestamps = match storage.get(&storage_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(action = %key, error = %err, "Corrupt admission history, treating as empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(action = %key, error = %err, "Admission history unavailable, treating as empty");
                Vec::new()
            }
        };
        Self::new(key.clone(), timestamps)
    }

    /// Write the history back. Failures are logged, never returned.
    pub fn store<S: Storage + ?Sized>(&self, storage: &S) {
        let encoded = match serde_json::to_string(&self.timestamps) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(action = %self.key, error = %err, "Failed to encode admission history");
                return;
            }
        };
        if let Err(err) = storage.set(&self.key.history_key(), &encoded) {
            warn!(action = %self.key, error = %err, "Failed to persist admission history");
        }
    }

    /// Keep only entries inside the half-open window `(now - window_ms, now]`.
    ///
    /// Entries after `now` come from a clock that has since moved backwards
    /// and are dropped as well.
    pub fn retain_recent(&mut self, now: u64, window_ms: u64) {
        self.timestamps.retain(|&t| t <= now && now - t < window_ms);
    }

    pub fn push(&mut self, now: u64) {
        self.timestamps.push(now);
    }

    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Oldest retained entry.
    pub fn oldest(&self) -> Option<u64> {
        self.timestamps.first().copied()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
