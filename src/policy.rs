// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission policies and action keys.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Policy and key construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Window must be greater than zero")]
    ZeroWindow,

    #[error("At least one call per window must be admitted")]
    ZeroMaxCalls,

    #[error("Action key must not be empty")]
    EmptyKey,

    #[error("Action key must not contain whitespace: {0:?}")]
    InvalidKey(String),
}

/// Name of a rate-limited action category, e.g. `comment` or `report`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionKey(String);

impl ActionKey {
    pub fn new(key: impl Into<String>) -> Result<Self, PolicyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(PolicyError::EmptyKey);
        }
        if key.chars().any(char::is_whitespace) {
            return Err(PolicyError::InvalidKey(key));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key holding this action's history.
    pub fn history_key(&self) -> String {
        format!("rate_limit_{}_history", self.0)
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ActionKey {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Sliding-window admission policy: at most `max_calls` per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    window_ms: u64,
    max_calls: u32,
}

impl AdmissionPolicy {
    pub fn new(window_ms: u64, max_calls: u32) -> Result<Self, PolicyError> {
        if window_ms == 0 {
            return Err(PolicyError::ZeroWindow);
        }
        if max_calls == 0 {
            return Err(PolicyError::ZeroMaxCalls);
        }
        Ok(Self {
            window_ms,
            max_calls,
        })
    }

    /// Fixed cooldown: one call per `interval_ms`.
    pub fn cooldown(interval_ms: u64) -> Result<Self, PolicyError> {
        Self::new(interval_ms, 1)
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Policies for every action the site rate-limits.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: BTreeMap<ActionKey, AdmissionPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ActionKey, policy: AdmissionPolicy) -> Option<AdmissionPolicy> {
        self.policies.insert(key, policy)
    }

    pub fn get(&self, key: &ActionKey) -> Option<&AdmissionPolicy> {
        self.policies.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActionKey, &AdmissionPolicy)> {
        self.policies.iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl FromIterator<(ActionKey, AdmissionPolicy)> for PolicyTable {
    fn from_iter<I: IntoIterator<Item = (ActionKey, AdmissionPolicy)>>(iter: I) -> Self {
        Self {
            policies: iter.into_iter().collect(),
        }
    }
}
