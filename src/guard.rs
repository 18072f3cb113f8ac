// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Wraps a reader action (comment, reply, reaction, report) in an admission check.
//!
//! A denied action is never invoked; the caller gets a [`Notice`] to show.
//! An admitted action runs and its own result is passed back untouched.

use crate::clock::{Clock, SystemClock};
use crate::limiter::{AdmissionLimiter, AdmissionResult};
use crate::notice::{Language, Notice};
use crate::policy::{ActionKey, PolicyTable};
use crate::storage::Storage;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("No admission policy configured for action {0}")]
    UnknownAction(ActionKey),
}

/// Outcome of a guarded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    /// The action ran and produced this value
    Ran(T),
    /// The action was not attempted
    Denied(Notice),
}

impl<T> Guarded<T> {
    pub fn ran(self) -> Option<T> {
        match self {
            Self::Ran(value) => Some(value),
            Self::Denied(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Ran(_) => None,
            Self::Denied(notice) => Some(notice),
        }
    }
}

/// Admission check in front of async reader actions.
pub struct ActionGuard<S, C = SystemClock> {
    limiter: Arc<AdmissionLimiter<S, C>>,
    policies: PolicyTable,
    language: Language,
}

impl<S: Storage, C: Clock> ActionGuard<S, C> {
    pub fn new(limiter: Arc<AdmissionLimiter<S, C>>, policies: PolicyTable) -> Self {
        Self {
            limiter,
            policies,
            language: Language::default(),
        }
    }

    /// Language used for denial notices.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn limiter(&self) -> &AdmissionLimiter<S, C> {
        &self.limiter
    }

    /// Run `action` if `key` is admitted right now.
    pub async fn run<F, Fut, T>(&self, key: &ActionKey, action: F) -> Result<Guarded<T>, GuardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let now = self.limiter.clock().now_ms();
        let result = self
            .limiter
            .admit_action(&self.policies, key, now)
            .ok_or_else(|| GuardError::UnknownAction(key.clone()))?;

        match result {
            AdmissionResult::Allowed { .. } => Ok(Guarded::Ran(action().await)),
            AdmissionResult::Denied { retry_after } => {
                let notice = Notice::new(retry_after, self.language);
                info!(action = %key, wait_secs = notice.wait_secs(), "Action throttled");
                Ok(Guarded::Denied(notice))
            }
        }
    }
}
