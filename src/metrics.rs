// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for admission decisions.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Service metrics, held in a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    admissions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let admissions = IntCounterVec::new(
            Opts::new(
                "action_guard_admissions_total",
                "Admission decisions by action and outcome",
            ),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(admissions.clone()))?;
        Ok(Self {
            registry,
            admissions,
        })
    }

    pub fn record(&self, action: &str, allowed: bool) {
        let outcome = if allowed { "allowed" } else { "denied" };
        self.admissions.with_label_values(&[action, outcome]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
