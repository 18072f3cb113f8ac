// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the action guard service.
//!
//! Defaults cover the four reader actions the site rate-limits: comments,
//! replies, reactions and reports.

use crate::policy::{ActionKey, AdmissionPolicy, PolicyError, PolicyTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "ACTION_GUARD_CONFIG";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Invalid policy for action {action}: {source}")]
    Policy {
        action: String,
        #[source]
        source: PolicyError,
    },
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 127.0.0.1:8787)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Persisted history storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admission policy per action key
    #[serde(default = "default_policies")]
    pub policies: BTreeMap<String, PolicyConfig>,

    /// Identifier codec settings
    #[serde(default)]
    pub ids: IdConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Where admission histories are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding all histories; `None` keeps them in memory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Interval between stale-entry sweeps in seconds (default: 300)
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

/// Sliding-window settings for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Rolling window length in milliseconds
    pub window_ms: u64,
    /// Admitted calls per window
    pub max_calls: u32,
}

/// Settings for the row ID obfuscation codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default)]
    pub salt: String,

    /// Minimum encoded length (default: 8)
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_prune_interval_secs() -> u64 {
    300
}

fn default_policies() -> BTreeMap<String, PolicyConfig> {
    [
        ("comment", 60_000, 5),
        ("reply", 60_000, 5),
        ("reaction", 60_000, 20),
        ("report", 300_000, 3),
    ]
    .into_iter()
    .map(|(action, window_ms, max_calls)| {
        (
            action.to_string(),
            PolicyConfig {
                window_ms,
                max_calls,
            },
        )
    })
    .collect()
}

fn default_min_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            storage: StorageConfig::default(),
            policies: default_policies(),
            ids: IdConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            salt: String::new(),
            min_length: default_min_length(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl StorageConfig {
    /// Get the prune interval
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs)
    }
}

impl PolicyConfig {
    /// Validate into an admission policy.
    pub fn to_policy(self) -> Result<AdmissionPolicy, PolicyError> {
        AdmissionPolicy::new(self.window_ms, self.max_calls)
    }
}

impl Config {
    /// Read a JSON config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `ACTION_GUARD_CONFIG` (if set), then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// - `BIND_ADDR`: server bind address
    /// - `STORAGE_PATH`: history file path
    /// - `ID_SALT`: codec salt
    /// - `ID_MIN_LENGTH`: minimum encoded ID length
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(path) = lookup("STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Some(salt) = lookup("ID_SALT") {
            self.ids.salt = salt;
        }
        if let Some(value) = lookup("ID_MIN_LENGTH") {
            self.ids.min_length = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "ID_MIN_LENGTH",
                value,
            })?;
        }
        Ok(self)
    }

    /// Reject values that would only fail once the service is running.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.prune_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.prune_interval_secs",
                reason: "must be greater than zero",
            });
        }
        if self.metrics.enabled && !self.metrics.path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "metrics.path",
                reason: "must start with '/'",
            });
        }
        self.policy_table().map(|_| ())
    }

    /// Validate every configured action and policy into a lookup table.
    pub fn policy_table(&self) -> Result<PolicyTable, ConfigError> {
        self.policies
            .iter()
            .map(|(action, policy)| {
                ActionKey::new(action.as_str())
                    .and_then(|key| policy.to_policy().map(|p| (key, p)))
                    .map_err(|source| ConfigError::Policy {
                        action: action.clone(),
                        source,
                    })
            })
            .collect()
    }
}
