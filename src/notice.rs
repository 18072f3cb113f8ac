// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Wait-time notices shown to readers when an action is denied.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Site display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

/// Transient, non-blocking notice carrying the retry delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    retry_after: Duration,
    language: Language,
}

impl Notice {
    pub fn new(retry_after: Duration, language: Language) -> Self {
        Self {
            retry_after,
            language,
        }
    }

    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }

    /// Whole seconds to wait, rounded up, never less than one.
    pub fn wait_secs(&self) -> u64 {
        self.retry_after.as_millis().div_ceil(1000).max(1) as u64
    }

    pub fn message(&self) -> String {
        let secs = self.wait_secs();
        match self.language {
            Language::En if secs == 1 => {
                "Please wait 1 second before trying again.".to_string()
            }
            Language::En => format!("Please wait {secs} seconds before trying again."),
            Language::Bn => format!(
                "আবার চেষ্টা করার আগে অনুগ্রহ করে {} সেকেন্ড অপেক্ষা করুন।",
                bengali_digits(secs)
            ),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Render a number with Bengali numerals.
pub fn bengali_digits(n: u64) -> String {
    const DIGITS: [char; 10] = ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'];
    n.to_string()
        .chars()
        .map(|c| c.to_digit(10).map_or(c, |d| DIGITS[d as usize]))
        .collect()
}
