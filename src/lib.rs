// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Action Guard
//!
//! Advisory admission control for reader actions on the bilingual
//! (English/Bengali) editorial site, plus the row ID obfuscation codec used
//! in article URLs:
//!
//! - Sliding-window limiter per action (comment, reply, reaction, report)
//! - Fixed cooldown mode (one call per interval)
//! - Durable history through an injected key-value store
//! - Fail-open recovery from corrupt or unavailable storage
//! - Wait-time notices in English and Bengali
//! - Hashids-compatible ID encoding

pub mod clock;
pub mod config;
pub mod guard;
pub mod handlers;
pub mod history;
pub mod ids;
pub mod limiter;
pub mod metrics;
pub mod notice;
pub mod policy;
pub mod storage;

pub use config::Config;
pub use guard::{ActionGuard, Guarded};
pub use ids::IdCodec;
pub use limiter::{AdmissionLimiter, AdmissionResult};
pub use notice::{Language, Notice};
pub use policy::{ActionKey, AdmissionPolicy, PolicyTable};
pub use storage::{FileStorage, MemoryStorage, Storage};
