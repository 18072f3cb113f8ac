// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for replaying reader behaviour against the admission limiter.
//!
//! Generators produce call schedules (millisecond instants); metrics tally
//! the decisions and check the sliding-window bound afterwards.

#![allow(dead_code)]

pub mod generators;
pub mod metrics;
