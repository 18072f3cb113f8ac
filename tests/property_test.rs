// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Property tests for the sliding-window bound.

mod harness;

use action_guard::{ActionKey, AdmissionLimiter, AdmissionPolicy, MemoryStorage, Storage};
use harness::metrics::ReplayMetrics;
use proptest::prelude::*;

/// Non-decreasing call instants built from random gaps.
fn schedule() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..5_000, 1..200).prop_map(|gaps| {
        gaps.iter()
            .scan(0u64, |t, gap| {
                *t += gap;
                Some(*t)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn admitted_calls_never_exceed_window_budget(
        window_ms in 1u64..20_000,
        max_calls in 1u32..10,
        calls in schedule(),
    ) {
        let policy = AdmissionPolicy::new(window_ms, max_calls).unwrap();
        let limiter = AdmissionLimiter::new(MemoryStorage::new());
        let key = ActionKey::new("reaction").unwrap();

        let mut metrics = ReplayMetrics::new();
        for &now in &calls {
            metrics.record(now, limiter.admit(&key, &policy, now));
        }

        prop_assert!(metrics.max_in_window(window_ms) <= max_calls as usize);
        prop_assert!(metrics.max_retry_after_ms() <= window_ms);
    }

    #[test]
    fn denial_leaves_history_untouched(
        window_ms in 1u64..20_000,
        max_calls in 1u32..5,
        calls in schedule(),
    ) {
        let policy = AdmissionPolicy::new(window_ms, max_calls).unwrap();
        let limiter = AdmissionLimiter::new(MemoryStorage::new());
        let key = ActionKey::new("report").unwrap();

        for &now in &calls {
            let before = limiter.storage().get(&key.history_key()).unwrap();
            let result = limiter.admit(&key, &policy, now);
            if !result.is_allowed() {
                let after = limiter.storage().get(&key.history_key()).unwrap();
                prop_assert_eq!(&before, &after);
                // Same instant, same history, same answer
                prop_assert_eq!(limiter.admit(&key, &policy, now), result);
            }
        }
    }
}
