// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Call schedule generators.

/// Evenly spaced calls: `count` calls, `gap_ms` apart, starting at `start`.
pub fn steady(start: u64, count: usize, gap_ms: u64) -> Vec<u64> {
    (0..count as u64).map(|i| start + i * gap_ms).collect()
}

/// Double-click style bursts: `bursts` groups of `per_burst` calls 1 ms
/// apart, groups separated by `pause_ms`.
pub fn bursts(start: u64, bursts: usize, per_burst: usize, pause_ms: u64) -> Vec<u64> {
    let mut schedule = Vec::with_capacity(bursts * per_burst);
    let mut t = start;
    for _ in 0..bursts {
        for _ in 0..per_burst {
            schedule.push(t);
            t += 1;
        }
        t += pause_ms;
    }
    schedule
}

/// A schedule whose clock jumps back by `rollback_ms` halfway through.
pub fn clock_rollback(start: u64, count: usize, gap_ms: u64, rollback_ms: u64) -> Vec<u64> {
    let half = count / 2;
    let mut schedule = steady(start, half, gap_ms);
    let resume = schedule
        .last()
        .map_or(start, |&last| last.saturating_sub(rollback_ms));
    schedule.extend(steady(resume, count - half, gap_ms));
    schedule
}
