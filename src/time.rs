// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond time base.
//!
//! All timestamps are `u32` milliseconds from a free-running counter that wraps roughly every
//! 49.7 days. Durations are always computed with [`elapsed_ms`] (wrapping subtraction), never by
//! comparing two absolute timestamps.

use core::cell::Cell;

/// Monotonic millisecond counter.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Milliseconds from `since` to `now`, correct across counter wraparound.
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Clock whose value is set by the caller. Used by host tests.
#[derive(Debug, Default)]
pub struct MockClock {
    now: Cell<u32>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn starting_at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    /// Advance the clock, wrapping like the hardware counter does.
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
