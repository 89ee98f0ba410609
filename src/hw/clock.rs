// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond time base from the DWT cycle counter.
//!
//! The counter wraps every 2^32 core cycles (about 19.9 s at 216 MHz), so [`DwtClock::now_ms`] must
//! be called at least that often. The control loop calls it every cycle.

use core::cell::Cell;

use cortex_m::peripheral::{DCB, DWT};

use crate::time::Clock;

pub struct DwtClock {
    cycles_per_ms: u32,
    last_cycles: Cell<u32>,
    /// Cycles not yet counted as a whole millisecond.
    remainder: Cell<u32>,
    ms: Cell<u32>,
}

impl DwtClock {
    /// Enable the cycle counter and start counting from zero.
    pub fn start(dcb: &mut DCB, dwt: &mut DWT, sysclk_hz: u32) -> Self {
        dcb.enable_trace();
        dwt.enable_cycle_counter();
        Self {
            cycles_per_ms: (sysclk_hz / 1000).max(1),
            last_cycles: Cell::new(DWT::cycle_count()),
            remainder: Cell::new(0),
            ms: Cell::new(0),
        }
    }
}

impl Clock for DwtClock {
    fn now_ms(&self) -> u32 {
        let now = DWT::cycle_count();
        let delta = now.wrapping_sub(self.last_cycles.get());
        self.last_cycles.set(now);

        let total = self.remainder.get() as u64 + delta as u64;
        let per = self.cycles_per_ms as u64;
        self.remainder.set((total % per) as u32);
        let ms = self.ms.get().wrapping_add((total / per) as u32);
        self.ms.set(ms);
        ms
    }
}
