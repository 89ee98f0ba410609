// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Diagnostic flash code.
//!
//! While any fault is latched, each latched code in turn is blinked on the fault LED:
//!
//! ```text
//! class pulses (short)  gap  index pulses (long)  report + pause
//! fatal: 2, recoverable: 1    one per class_index()
//! ```
//!
//! After the pause the next latched code (wrapping) is shown. A freshly latched fault restarts the
//! animation from the lowest latched code. Nothing is emitted while the table is clear.

use super::{FaultClass, FaultCode, FaultHandler};
use crate::time::elapsed_ms;

pub const SHORT_ON_MS: u32 = 150;
pub const SHORT_OFF_MS: u32 = 150;
pub const GAP_MS: u32 = 600;
pub const LONG_ON_MS: u32 = 600;
pub const LONG_OFF_MS: u32 = 300;
pub const PAUSE_MS: u32 = 2000;

/// Output of one flasher step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FlashFrame {
    /// Fault LED level.
    pub led: bool,
    /// The textual report should be printed now (once per pattern).
    pub report: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Class,
    Gap,
    Index,
    Pause,
}

/// Flash-code sequencer. Owned by the firmware loop and stepped with the fault table.
#[derive(Debug)]
pub struct FaultFlasher {
    phase: Phase,
    code: Option<FaultCode>,
    pulses_done: u8,
    led: bool,
    since_ms: u32,
    generation: u32,
}

impl Default for FaultFlasher {
    fn default() -> Self {
        Self::new()
    }
}

fn class_pulses(code: FaultCode) -> u8 {
    match code.class() {
        FaultClass::Fatal => 2,
        FaultClass::Recoverable => 1,
    }
}

impl FaultFlasher {
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            code: None,
            pulses_done: 0,
            led: false,
            since_ms: 0,
            generation: 0,
        }
    }

    /// Code currently being shown.
    pub fn current(&self) -> Option<FaultCode> {
        self.code
    }

    fn start_pattern(&mut self, code: FaultCode, now: u32) {
        self.code = Some(code);
        self.phase = Phase::Class;
        self.pulses_done = 0;
        self.led = true;
        self.since_ms = now;
    }

    /// Advance the pattern to `now`.
    pub fn step(&mut self, faults: &FaultHandler, now: u32) -> FlashFrame {
        let first = match faults.next_fault(0) {
            Some(code) => code,
            None => {
                self.phase = Phase::Idle;
                self.code = None;
                self.led = false;
                return FlashFrame::default();
            }
        };

        if self.phase == Phase::Idle || faults.generation() != self.generation {
            self.generation = faults.generation();
            self.start_pattern(first, now);
            return FlashFrame {
                led: self.led,
                report: false,
            };
        }

        let Some(code) = self.code else {
            self.start_pattern(first, now);
            return FlashFrame {
                led: self.led,
                report: false,
            };
        };

        let elapsed = elapsed_ms(now, self.since_ms);
        let mut report = false;

        match self.phase {
            Phase::Idle => {}
            Phase::Class => {
                if self.pulse(elapsed, now, SHORT_ON_MS, SHORT_OFF_MS, class_pulses(code)) {
                    self.phase = Phase::Gap;
                }
            }
            Phase::Gap => {
                if elapsed >= GAP_MS {
                    self.phase = Phase::Index;
                    self.pulses_done = 0;
                    self.led = true;
                    self.since_ms = now;
                }
            }
            Phase::Index => {
                if self.pulse(elapsed, now, LONG_ON_MS, LONG_OFF_MS, code.class_index()) {
                    self.phase = Phase::Pause;
                    report = true;
                }
            }
            Phase::Pause => {
                if elapsed >= PAUSE_MS {
                    let next = faults
                        .next_fault(code.ordinal() + 1)
                        .unwrap_or(first);
                    self.start_pattern(next, now);
                }
            }
        }

        FlashFrame {
            led: self.led,
            report,
        }
    }

    /// Run one on/off pulse train. Returns `true` once `count` pulses have completed.
    fn pulse(&mut self, elapsed: u32, now: u32, on_ms: u32, off_ms: u32, count: u8) -> bool {
        if self.led {
            if elapsed >= on_ms {
                self.led = false;
                self.since_ms = now;
            }
            return false;
        }

        if elapsed < off_ms {
            return false;
        }

        self.pulses_done += 1;
        self.since_ms = now;
        if self.pulses_done >= count {
            true
        } else {
            self.led = true;
            false
        }
    }
}
