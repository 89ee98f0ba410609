// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Latched fault table.
//!
//! Every component that can detect a problem holds a shared `&FaultHandler` and latches a
//! [`FaultCode`]. The motion controller only ever reads the table. Codes are partitioned by
//! ordinal:
//!
//! | Range | Class | Cleared by |
//! | ----- | ----- | ---------- |
//! | `0..FATAL_END` | fatal | explicit [`FaultHandler::unlatch_fault_code`] (restart) |
//! | `FATAL_END+1..RETRYABLE_END` | recoverable | [`UnlatchEvent`]s or explicit unlatch |
//!
//! `FATAL_END`, `RETRYABLE_END` and `ALL_OK` are range sentinels and are not representable as a
//! [`FaultCode`], so they can never be latched.
//!
//! The table uses interior mutability because it is shared by reference between the sensor
//! stack and the controller inside one single-threaded loop.

use core::cell::Cell;
use core::fmt;

pub mod flasher;

pub use flasher::{FaultFlasher, FlashFrame};

/// Ordinal one past the last fatal code.
pub const FATAL_END: u8 = 2;
/// Ordinal one past the last recoverable code.
pub const RETRYABLE_END: u8 = 7;
/// Terminal "all clear" sentinel.
pub const ALL_OK: u8 = 8;

/// Fault conditions known to the system.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
#[repr(u8)]
pub enum FaultCode {
    /// An inclinometer failed to start.
    SensorInit = 0,
    /// The persistent memory module failed to start.
    StorageInit = 1,
    /// No sample accepted within the staleness timeout.
    SensorNotReady = 3,
    /// Acceleration magnitude far from 1 g.
    ImplausibleReading = 4,
    /// Redundant inclinometers disagree.
    ReadingDisagreement = 5,
    /// Angle-output sensor reported a tilt outside its believable range.
    ExcessTilt = 6,
}

/// Fatal faults need a restart; recoverable ones clear on events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum FaultClass {
    Fatal,
    Recoverable,
}

impl FaultCode {
    /// Every latchable code in ordinal order.
    pub const ALL: [FaultCode; 6] = [
        FaultCode::SensorInit,
        FaultCode::StorageInit,
        FaultCode::SensorNotReady,
        FaultCode::ImplausibleReading,
        FaultCode::ReadingDisagreement,
        FaultCode::ExcessTilt,
    ];

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.ordinal() == ordinal)
    }

    pub fn class(self) -> FaultClass {
        if self.ordinal() < FATAL_END {
            FaultClass::Fatal
        } else {
            FaultClass::Recoverable
        }
    }

    #[inline]
    pub fn is_fatal(self) -> bool {
        self.class() == FaultClass::Fatal
    }

    /// 1-based position inside its class. This is the number of long pulses in the flash code.
    pub fn class_index(self) -> u8 {
        match self.class() {
            FaultClass::Fatal => self.ordinal() + 1,
            FaultClass::Recoverable => self.ordinal() - FATAL_END,
        }
    }

    /// Short label for displays and the fault report.
    pub fn name(self) -> &'static str {
        match self {
            FaultCode::SensorInit => "SENSOR INIT",
            FaultCode::StorageInit => "MEMORY INIT",
            FaultCode::SensorNotReady => "SENSOR NOT READY",
            FaultCode::ImplausibleReading => "IMPLAUSIBLE READING",
            FaultCode::ReadingDisagreement => "SENSOR DISAGREE",
            FaultCode::ExcessTilt => "EXCESS TILT",
        }
    }

    /// Operator hint shown under the name. Fits one 20-column display line.
    pub fn help(self) -> &'static str {
        match self {
            FaultCode::SensorInit => "Incl. start failed",
            FaultCode::StorageInit => "Memory start failed",
            FaultCode::SensorNotReady => "Sensor timed out",
            FaultCode::ImplausibleReading => "Reading out of range",
            FaultCode::ReadingDisagreement => "Sensors disagree",
            FaultCode::ExcessTilt => "Tilt beyond range",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events that clear a fixed set of recoverable faults.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum UnlatchEvent {
    /// A valid sample was accepted from the sensor stack.
    SensorDataReceived,
    /// The operator released the raise/lower command.
    MovementCommandEnd,
}

impl UnlatchEvent {
    /// Recoverable codes cleared by this event.
    pub fn clears(self) -> &'static [FaultCode] {
        match self {
            UnlatchEvent::SensorDataReceived => &[FaultCode::SensorNotReady],
            UnlatchEvent::MovementCommandEnd => &[
                FaultCode::ImplausibleReading,
                FaultCode::ReadingDisagreement,
                FaultCode::ExcessTilt,
            ],
        }
    }
}

/// Process-lifetime fault latch table.
#[derive(Debug, Default)]
pub struct FaultHandler {
    latched: Cell<u16>,
    now_ms: Cell<u32>,
    last_latched_ms: Cell<u32>,
    generation: Cell<u32>,
}

impl FaultHandler {
    pub const fn new() -> Self {
        Self {
            latched: Cell::new(0),
            now_ms: Cell::new(0),
            last_latched_ms: Cell::new(0),
            generation: Cell::new(0),
        }
    }

    /// Timestamp applied to latches made during this step.
    #[inline]
    pub fn set_time(&self, now_ms: u32) {
        self.now_ms.set(now_ms);
    }

    #[inline]
    fn bit(code: FaultCode) -> u16 {
        1 << code.ordinal()
    }

    /// Latch `code`. Re-latching an already latched code changes nothing.
    pub fn set_fault_code(&self, code: FaultCode) {
        let mask = self.latched.get();
        if mask & Self::bit(code) != 0 {
            return;
        }
        self.latched.set(mask | Self::bit(code));
        self.last_latched_ms.set(self.now_ms.get());
        self.generation.set(self.generation.get().wrapping_add(1));
        log_warn!("fault latched: {:?}", code);
    }

    /// Clear `code` regardless of its class.
    pub fn unlatch_fault_code(&self, code: FaultCode) {
        let mask = self.latched.get();
        if mask & Self::bit(code) != 0 {
            self.latched.set(mask & !Self::bit(code));
            log_info!("fault unlatched: {:?}", code);
        }
    }

    /// Clear the recoverable codes mapped to `event`.
    pub fn on_unlatch_event(&self, event: UnlatchEvent) {
        for &code in event.clears() {
            if !code.is_fatal() {
                self.unlatch_fault_code(code);
            }
        }
    }

    #[inline]
    pub fn is_latched(&self, code: FaultCode) -> bool {
        self.latched.get() & Self::bit(code) != 0
    }

    fn any_in(&self, start: u8, end: u8) -> bool {
        (start..end)
            .filter_map(FaultCode::from_ordinal)
            .any(|c| self.is_latched(c))
    }

    pub fn has_fault(&self) -> bool {
        self.any_in(0, ALL_OK)
    }

    pub fn has_major_fault(&self) -> bool {
        self.any_in(0, FATAL_END)
    }

    pub fn has_minor_fault(&self) -> bool {
        self.any_in(FATAL_END, ALL_OK)
    }

    /// Lowest latched code whose ordinal is `>= from`.
    pub fn next_fault(&self, from: u8) -> Option<FaultCode> {
        (from..ALL_OK)
            .filter_map(FaultCode::from_ordinal)
            .find(|&c| self.is_latched(c))
    }

    pub fn fault_count(&self) -> u32 {
        self.latched.get().count_ones()
    }

    /// Time of the most recent clear-to-latched transition.
    #[inline]
    pub fn last_latched_ms(&self) -> u32 {
        self.last_latched_ms.get()
    }

    /// Bumped on every clear-to-latched transition. The flasher restarts its animation when it
    /// changes.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }

    /// Write the latch state of every code.
    pub fn write_report<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        writeln!(w, "FAULT REPORT:")?;
        for code in FaultCode::ALL {
            let class = match code.class() {
                FaultClass::Fatal => "Fatal",
                FaultClass::Recoverable => "Recoverable",
            };
            writeln!(
                w,
                "{} Fault #{} {}: {}",
                class,
                code.class_index(),
                code.name(),
                self.is_latched(code) as u8
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_not_codes() {
        assert!(FaultCode::from_ordinal(FATAL_END).is_none());
        assert!(FaultCode::from_ordinal(RETRYABLE_END).is_none());
        assert!(FaultCode::from_ordinal(ALL_OK).is_none());
        for code in FaultCode::ALL {
            assert_eq!(FaultCode::from_ordinal(code.ordinal()), Some(code));
        }
    }

    #[test]
    fn ranges_partition_codes() {
        assert!(FaultCode::SensorInit.is_fatal());
        assert!(FaultCode::StorageInit.is_fatal());
        assert!(!FaultCode::SensorNotReady.is_fatal());
        assert!(!FaultCode::ExcessTilt.is_fatal());
        assert!(FaultCode::ExcessTilt.ordinal() < RETRYABLE_END);
    }

    #[test]
    fn class_index_is_one_based() {
        assert_eq!(FaultCode::SensorInit.class_index(), 1);
        assert_eq!(FaultCode::StorageInit.class_index(), 2);
        assert_eq!(FaultCode::SensorNotReady.class_index(), 1);
        assert_eq!(FaultCode::ExcessTilt.class_index(), 4);
    }

    #[test]
    fn relatch_keeps_first_timestamp() {
        let faults = FaultHandler::new();
        faults.set_time(100);
        faults.set_fault_code(FaultCode::ImplausibleReading);
        let generation = faults.generation();

        faults.set_time(900);
        faults.set_fault_code(FaultCode::ImplausibleReading);

        assert_eq!(faults.last_latched_ms(), 100);
        assert_eq!(faults.generation(), generation);
    }

    #[test]
    fn major_and_minor_scan_their_ranges() {
        let faults = FaultHandler::new();
        assert!(!faults.has_fault());

        faults.set_fault_code(FaultCode::SensorNotReady);
        assert!(faults.has_fault());
        assert!(faults.has_minor_fault());
        assert!(!faults.has_major_fault());

        faults.set_fault_code(FaultCode::StorageInit);
        assert!(faults.has_major_fault());
        assert_eq!(faults.fault_count(), 2);
    }

    #[test]
    fn unlatch_event_clears_only_its_mapped_codes() {
        let faults = FaultHandler::new();
        faults.set_fault_code(FaultCode::SensorInit);
        faults.set_fault_code(FaultCode::SensorNotReady);
        faults.set_fault_code(FaultCode::ImplausibleReading);
        faults.set_fault_code(FaultCode::ExcessTilt);

        faults.on_unlatch_event(UnlatchEvent::MovementCommandEnd);
        assert!(faults.is_latched(FaultCode::SensorInit));
        assert!(faults.is_latched(FaultCode::SensorNotReady));
        assert!(!faults.is_latched(FaultCode::ImplausibleReading));
        assert!(!faults.is_latched(FaultCode::ExcessTilt));

        faults.on_unlatch_event(UnlatchEvent::SensorDataReceived);
        assert!(!faults.is_latched(FaultCode::SensorNotReady));
        assert!(faults.is_latched(FaultCode::SensorInit));
    }

    #[test]
    fn explicit_unlatch_clears_fatal() {
        let faults = FaultHandler::new();
        faults.set_fault_code(FaultCode::StorageInit);
        faults.unlatch_fault_code(FaultCode::StorageInit);
        assert!(!faults.has_fault());
    }

    #[test]
    fn next_fault_returns_lowest_latched_at_or_after() {
        let faults = FaultHandler::new();
        faults.set_fault_code(FaultCode::StorageInit);
        faults.set_fault_code(FaultCode::ReadingDisagreement);

        assert_eq!(faults.next_fault(0), Some(FaultCode::StorageInit));
        assert_eq!(faults.next_fault(1), Some(FaultCode::StorageInit));
        assert_eq!(faults.next_fault(2), Some(FaultCode::ReadingDisagreement));
        assert_eq!(faults.next_fault(6), None);
    }

    #[test]
    fn report_lists_every_code() {
        let faults = FaultHandler::new();
        faults.set_fault_code(FaultCode::ExcessTilt);

        let mut out = String::new();
        faults.write_report(&mut out).unwrap();
        assert!(out.starts_with("FAULT REPORT:"));
        assert_eq!(out.lines().count(), 1 + FaultCode::ALL.len());
        assert!(out.contains("Recoverable Fault #4 EXCESS TILT: 1"));
        assert!(out.contains("Fatal Fault #1 SENSOR INIT: 0"));
    }

    #[test]
    fn labels_fit_one_display_line() {
        for code in FaultCode::ALL {
            assert!(code.name().len() <= 20);
            assert!(code.help().len() <= 20);
        }
    }
}
