// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Single digital output with a configurable active level.
//!
//! Used for solenoid valves, the pump contactor, indicator lamps and the fault LED alike.

use embedded_hal::digital::v2::OutputPin;

/// Whether the output is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// Output that remembers its active level and last commanded state.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Wrap a pin, initializing it to OFF.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut led = Self {
            pin,
            active,
            is_on: true,
        };
        led.set(false);
        led
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    /// Drive the output logically ON (true) or OFF (false).
    ///
    /// Pin errors are ignored; GPIO writes on this target are infallible.
    pub fn set(&mut self, on: bool) {
        let high = match self.active {
            ActiveLevel::High => on,
            ActiveLevel::Low => !on,
        };
        if high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        self.is_on = on;
    }

    #[inline]
    pub fn on(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn starts_off_at_correct_level() {
        let high = Led::active_high(MockPin::new());
        assert!(!high.is_on());
        assert!(!high.free().is_high());

        let low = Led::active_low(MockPin::new());
        assert!(low.free().is_high());
    }

    #[test]
    fn active_low_inverts() {
        let mut led = Led::active_low(MockPin::new());
        led.on();
        assert!(led.is_on());
        assert!(!led.free().is_high());
    }

    #[test]
    fn toggle_flips() {
        let mut led = Led::active_high(MockPin::new());
        led.toggle();
        assert!(led.is_on());
        led.toggle();
        assert!(!led.is_on());
    }
}
