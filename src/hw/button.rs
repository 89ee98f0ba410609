// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Push-button input with edge detection.

use embedded_hal::digital::v2::InputPin;

use crate::actuators::ActiveLevel;

/// Level change seen by [`Button::poll`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, defmt::Format)]
pub enum Edge {
    Pressed,
    Released,
}

/// Button wrapper that reports each press and release once.
pub struct Button<PIN: InputPin> {
    pin: PIN,
    active: ActiveLevel,
    was_pressed: bool,
}

impl<PIN: InputPin> Button<PIN> {
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        Self {
            pin,
            active,
            was_pressed: false,
        }
    }

    /// Button to ground with a pull-up.
    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    pub fn is_pressed(&self) -> bool {
        match self.active {
            ActiveLevel::High => self.pin.is_high().unwrap_or(false),
            ActiveLevel::Low => self.pin.is_low().unwrap_or(false),
        }
    }

    /// Sample the pin. Call once per loop; the edge is reported on the first poll after it.
    pub fn poll(&mut self) -> Option<Edge> {
        let now = self.is_pressed();
        let edge = match (self.was_pressed, now) {
            (false, true) => Some(Edge::Pressed),
            (true, false) => Some(Edge::Released),
            _ => None,
        };
        self.was_pressed = now;
        edge
    }

    /// `true` on the first poll after the button goes down.
    pub fn pressed(&mut self) -> bool {
        self.poll() == Some(Edge::Pressed)
    }
}
