// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Ram, pump motor and indicator outputs.
//!
//! The controller talks to an [`ActuatorOutputs`] implementation using logical corner indices
//! (plane quadrants). [`GpioBank`] maps them onto physical ram channels with a [`RamMap`].

use crate::control::Direction;

pub mod gpio_bank;
pub mod led;

pub use gpio_bank::{GpioBank, RamPins};
pub use led::{ActiveLevel, Led};

/// Number of corners / rams.
pub const CORNERS: usize = 4;

/// Indicator lamp levels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub struct Indicators {
    /// No fault latched and the controller accepts movement requests.
    pub ready: bool,
    /// A fault is latched or the controller is in `Faulted`.
    pub fault_active: bool,
    /// In `Faulted` with nothing latched any more; a clear request will be accepted.
    pub fault_clearable: bool,
}

/// Output side of the controller.
pub trait ActuatorOutputs {
    /// Drive corner `index`'s ram in the raise or lower group.
    ///
    /// Enabling one group always releases the other group for that ram.
    fn set_corner(&mut self, index: usize, enabled: bool, raising: bool);

    /// Pump motor line for a direction; `Direction::None` switches it off.
    fn set_motor(&mut self, direction: Direction);

    fn set_indicators(&mut self, _indicators: Indicators) {}

    /// Every ram and the motor off.
    fn all_off(&mut self) {
        for i in 0..CORNERS {
            self.set_corner(i, false, true);
            self.set_corner(i, false, false);
        }
        self.set_motor(Direction::None);
    }
}

/// Logical corner to physical ram channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RamMap([usize; CORNERS]);

impl RamMap {
    pub const IDENTITY: RamMap = RamMap([0, 1, 2, 3]);

    /// Site numbering: ram 1 sits in quadrant 3, ram 2 in quadrant 0, ram 3 in quadrant 1 and
    /// ram 4 in quadrant 2 (channels are zero-based).
    pub const SITE: RamMap = RamMap([1, 2, 3, 0]);

    /// `None` unless `channels` is a permutation of `0..4`.
    pub fn new(channels: [usize; CORNERS]) -> Option<Self> {
        let mut seen = [false; CORNERS];
        for &c in &channels {
            if c >= CORNERS || seen[c] {
                return None;
            }
            seen[c] = true;
        }
        Some(Self(channels))
    }

    #[inline]
    pub fn physical(&self, corner: usize) -> usize {
        self.0[corner % CORNERS]
    }

    /// Inverse lookup: which corner drives `channel`.
    pub fn logical(&self, channel: usize) -> Option<usize> {
        self.0.iter().position(|&c| c == channel)
    }
}

impl Default for RamMap {
    fn default() -> Self {
        Self::SITE
    }
}
