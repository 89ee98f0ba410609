// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Ram solenoids, pump motor lines and indicator lamps on plain GPIO outputs.

use embedded_hal::digital::v2::OutputPin;

use super::{ActuatorOutputs, Indicators, Led, RamMap, CORNERS};
use crate::control::Direction;

/// Raise and lower solenoid for one physical ram.
pub struct RamPins<P: OutputPin> {
    pub raise: Led<P>,
    pub lower: Led<P>,
}

/// All controller outputs. Every pin shares one (type-erased) pin type.
pub struct GpioBank<P: OutputPin> {
    rams: [RamPins<P>; CORNERS],
    motor_raise: Led<P>,
    motor_lower: Led<P>,
    ready: Led<P>,
    fault_active: Led<P>,
    fault_clearable: Led<P>,
    map: RamMap,
}

impl<P: OutputPin> GpioBank<P> {
    /// `rams` is indexed by physical channel. All outputs start off.
    pub fn new(
        rams: [RamPins<P>; CORNERS],
        motor_raise: Led<P>,
        motor_lower: Led<P>,
        indicators: [Led<P>; 3],
    ) -> Self {
        let [ready, fault_active, fault_clearable] = indicators;
        let mut bank = Self {
            rams,
            motor_raise,
            motor_lower,
            ready,
            fault_active,
            fault_clearable,
            map: RamMap::default(),
        };
        bank.all_off();
        bank
    }

    pub fn with_map(mut self, map: RamMap) -> Self {
        self.map = map;
        self
    }

    /// Ram channel levels as `(raise, lower)`, indexed by physical channel.
    pub fn ram_levels(&self) -> [(bool, bool); CORNERS] {
        let mut out = [(false, false); CORNERS];
        for (o, ram) in out.iter_mut().zip(self.rams.iter()) {
            *o = (ram.raise.is_on(), ram.lower.is_on());
        }
        out
    }

    pub fn motor_levels(&self) -> (bool, bool) {
        (self.motor_raise.is_on(), self.motor_lower.is_on())
    }

    pub fn indicators(&self) -> Indicators {
        Indicators {
            ready: self.ready.is_on(),
            fault_active: self.fault_active.is_on(),
            fault_clearable: self.fault_clearable.is_on(),
        }
    }
}

impl<P: OutputPin> ActuatorOutputs for GpioBank<P> {
    fn set_corner(&mut self, index: usize, enabled: bool, raising: bool) {
        let ram = &mut self.rams[self.map.physical(index)];
        if raising {
            ram.lower.off();
            ram.raise.set(enabled);
        } else {
            ram.raise.off();
            ram.lower.set(enabled);
        }
    }

    fn set_motor(&mut self, direction: Direction) {
        match direction {
            Direction::Raise => {
                self.motor_lower.off();
                self.motor_raise.on();
            }
            Direction::Lower => {
                self.motor_raise.off();
                self.motor_lower.on();
            }
            Direction::None => {
                self.motor_raise.off();
                self.motor_lower.off();
            }
        }
    }

    fn set_indicators(&mut self, indicators: Indicators) {
        self.ready.set(indicators.ready);
        self.fault_active.set(indicators.fault_active);
        self.fault_clearable.set(indicators.fault_clearable);
    }
}
