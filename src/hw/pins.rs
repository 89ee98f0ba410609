// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F767 leveler controller board.

use stm32f7xx_hal::{
    gpio::{
        gpioa, gpiob, gpiod, gpioe, Alternate, ErasedPin, Input, OpenDrain, Output, PullUp,
        PushPull,
    },
    pac,
    prelude::*,
};

/// Any push-pull output, with port and number erased so banks of them share one type.
pub type OutPin = ErasedPin<Output<PushPull>>;

/// Any pulled-up input.
pub type ButtonPin = ErasedPin<Input<PullUp>>;

/// All board pins. Construct this once at startup using:
///
/// ```text
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE, dp.GPIOF, dp.GPIOG);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub usart1: Usart1Pins,
    pub usart2: Usart2Pins,
    pub spi4: Spi4Pins,
    pub i2c1: I2c1Pins,
    pub can1: Can1Pins,
    pub rams: RamOutputPins,
    pub buttons: ButtonPins,
}

pub struct LedPins {
    /// Fault flash code.
    pub status: OutPin,
    pub heartbeat: OutPin,
}

/// Debug terminal.
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// Serial CAN adapter.
pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// SPI4 SCK/MISO/MOSI and the accelerometer CS
pub struct Spi4Pins {
    pub sck: gpioe::PE12<Alternate<5>>,
    pub miso: gpioe::PE13<Alternate<5>>,
    pub mosi: gpioe::PE14<Alternate<5>>,
    pub cs_accel: OutPin,
}

/// FRAM bus
pub struct I2c1Pins {
    pub scl: gpiob::PB8<Alternate<4, OpenDrain>>,
    pub sda: gpiob::PB9<Alternate<4, OpenDrain>>,
}

/// CAN1 bus pins
pub struct Can1Pins {
    pub tx: gpioa::PA12<Alternate<9>>,
    pub rx: gpioa::PA11<Alternate<9>>,
}

/// Ram solenoids (by physical channel), pump motor and indicator lamps.
pub struct RamOutputPins {
    pub raise: [OutPin; 4],
    pub lower: [OutPin; 4],
    pub motor_raise: OutPin,
    pub motor_lower: OutPin,
    pub ready: OutPin,
    pub fault_active: OutPin,
    pub fault_clearable: OutPin,
}

/// Operator buttons, all active-low.
pub struct ButtonPins {
    pub zero: ButtonPin,
    pub raise: ButtonPin,
    pub lower: ButtonPin,
    pub clear_fault: ButtonPin,
    pub provision: ButtonPin,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(
        gpioa: pac::GPIOA,
        gpiob: pac::GPIOB,
        gpioc: pac::GPIOC,
        gpiod: pac::GPIOD,
        gpioe: pac::GPIOE,
        gpiof: pac::GPIOF,
        gpiog: pac::GPIOG,
    ) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();
        let gpiof = gpiof.split();
        let gpiog = gpiog.split();

        Self {
            leds: LedPins {
                status: gpiod.pd8.into_push_pull_output().erase(),
                heartbeat: gpiod.pd10.into_push_pull_output().erase(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            usart2: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            spi4: Spi4Pins {
                sck: gpioe.pe12.into_alternate::<5>(),
                miso: gpioe.pe13.into_alternate::<5>(),
                mosi: gpioe.pe14.into_alternate::<5>(),
                cs_accel: gpioe.pe4.into_push_pull_output().erase(),
            },

            i2c1: I2c1Pins {
                scl: gpiob.pb8.into_alternate_open_drain::<4>(),
                sda: gpiob.pb9.into_alternate_open_drain::<4>(),
            },

            can1: Can1Pins {
                tx: gpioa.pa12.into_alternate::<9>(),
                rx: gpioa.pa11.into_alternate::<9>().internal_pull_up(true),
            },

            rams: RamOutputPins {
                raise: [
                    gpiof.pf0.into_push_pull_output().erase(),
                    gpiof.pf1.into_push_pull_output().erase(),
                    gpiof.pf2.into_push_pull_output().erase(),
                    gpiof.pf3.into_push_pull_output().erase(),
                ],
                lower: [
                    gpiof.pf4.into_push_pull_output().erase(),
                    gpiof.pf5.into_push_pull_output().erase(),
                    gpiof.pf6.into_push_pull_output().erase(),
                    gpiof.pf7.into_push_pull_output().erase(),
                ],
                motor_raise: gpiof.pf8.into_push_pull_output().erase(),
                motor_lower: gpiof.pf9.into_push_pull_output().erase(),
                ready: gpiog.pg0.into_push_pull_output().erase(),
                fault_active: gpiog.pg1.into_push_pull_output().erase(),
                fault_clearable: gpiog.pg2.into_push_pull_output().erase(),
            },

            buttons: ButtonPins {
                zero: gpioc.pc0.into_pull_up_input().erase(),
                raise: gpioc.pc1.into_pull_up_input().erase(),
                lower: gpioc.pc2.into_pull_up_input().erase(),
                clear_fault: gpioc.pc3.into_pull_up_input().erase(),
                provision: gpioc.pc6.into_pull_up_input().erase(),
            },
        }
    }
}
