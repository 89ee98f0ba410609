// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The two ways the bus inclinometer can be reached.

use bxcan::Frame;
use stm32f7xx_hal::{can as hal_can, serial};

use super::{BufferedUsart, CanBus};
use crate::drivers::SerialCan;
use crate::protocol::{Error, FrameTransport};

/// Frame transport chosen at start-up: the external UART adapter or the on-chip bxCAN.
pub enum SensorLink<U: serial::Instance, I>
where
    hal_can::Can<I>: bxcan::Instance,
{
    Adapter(SerialCan<BufferedUsart<U>>),
    Native(CanBus<I>),
}

impl<U: serial::Instance, I> FrameTransport for SensorLink<U, I>
where
    hal_can::Can<I>: bxcan::Instance,
{
    fn has_frame(&mut self) -> bool {
        match self {
            SensorLink::Adapter(t) => t.has_frame(),
            SensorLink::Native(t) => t.has_frame(),
        }
    }

    fn read_frame(&mut self) -> Option<Frame> {
        match self {
            SensorLink::Adapter(t) => t.read_frame(),
            SensorLink::Native(t) => t.read_frame(),
        }
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        match self {
            SensorLink::Adapter(t) => t.write_frame(frame),
            SensorLink::Native(t) => t.write_frame(frame),
        }
    }

    fn flush(&mut self) {
        match self {
            SensorLink::Adapter(t) => t.flush(),
            SensorLink::Native(t) => t.flush(),
        }
    }
}
