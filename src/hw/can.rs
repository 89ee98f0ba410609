// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Controller Area Network (CAN) abstraction layer.
//!
//! - `CanBus` wraps a HAL `can::Can` instance in `bxcan::Can`.
//! - Implements [`FrameTransport`] without ever blocking: a frame is only taken from the receive
//!   FIFO when one is there, and a full transmit mailbox set is reported as an error.

use bxcan::{self, filter::Mask32, Fifo, Frame};
use stm32f7xx_hal::can as hal_can;

use crate::protocol::{Error, FrameTransport};

/// Wrapper around a bxcan CAN instance built from a HAL CAN peripheral.
pub struct CanBus<I>
where
    hal_can::Can<I>: bxcan::Instance,
{
    can: bxcan::Can<hal_can::Can<I>>,
    /// Frame taken from the FIFO by `has_frame` and not yet read.
    pending: Option<Frame>,
}

impl<I> CanBus<I>
where
    hal_can::Can<I>: bxcan::Instance,
{
    /// Create and enable a bxcan instance from a HAL CAN peripheral.
    ///
    /// * `hal_can` – the HAL CAN wrapper
    /// * `btr` – value for the CAN_BTR register (bit timing). Get this from the
    ///           reference manual or the bxcan timing tables.
    /// * `loopback` – enable internal loopback
    /// * `silent` – enable silent mode
    pub fn new(hal_can: hal_can::Can<I>, btr: u32, loopback: bool, silent: bool) -> Self {
        let can = bxcan::Can::builder(hal_can)
            .set_bit_timing(btr)
            .set_loopback(loopback)
            .set_silent(silent)
            .enable();

        Self { can, pending: None }
    }

    /// Access the underlying bxcan instance for advanced configuration.
    pub fn inner(&mut self) -> &mut bxcan::Can<hal_can::Can<I>> {
        &mut self.can
    }

    /// Consume the wrapper and get back the underlying HAL CAN instance.
    pub fn free(self) -> hal_can::Can<I> {
        self.can.free()
    }

    fn poll_rx(&mut self) -> Option<Frame> {
        match self.can.receive() {
            Ok(frame) => Some(frame),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                log_warn!("CAN receive FIFO overrun");
                None
            }
        }
    }
}

impl<I> CanBus<I>
where
    hal_can::Can<I>: bxcan::Instance + bxcan::FilterOwner,
{
    /// Route every frame, standard or extended, to FIFO0 through filter bank 0.
    pub fn accept_all(&mut self) {
        self.can
            .modify_filters()
            .enable_bank(0, Fifo::Fifo0, Mask32::accept_all());
    }
}

impl<I> FrameTransport for CanBus<I>
where
    hal_can::Can<I>: bxcan::Instance,
{
    fn has_frame(&mut self) -> bool {
        if self.pending.is_none() {
            self.pending = self.poll_rx();
        }
        self.pending.is_some()
    }

    fn read_frame(&mut self) -> Option<Frame> {
        match self.pending.take() {
            Some(frame) => Some(frame),
            None => self.poll_rx(),
        }
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        match self.can.transmit(frame) {
            Ok(_) => Ok(()),
            Err(nb::Error::WouldBlock) => Err(Error::Transport),
            Err(nb::Error::Other(never)) => match never {},
        }
    }

    fn flush(&mut self) {
        self.pending = None;
        while self.poll_rx().is_some() {}
    }
}
