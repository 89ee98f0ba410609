// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! - `Usart` is the transmit-only debug terminal. It implements `core::fmt::Write`, so the fault
//!   report and the console display can be written straight to it.
//! - `BufferedUsart` is a full-duplex port with a receive ring buffer, used as the
//!   [`ByteStream`] under the serial CAN adapter.
//!
//! Note: When using `writeln!`, be sure to include `\r` (CR) in the format string to ensure correct
//! line endings on the terminal.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```

use core::fmt;
use heapless::Deque;
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Rx, Serial, Tx},
};

use crate::protocol::{ByteStream, Error};

/// Receive buffer size of a [`BufferedUsart`]. Holds a little over 20 adapter frames.
pub const RX_CAPACITY: usize = 256;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

/// Polled full-duplex USART with a software receive buffer.
///
/// The hardware holds a single byte, so [`poll`](Self::poll) must run often enough to keep up with
/// the line rate; every [`ByteStream`] call polls first.
pub struct BufferedUsart<U: Instance> {
    tx: Tx<U>,
    rx: Rx<U>,
    buf: Deque<u8, RX_CAPACITY>,
    overruns: u32,
}

impl<U: Instance> BufferedUsart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, rx) = serial.split();
        Self {
            tx,
            rx,
            buf: Deque::new(),
            overruns: 0,
        }
    }

    /// Move every byte the peripheral holds into the ring buffer. The oldest byte is dropped when
    /// the buffer is full.
    pub fn poll(&mut self) {
        loop {
            match self.rx.read() {
                Ok(b) => {
                    if self.buf.is_full() {
                        self.buf.pop_front();
                    }
                    let _ = self.buf.push_back(b);
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    self.overruns = self.overruns.wrapping_add(1);
                    break;
                }
            }
        }
    }

    /// Receive errors (overrun, framing, noise) seen so far.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}

impl<U: Instance> ByteStream for BufferedUsart<U> {
    fn available(&mut self) -> usize {
        self.poll();
        self.buf.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.buf.is_empty() {
            self.poll();
        }
        self.buf.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            block!(self.tx.write(b)).map_err(|_| Error::Transport)?;
        }
        Ok(())
    }

    fn clear_rx(&mut self) {
        self.poll();
        self.buf.clear();
    }
}
