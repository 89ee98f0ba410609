// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! UART-to-CAN adapter driver.
//!
//! The adapter has two modes. In command mode (entered with `+++`) it accepts `AT` lines; in data
//! mode every CAN frame crosses the UART in the fixed layout of [`crate::protocol::frame`].
//!
//! Start-up sequence, at the adapter's current serial rate:
//!
//! ```text
//! +++                       enter command mode
//! AT+S=<baud code>          serial rate (takes effect after re-opening the UART)
//! +++                       at the new rate
//! AT+C=<bitrate code>       CAN bitrate
//! AT+M=[0][1][1FFFFFFF]     accept every extended identifier
//! AT+Q                      back to data mode
//! ```

use core::fmt::Write;

use embedded_hal::blocking::delay::DelayMs;
use heapless::String;

use crate::protocol::frame::{decode, encode, FRAME_READ_LEN};
use crate::protocol::{ByteStream, Error, FrameTransport};

/// Serial rates the adapter understands, numbered as in its `AT+S` command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
#[repr(u8)]
pub enum SerialBaud {
    B9600 = 0,
    B19200 = 1,
    B38400 = 2,
    B57600 = 3,
    B115200 = 4,
}

impl SerialBaud {
    pub const ALL: [SerialBaud; 5] = [
        SerialBaud::B9600,
        SerialBaud::B19200,
        SerialBaud::B38400,
        SerialBaud::B57600,
        SerialBaud::B115200,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn bps(self) -> u32 {
        match self {
            SerialBaud::B9600 => 9_600,
            SerialBaud::B19200 => 19_200,
            SerialBaud::B38400 => 38_400,
            SerialBaud::B57600 => 57_600,
            SerialBaud::B115200 => 115_200,
        }
    }
}

/// CAN bitrates the adapter understands, numbered as in its `AT+C` command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
#[repr(u8)]
pub enum CanBitrate {
    Kbps5 = 1,
    Kbps10,
    Kbps20,
    Kbps25,
    Kbps31_2,
    Kbps33,
    Kbps40,
    Kbps50,
    Kbps80,
    Kbps83_3,
    Kbps95,
    Kbps100,
    Kbps125,
    Kbps200,
    Kbps250,
    Kbps500,
    Kbps666,
    Kbps1000,
}

impl CanBitrate {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Receive mask accepting every 29-bit identifier.
const ACCEPT_ALL_MASK: &str = "AT+M=[0][1][1FFFFFFF]";

/// Settle time after each command.
const COMMAND_DELAY_MS: u32 = 100;

/// Settle time after the escape sequence.
const ESCAPE_DELAY_MS: u32 = 10;

/// Frame transport over the adapter in data mode.
pub struct SerialCan<S: ByteStream> {
    stream: S,
}

impl<S: ByteStream> SerialCan<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn stream(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn free(self) -> S {
        self.stream
    }

    fn command(&mut self, args: core::fmt::Arguments<'_>) -> Result<(), Error> {
        let mut line: String<32> = String::new();
        line.write_fmt(args).map_err(|_| Error::PayloadTooLong)?;
        line.push_str("\r\n").map_err(|_| Error::PayloadTooLong)?;
        self.stream.write_all(line.as_bytes())
    }

    fn escape<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), Error> {
        self.stream.write_all(b"+++")?;
        delay.delay_ms(ESCAPE_DELAY_MS);
        Ok(())
    }

    /// Tell the adapter to switch its serial rate. The caller re-opens the UART at `baud.bps()`
    /// afterwards and then calls [`configure`](Self::configure).
    pub fn set_serial_baud<D: DelayMs<u32>>(
        &mut self,
        baud: SerialBaud,
        delay: &mut D,
    ) -> Result<(), Error> {
        self.escape(delay)?;
        self.command(format_args!("AT+S={}", baud.code()))?;
        delay.delay_ms(COMMAND_DELAY_MS);
        self.stream.clear_rx();
        Ok(())
    }

    /// Set the bus bitrate and receive mask, then return to data mode with an empty buffer.
    pub fn configure<D: DelayMs<u32>>(
        &mut self,
        bitrate: CanBitrate,
        delay: &mut D,
    ) -> Result<(), Error> {
        self.escape(delay)?;
        self.command(format_args!("AT+C={}", bitrate.code()))?;
        self.command(format_args!("{}", ACCEPT_ALL_MASK))?;
        delay.delay_ms(COMMAND_DELAY_MS);
        self.command(format_args!("AT+Q"))?;
        delay.delay_ms(COMMAND_DELAY_MS);
        self.stream.clear_rx();
        log_info!("serial CAN adapter configured: code {}", bitrate.code());
        Ok(())
    }
}

impl<S: ByteStream> FrameTransport for SerialCan<S> {
    fn has_frame(&mut self) -> bool {
        self.stream.available() >= FRAME_READ_LEN
    }

    fn read_frame(&mut self) -> Option<bxcan::Frame> {
        if !self.has_frame() {
            return None;
        }

        let mut buf = [0u8; FRAME_READ_LEN];
        for b in buf.iter_mut() {
            *b = self.stream.read_byte()?;
        }

        let frame = decode(&buf);
        if frame.is_none() {
            log_warn!("serial CAN stream out of step, flushing");
            self.stream.clear_rx();
        }
        frame
    }

    fn write_frame(&mut self, frame: &bxcan::Frame) -> Result<(), Error> {
        self.stream.write_all(&encode(frame))
    }

    fn flush(&mut self) {
        self.stream.clear_rx();
    }
}
