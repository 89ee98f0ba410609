// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Non-blocking transport traits.
//!
//! Nothing here ever blocks: callers check readiness (`available`, `has_frame`) and treat an empty
//! result as "nothing this cycle".

use bxcan::Frame;

use super::Error;

/// Buffered, non-blocking byte stream (a UART with a receive ring buffer).
pub trait ByteStream {
    /// Number of bytes that can be read without waiting. Implementations may pull pending bytes
    /// out of the hardware first.
    fn available(&mut self) -> usize;

    /// Pop one received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue bytes for transmission.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Discard everything in the receive buffer.
    fn clear_rx(&mut self) {
        while self.read_byte().is_some() {}
    }
}

/// Anything that can exchange whole CAN frames.
pub trait FrameTransport {
    /// A complete frame is buffered and [`read_frame`](Self::read_frame) will not come back empty
    /// for lack of data.
    fn has_frame(&mut self) -> bool;

    /// Take the next frame. `None` when no frame is buffered or the bytes did not form a valid
    /// identifier.
    fn read_frame(&mut self) -> Option<Frame>;

    /// Queue a frame for transmission.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error>;

    /// Drop any partially or fully received frames.
    fn flush(&mut self);
}
