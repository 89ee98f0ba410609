// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wire format of the UART-to-CAN adapter in data mode.
//!
//! The adapter is asymmetric:
//!
//! ```text
//! write (14 bytes): id3 id2 id1 id0 | ext | rtr | d0 .. d7
//! read  (12 bytes): id3 id2 id1 id0 | d0 .. d7
//! ```
//!
//! The identifier is sent most-significant byte first. Short payloads are zero-padded to 8 bytes
//! on write; every received frame carries exactly 8 data bytes.

use bxcan::{Data, ExtendedId, Frame, Id};

/// Bytes sent to the adapter per frame.
pub const FRAME_WRITE_LEN: usize = 14;

/// Bytes received from the adapter per frame.
pub const FRAME_READ_LEN: usize = 12;

/// Raw numeric value of a bxcan identifier.
#[inline]
pub fn raw_id(id: Id) -> u32 {
    match id {
        Id::Standard(id) => id.as_raw() as u32,
        Id::Extended(id) => id.as_raw(),
    }
}

/// Serialize a frame into the adapter's 14-byte write layout.
pub fn encode(frame: &Frame) -> [u8; FRAME_WRITE_LEN] {
    let mut buf = [0u8; FRAME_WRITE_LEN];

    buf[0..4].copy_from_slice(&raw_id(frame.id()).to_be_bytes());
    buf[4] = matches!(frame.id(), Id::Extended(_)) as u8;
    buf[5] = frame.is_remote_frame() as u8;

    if let Some(data) = frame.data() {
        let n = data.len();
        buf[6..6 + n].copy_from_slice(data);
    }

    buf
}

/// Parse the adapter's 12-byte read layout.
///
/// Returns `None` when the identifier does not fit in 29 bits, which in practice means the
/// receive stream has slipped and should be flushed.
pub fn decode(buf: &[u8; FRAME_READ_LEN]) -> Option<Frame> {
    let raw = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let id = ExtendedId::new(raw)?;
    let data = Data::new(&buf[4..12])?;
    Some(Frame::new_data(id, data))
}
