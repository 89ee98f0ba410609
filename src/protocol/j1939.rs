// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Minimal SAE J1939 layer: 29-bit identifiers, 8-byte messages, and destination addressing.
//!
//! Identifier layout:
//!
//! ```text
//!  28..26    25..8     7..0
//! priority |  PGN   | source
//! ```
//!
//! For peer-to-peer PGNs (`0 < pgn <= 0xEFFF`) bits 15..8 carry the destination address instead
//! of the low PGN byte. The destination is substituted only when the message is written.

use bxcan::{Data, ExtendedId, Frame, Id};

use super::frame::raw_id;
use super::pgn::{PEER_TO_PEER_MAX, PGN_MASK};
use super::{Error, FrameTransport};

/// Priority used for every command this controller sends.
pub const COMMAND_PRIORITY: u8 = 6;

/// `true` when messages with this PGN are addressed to a single node.
#[inline]
pub fn is_peer_to_peer(pgn: u32) -> bool {
    pgn > 0 && pgn <= PEER_TO_PEER_MAX
}

/// Parsed or composed J1939 identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct J1939Id {
    priority: u8,
    pgn: u32,
    source: u8,
}

impl J1939Id {
    /// Compose an identifier. Fails if `priority > 7` or `pgn` needs more than 18 bits.
    pub fn new(priority: u8, pgn: u32, source: u8) -> Result<Self, Error> {
        if priority > 7 || pgn > PGN_MASK {
            return Err(Error::IdOutOfRange);
        }
        Ok(Self {
            priority,
            pgn,
            source,
        })
    }

    /// Split a raw 29-bit identifier into its fields. Bits above 28 are ignored.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            priority: ((raw >> 26) & 0b111) as u8,
            pgn: (raw >> 8) & PGN_MASK,
            source: (raw & 0xFF) as u8,
        }
    }

    /// Packed identifier `priority << 26 | pgn << 8 | source`.
    #[inline]
    pub fn raw(&self) -> u32 {
        ((self.priority as u32) << 26) | (self.pgn << 8) | self.source as u32
    }

    /// Identifier as it goes on the wire when sent to `dest`.
    pub fn addressed_to(&self, dest: u8) -> u32 {
        let raw = self.raw();
        if is_peer_to_peer(self.pgn) {
            (raw & 0xFFFF_00FF) | ((dest as u32) << 8)
        } else {
            raw
        }
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    #[inline]
    pub fn pgn(&self) -> u32 {
        self.pgn
    }

    #[inline]
    pub fn source(&self) -> u8 {
        self.source
    }
}

/// A J1939 identifier plus an 8-byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct J1939Message {
    pub id: J1939Id,
    pub data: [u8; 8],
}

impl J1939Message {
    /// Command with one data byte: payload `[dest, d1, 0, 0, 0, 0, 0, 0]`.
    pub fn command(source: u8, dest: u8, pgn: u32, d1: u8) -> Result<Self, Error> {
        Self::with_payload(source, pgn, &[dest, d1])
    }

    /// Command with two data bytes: payload `[dest, d1, d2, 0, 0, 0, 0, 0]`.
    pub fn command2(source: u8, dest: u8, pgn: u32, d1: u8, d2: u8) -> Result<Self, Error> {
        Self::with_payload(source, pgn, &[dest, d1, d2])
    }

    /// Command-priority message with an arbitrary zero-padded payload.
    pub fn with_payload(source: u8, pgn: u32, payload: &[u8]) -> Result<Self, Error> {
        if payload.len() > 8 {
            return Err(Error::PayloadTooLong);
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id: J1939Id::new(COMMAND_PRIORITY, pgn, source)?,
            data,
        })
    }

    /// Interpret a received frame. Standard-identifier frames are not J1939 and yield `None`.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        if !matches!(frame.id(), Id::Extended(_)) {
            return None;
        }

        let mut data = [0u8; 8];
        if let Some(payload) = frame.data() {
            data[..payload.len()].copy_from_slice(payload);
        }

        Some(Self {
            id: J1939Id::from_raw(raw_id(frame.id())),
            data,
        })
    }

    /// Build the frame that carries this message to `dest`.
    pub fn to_frame(&self, dest: u8) -> Result<Frame, Error> {
        let id = ExtendedId::new(self.id.addressed_to(dest)).ok_or(Error::IdOutOfRange)?;
        let data = Data::new(&self.data).ok_or(Error::PayloadTooLong)?;
        Ok(Frame::new_data(id, data))
    }
}

/// J1939 messaging over any frame transport.
pub struct J1939Interface<T: FrameTransport> {
    transport: T,
}

impl<T: FrameTransport> J1939Interface<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Send `msg` to `dest`, substituting the destination address for peer-to-peer PGNs.
    pub fn write(&mut self, msg: &J1939Message, dest: u8) -> Result<(), Error> {
        let frame = msg.to_frame(dest)?;
        self.transport.write_frame(&frame)
    }

    /// Next J1939 message, or `None` if nothing usable was buffered.
    pub fn read(&mut self) -> Option<J1939Message> {
        let frame = self.transport.read_frame()?;
        J1939Message::from_frame(&frame)
    }

    #[inline]
    pub fn has_frame(&mut self) -> bool {
        self.transport.has_frame()
    }

    #[inline]
    pub fn flush(&mut self) {
        self.transport.flush();
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn free(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFrameTransport;
    use crate::protocol::pgn;

    #[test]
    fn peer_to_peer_range_is_one_through_efff() {
        assert!(!is_peer_to_peer(0));
        assert!(is_peer_to_peer(1));
        assert!(is_peer_to_peer(0xEFFF));
        assert!(!is_peer_to_peer(0xF000));
        assert!(!is_peer_to_peer(pgn::ODR));
        assert!(!is_peer_to_peer(pgn::SSI2DATA));
    }

    #[test]
    fn raw_identifier_packs_priority_pgn_source() {
        let id = J1939Id::new(6, pgn::LOW_PASS, 0x11).unwrap();
        assert_eq!(id.raw(), (6 << 26) | (65367 << 8) | 0x11);

        let parsed = J1939Id::from_raw(id.raw());
        assert_eq!(parsed, id);
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert_eq!(J1939Id::new(8, 0, 0), Err(Error::IdOutOfRange));
        assert_eq!(J1939Id::new(0, 1 << 18, 0), Err(Error::IdOutOfRange));
    }

    #[test]
    fn peer_to_peer_write_overwrites_bits_15_to_8_with_destination() {
        let id = J1939Id::new(6, 0x1234, 0x11).unwrap();
        let wire = id.addressed_to(0x80);
        assert_eq!(wire & 0xFF, 0x11);
        assert_eq!((wire >> 8) & 0xFF, 0x80);
        assert_eq!(wire >> 16, id.raw() >> 16);

        let broadcast = J1939Id::new(6, pgn::ODR, 0x11).unwrap();
        assert_eq!(broadcast.addressed_to(0x80), broadcast.raw());
    }

    #[test]
    fn command_builders_lay_out_payload() {
        let one = J1939Message::command(0x11, 0x80, pgn::ODR, 10).unwrap();
        assert_eq!(one.data, [0x80, 10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(one.id.priority(), 6);

        let two = J1939Message::command2(0x11, 0x80, pgn::ORIENTATION, 0x12, 0x34).unwrap();
        assert_eq!(two.data, [0x80, 0x12, 0x34, 0, 0, 0, 0, 0]);
        assert_eq!(two.id.pgn(), pgn::ORIENTATION);
        assert_eq!(two.id.source(), 0x11);
    }

    #[test]
    fn command_survives_write_then_read() {
        let mut bus = J1939Interface::new(MockFrameTransport::new());
        let msg = J1939Message::command2(0x11, 0x80, pgn::PERIODIC_DATA_TYPES, 0xAB, 0xCD).unwrap();
        bus.write(&msg, 0x80).unwrap();

        let sent = bus.transport().take_sent().unwrap();
        bus.transport().push_rx(sent);
        assert!(bus.has_frame());

        let back = bus.read().unwrap();
        assert_eq!(back.id.pgn(), msg.id.pgn());
        assert_eq!(back.id.source(), 0x11);
        assert_eq!(back.data, msg.data);
    }

    #[test]
    fn standard_frames_are_not_j1939() {
        let frame = Frame::new_data(bxcan::StandardId::new(0x10).unwrap(), Data::empty());
        assert!(J1939Message::from_frame(&frame).is_none());
    }
}
