// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Vehicle bus protocol stack used to talk to the bus inclinometer.
//!
//! | Layer | Module |
//! | ----- | ------ |
//! | Byte stream / frame transport traits | [`transport`] |
//! | Serial adapter wire format (14-byte write, 12-byte read) | [`frame`] |
//! | J1939 identifiers, messages and addressing | [`j1939`] |
//! | Parameter group numbers used by the sensor | [`pgn`] |

use core::fmt;

pub mod frame;
pub mod j1939;
pub mod pgn;
pub mod transport;

pub use j1939::{J1939Id, J1939Interface, J1939Message};
pub use transport::{ByteStream, FrameTransport};

/// Error type for the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum Error {
    /// The underlying transport refused a write.
    Transport,
    /// Identifier does not fit in 29 bits, or a field is out of range.
    IdOutOfRange,
    /// Payload longer than a single CAN data frame.
    PayloadTooLong,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport => f.write_str("transport write failed"),
            Error::IdOutOfRange => f.write_str("identifier out of range"),
            Error::PayloadTooLong => f.write_str("payload longer than 8 bytes"),
        }
    }
}
