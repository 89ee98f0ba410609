// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Persistent calibration map.
//!
//! The map holds one zero frame per inclinometer slot. On the memory device it is laid out as:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "LVL1" (little-endian u32)
//! 4       72    slot 0: 9 x f64 little-endian, row-major
//! 76      72    slot 1
//! ```
//!
//! A blank device or a frame that is not a rotation decodes to an error; callers fall back to
//! identity frames.

use core::fmt;

use crate::fault::{FaultCode, FaultHandler};
use crate::sensor::CalibrationFrame;

/// Number of calibration frames stored.
pub const CALIBRATION_SLOTS: usize = 2;

/// Zero frames for every inclinometer slot.
pub type CalibrationMap = [CalibrationFrame; CALIBRATION_SLOTS];

pub const MAP_MAGIC: u32 = 0x314C_564C;

const FRAME_LEN: usize = 9 * 8;

/// Serialized map size in bytes.
pub const MAP_LEN: usize = 4 + CALIBRATION_SLOTS * FRAME_LEN;

/// Orthonormality tolerance for stored frames.
const FRAME_TOLERANCE: f64 = 1e-6;

/// Error type for persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum StorageError {
    /// The memory device did not respond.
    Bus,
    /// No map has ever been written.
    Blank,
    /// A map is present but a frame is not a rotation.
    Corrupt,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Bus => f.write_str("memory device did not respond"),
            StorageError::Blank => f.write_str("calibration map is blank"),
            StorageError::Corrupt => f.write_str("calibration map is corrupt"),
        }
    }
}

/// Non-volatile home of the calibration map.
pub trait PersistentStore {
    fn begin(&mut self) -> Result<(), StorageError>;
    fn read_map(&mut self) -> Result<CalibrationMap, StorageError>;
    fn write_map(&mut self, map: &CalibrationMap) -> Result<(), StorageError>;
}

pub fn identity_map() -> CalibrationMap {
    [CalibrationFrame::identity(); CALIBRATION_SLOTS]
}

pub fn encode_map(map: &CalibrationMap) -> [u8; MAP_LEN] {
    let mut buf = [0u8; MAP_LEN];
    buf[0..4].copy_from_slice(&MAP_MAGIC.to_le_bytes());

    let values = map.iter().flat_map(|frame| frame.m.iter());
    for (chunk, v) in buf[4..].chunks_exact_mut(8).zip(values) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn decode_map(buf: &[u8; MAP_LEN]) -> Result<CalibrationMap, StorageError> {
    let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != MAP_MAGIC {
        return Err(StorageError::Blank);
    }

    let mut map = identity_map();
    for (slot, frame_bytes) in map.iter_mut().zip(buf[4..].chunks_exact(FRAME_LEN)) {
        for (v, chunk) in slot.m.iter_mut().zip(frame_bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *v = f64::from_le_bytes(raw);
        }
        if !slot.is_orthonormal(FRAME_TOLERANCE) {
            return Err(StorageError::Corrupt);
        }
    }
    Ok(map)
}

/// Start the store and load the map.
///
/// A store that fails to start latches `StorageInit`. Blank or corrupt maps yield identity frames.
pub fn load_calibration<P: PersistentStore>(
    store: &mut P,
    faults: &FaultHandler,
) -> CalibrationMap {
    if let Err(e) = store.begin() {
        log_error!("memory module failed to start: {:?}", e);
        faults.set_fault_code(FaultCode::StorageInit);
        return identity_map();
    }

    match store.read_map() {
        Ok(map) => {
            log_info!("calibration map loaded");
            map
        }
        Err(e) => {
            log_warn!("calibration map unusable ({:?}), using identity", e);
            identity_map()
        }
    }
}
