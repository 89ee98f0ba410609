// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Parameter group numbers understood by the MTLT inclinometer.

/// Set output data rate (command).
pub const ODR: u32 = 65365;
/// Select which periodic messages are emitted (command).
pub const PERIODIC_DATA_TYPES: u32 = 65366;
/// Configure the digital low-pass filter (command).
pub const LOW_PASS: u32 = 65367;
/// Orientation configuration (command).
pub const ORIENTATION: u32 = 65368;
/// Persist the sensor configuration (command).
pub const SAVE_EEPROM: u32 = 65361;

/// Slope sensor information 2: pitch and roll (telemetry).
pub const SSI2DATA: u32 = 61481;
/// Echo of the enabled periodic set (telemetry).
pub const ENABLED_PERIODIC_DATA_TYPES: u32 = 61366;

/// Largest PGN that still uses destination-specific (peer-to-peer) addressing.
pub const PEER_TO_PEER_MAX: u32 = 0xEFFF;

/// PGNs occupy 18 bits of the identifier.
pub const PGN_MASK: u32 = 0x3_FFFF;
