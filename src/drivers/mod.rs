// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the transport traits (or the
//! `embedded-hal` bus traits) and below the application logic. None of them depend on the MCU, so
//! all are tested on the host.
//!
//! ## Existing drivers
//!
//! - [`serial_can`] – UART-to-CAN adapter: command mode set-up and the data-mode frame transport
//! - [`mtlt`] – J1939 bus inclinometer (SSI2 slope messages)
//! - [`adxl355`] – Analog Devices ADXL355 SPI accelerometer
//! - [`fram`] – I2C FRAM used as the calibration store

pub mod adxl355;
pub mod fram;
pub mod mtlt;
pub mod serial_can;

pub use adxl355::Adxl355;
pub use fram::Fram;
pub use mtlt::Mtlt;
pub use serial_can::{CanBitrate, SerialBaud, SerialCan};
