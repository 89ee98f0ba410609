// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Inclination sensing.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`model`] | Rotation composition, zero capture and base frame |
//! | [`filter`] | Exponential smoothing and rate estimation |
//! | [`inclinometer`] | Source + model + filter + plausibility checks, and the redundant pair |
//!
//! A [`SensorSource`] produces [`RawMeasurement`]s; the drivers in [`crate::drivers`] implement it.

use core::fmt;

use micromath::F32Ext;

use crate::protocol;

pub mod filter;
pub mod inclinometer;
pub mod model;

pub use inclinometer::{AttitudeSource, DualInclinometer, Inclinometer, PlausibilityLimits};
pub use model::{CalibrationFrame, Model};

/// Calibrated or measured attitude in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeSample {
    pub pitch: f64,
    pub roll: f64,
}

impl AttitudeSample {
    pub const LEVEL: AttitudeSample = AttitudeSample {
        pitch: 0.0,
        roll: 0.0,
    };
}

/// Raw tri-axis accelerometer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelSample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Counts corresponding to 1 g in the configured range.
    pub counts_per_g: u32,
}

impl AccelSample {
    /// Magnitude of the vector in g.
    pub fn magnitude_g(&self) -> f32 {
        let scale = self.counts_per_g.max(1) as f32;
        let (x, y, z) = (self.x as f32 / scale, self.y as f32 / scale, self.z as f32 / scale);
        (x * x + y * y + z * z).sqrt()
    }
}

/// One reading from a sensor source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawMeasurement {
    /// Accelerometer-derived sensor.
    Acceleration(AccelSample),
    /// Sensor that reports decoded angles (radians).
    Angles { pitch: f64, roll: f64 },
}

/// Error type for sensor bring-up and reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum SensorError {
    /// SPI or I2C transfer failed, or chip select could not be driven.
    Bus,
    /// Device identified itself with an unexpected id.
    WrongDevice(u8),
    /// Vehicle bus protocol error.
    Protocol(protocol::Error),
}

impl From<protocol::Error> for SensorError {
    fn from(e: protocol::Error) -> Self {
        SensorError::Protocol(e)
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => f.write_str("sensor bus transfer failed"),
            SensorError::WrongDevice(id) => write!(f, "unexpected device id 0x{:02X}", id),
            SensorError::Protocol(e) => write!(f, "protocol: {}", e),
        }
    }
}

/// A device that produces raw readings. Never blocks.
pub trait SensorSource {
    /// Configure the device. Called once at start-up.
    fn begin(&mut self) -> Result<(), SensorError>;

    /// A reading is ready to be taken.
    fn has_data(&mut self) -> bool;

    /// Take the pending reading. `None` when nothing decodable was available.
    fn read(&mut self) -> Option<RawMeasurement>;
}

/// The closed set of sensor sources, chosen at construction.
pub enum Sensor<B, A> {
    /// Bus-attached inclinometer reporting angles.
    Bus(B),
    /// SPI accelerometer.
    Accel(A),
}

impl<B: SensorSource, A: SensorSource> SensorSource for Sensor<B, A> {
    fn begin(&mut self) -> Result<(), SensorError> {
        match self {
            Sensor::Bus(s) => s.begin(),
            Sensor::Accel(s) => s.begin(),
        }
    }

    fn has_data(&mut self) -> bool {
        match self {
            Sensor::Bus(s) => s.has_data(),
            Sensor::Accel(s) => s.has_data(),
        }
    }

    fn read(&mut self) -> Option<RawMeasurement> {
        match self {
            Sensor::Bus(s) => s.read(),
            Sensor::Accel(s) => s.read(),
        }
    }
}
