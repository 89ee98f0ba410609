// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Tunable constants for the leveling controller.
//!
//! Defaults match the values the platform was commissioned with. Angles are stored in degrees
//! because that is how they are specified on site; use the `*_rad` accessors in control code.

use core::f64::consts::PI;
use core::fmt;

/// Configuration rejected by [`LevelerConfig::validate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum ConfigError {
    /// Deadband must be non-negative and strictly below the correction bound.
    Thresholds,
    /// Smoothing alpha must lie in (0, 1].
    SmoothingAlpha,
    /// A plausibility band or bound is not positive.
    Plausibility,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Thresholds => f.write_str("deadband must be in [0, correction bound)"),
            ConfigError::SmoothingAlpha => f.write_str("smoothing alpha must be in (0, 1]"),
            ConfigError::Plausibility => f.write_str("plausibility limits must be positive"),
        }
    }
}

/// Settings pushed to the bus inclinometer at start-up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BusSensorConfig {
    /// Address this controller claims on the bus.
    pub source_address: u8,
    /// Address of the inclinometer.
    pub sensor_address: u8,
    /// Output data rate code (10 = 10 Hz, 20 = 5 Hz).
    pub output_data_rate: u8,
    /// Bit mask of periodic messages to emit (1 = SSI2 only).
    pub periodic_types: u8,
    /// Digital low-pass filter cutoff code in Hz.
    pub low_pass_hz: u8,
    /// Orientation word written during provisioning.
    pub orientation: u16,
}

impl Default for BusSensorConfig {
    fn default() -> Self {
        Self {
            source_address: 0x11,
            sensor_address: 0x80,
            output_data_rate: 10,
            periodic_types: 1,
            low_pass_hz: 2,
            orientation: 0,
        }
    }
}

/// Complete controller configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelerConfig {
    /// Tilt beyond which a corner must be corrected (degrees).
    pub correct_tilt_deg: f64,
    /// Deadband inside which correction stops (degrees).
    pub stop_correcting_deg: f64,
    /// Exponential smoothing weight of a new sample; 1.0 disables smoothing.
    pub smoothing_alpha: f64,
    /// Yaw of the installed sensor relative to the platform (radians).
    pub installed_yaw_rad: f64,
    /// Time the platform must stay still before rams may move (ms).
    pub settle_ms: u32,
    /// Filtered angular rate below which the platform counts as still (degrees per second).
    pub stability_rate_deg_s: f64,
    /// Maximum age of the last accepted sample before the sensor is declared not ready (ms).
    pub sensor_timeout_ms: u32,
    /// Minimum interval between display refreshes (ms).
    pub display_period_ms: u32,
    /// Allowed deviation of the acceleration magnitude from 1 g.
    pub magnitude_band_g: f64,
    /// Largest believable angle reported by an angle-output sensor (degrees).
    pub angle_bound_deg: f64,
    /// Largest allowed difference between two redundant inclinometers (degrees).
    pub disagreement_deg: f64,
    /// Push the one-time orientation/EEPROM provisioning to the bus sensor at start-up.
    pub provision_sensor: bool,
    pub bus_sensor: BusSensorConfig,
}

impl Default for LevelerConfig {
    fn default() -> Self {
        Self {
            correct_tilt_deg: 0.1,
            stop_correcting_deg: 0.05,
            smoothing_alpha: 0.5,
            installed_yaw_rad: 0.0,
            settle_ms: 1000,
            stability_rate_deg_s: 0.001,
            sensor_timeout_ms: 500,
            display_period_ms: 1000,
            magnitude_band_g: 0.25,
            angle_bound_deg: 5.0,
            disagreement_deg: 0.5,
            provision_sensor: false,
            bus_sensor: BusSensorConfig::default(),
        }
    }
}

impl LevelerConfig {
    /// Set the correction bound and deadband (degrees).
    pub fn with_thresholds_deg(mut self, stop_correcting: f64, correct: f64) -> Self {
        self.stop_correcting_deg = stop_correcting;
        self.correct_tilt_deg = correct;
        self
    }

    pub fn with_smoothing_alpha(mut self, alpha: f64) -> Self {
        self.smoothing_alpha = alpha;
        self
    }

    pub fn with_installed_yaw_rad(mut self, yaw: f64) -> Self {
        self.installed_yaw_rad = yaw;
        self
    }

    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn with_stability_rate_deg_s(mut self, rate: f64) -> Self {
        self.stability_rate_deg_s = rate;
        self
    }

    pub fn with_sensor_timeout_ms(mut self, ms: u32) -> Self {
        self.sensor_timeout_ms = ms;
        self
    }

    pub fn with_display_period_ms(mut self, ms: u32) -> Self {
        self.display_period_ms = ms;
        self
    }

    pub fn with_provisioning(mut self, provision: bool) -> Self {
        self.provision_sensor = provision;
        self
    }

    #[inline]
    pub fn correct_tilt_rad(&self) -> f64 {
        self.correct_tilt_deg * PI / 180.0
    }

    #[inline]
    pub fn stop_correcting_rad(&self) -> f64 {
        self.stop_correcting_deg * PI / 180.0
    }

    #[inline]
    pub fn stability_rate_rad_s(&self) -> f64 {
        self.stability_rate_deg_s * PI / 180.0
    }

    #[inline]
    pub fn angle_bound_rad(&self) -> f64 {
        self.angle_bound_deg * PI / 180.0
    }

    #[inline]
    pub fn disagreement_rad(&self) -> f64 {
        self.disagreement_deg * PI / 180.0
    }

    /// Check the invariants the control code relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stop_correcting_deg >= 0.0 && self.stop_correcting_deg < self.correct_tilt_deg) {
            return Err(ConfigError::Thresholds);
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::SmoothingAlpha);
        }
        if !(self.magnitude_band_g > 0.0 && self.angle_bound_deg > 0.0 && self.disagreement_deg > 0.0)
        {
            return Err(ConfigError::Plausibility);
        }
        Ok(())
    }
}
