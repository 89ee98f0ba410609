// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Calibrated inclinometers.
//!
//! [`Inclinometer`] wires one [`SensorSource`] to a [`Model`], a pair of smoothed channels and the
//! plausibility checks. [`DualInclinometer`] runs two of them side by side and cross-checks them.
//! Both expose the [`AttitudeSource`] interface the motion controller consumes.

use libm::fabs;

use super::filter::FilteredChannel;
use super::model::{CalibrationFrame, Model};
use super::{AttitudeSample, RawMeasurement, SensorError, SensorSource};
use crate::config::LevelerConfig;
use crate::fault::{FaultCode, FaultHandler};
use crate::storage::CalibrationMap;

/// What the motion controller needs from the sensor stack.
pub trait AttitudeSource {
    /// Bring up the hardware. Failures are also latched as `SensorInit`.
    fn begin(&mut self) -> Result<(), SensorError>;

    /// Take a new sample if one is ready and plausible, returning the filtered attitude.
    fn poll(&mut self, now_ms: u32) -> Option<AttitudeSample>;

    /// Last filtered attitude.
    fn filtered(&self) -> AttitudeSample;

    /// Last unfiltered attitude.
    fn instantaneous(&self) -> AttitudeSample;

    /// Largest absolute filtered angular rate over both axes (rad/s).
    fn rate(&self) -> f64;

    /// Capture the latest raw reading as level. Writes the new frame(s) into `map` and returns
    /// `false` when no reading has been taken yet.
    fn zero(&mut self, map: &mut CalibrationMap) -> bool;

    /// Restore calibration from a persisted map.
    fn import_zero(&mut self, map: &CalibrationMap);
}

/// Plausibility bounds applied to every raw reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibilityLimits {
    /// Allowed deviation of the acceleration magnitude from 1 g.
    pub magnitude_band_g: f32,
    /// Largest believable absolute angle (radians) for angle-output sensors.
    pub angle_bound_rad: f64,
}

impl PlausibilityLimits {
    pub fn from_config(cfg: &LevelerConfig) -> Self {
        Self {
            magnitude_band_g: cfg.magnitude_band_g as f32,
            angle_bound_rad: cfg.angle_bound_rad(),
        }
    }
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        Self::from_config(&LevelerConfig::default())
    }
}

/// One calibrated, filtered, plausibility-checked inclinometer.
pub struct Inclinometer<'a, S: SensorSource> {
    source: S,
    model: Model,
    pitch: FilteredChannel,
    roll: FilteredChannel,
    limits: PlausibilityLimits,
    faults: &'a FaultHandler,
    last_raw: Option<RawMeasurement>,
    slot: usize,
}

impl<'a, S: SensorSource> Inclinometer<'a, S> {
    /// Build from the controller configuration. The installed yaw goes into the base frame.
    pub fn new(source: S, faults: &'a FaultHandler, cfg: &LevelerConfig) -> Self {
        let mut model = Model::new();
        model.set_base_frame(0.0, 0.0, cfg.installed_yaw_rad);
        Self {
            source,
            model,
            pitch: FilteredChannel::new(cfg.smoothing_alpha),
            roll: FilteredChannel::new(cfg.smoothing_alpha),
            limits: PlausibilityLimits::from_config(cfg),
            faults,
            last_raw: None,
            slot: 0,
        }
    }

    /// Calibration map slot this unit reads and writes.
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_limits(mut self, limits: PlausibilityLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn source(&mut self) -> &mut S {
        &mut self.source
    }

    /// A plausible reading has been taken since start-up.
    pub fn has_reading(&self) -> bool {
        self.last_raw.is_some()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Latch or clear the plausibility faults for `raw`. Returns `true` if the reading is usable.
    fn check(&self, raw: &RawMeasurement) -> bool {
        match raw {
            RawMeasurement::Acceleration(a) => {
                let magnitude = a.magnitude_g();
                let band = self.limits.magnitude_band_g;
                if magnitude > 1.0 + band || magnitude < 1.0 - band {
                    log_warn!("implausible acceleration magnitude {} g", magnitude);
                    self.faults.set_fault_code(FaultCode::ImplausibleReading);
                    false
                } else {
                    self.faults.unlatch_fault_code(FaultCode::ImplausibleReading);
                    true
                }
            }
            RawMeasurement::Angles { pitch, roll } => {
                let bound = self.limits.angle_bound_rad;
                if fabs(*pitch) > bound || fabs(*roll) > bound {
                    log_warn!("excess tilt reported: pitch {} roll {}", pitch, roll);
                    self.faults.set_fault_code(FaultCode::ExcessTilt);
                    false
                } else {
                    self.faults.unlatch_fault_code(FaultCode::ExcessTilt);
                    true
                }
            }
        }
    }

    fn reset_filters(&mut self) {
        self.pitch.reset();
        self.roll.reset();
    }

    /// Capture the latest reading as level and return the new frame.
    pub fn zero_frame(&mut self) -> Option<CalibrationFrame> {
        let raw = self.last_raw?;
        let frame = self.model.set_zero(&raw);
        self.reset_filters();
        log_info!("inclinometer {} zeroed", self.slot);
        Some(frame)
    }

    pub fn import_frame(&mut self, frame: &CalibrationFrame) {
        self.model.import_zero(frame);
        self.reset_filters();
    }
}

impl<'a, S: SensorSource> AttitudeSource for Inclinometer<'a, S> {
    fn begin(&mut self) -> Result<(), SensorError> {
        match self.source.begin() {
            Ok(()) => {
                log_info!("inclinometer {} ready", self.slot);
                Ok(())
            }
            Err(e) => {
                log_error!("inclinometer {} failed to start: {:?}", self.slot, e);
                self.faults.set_fault_code(FaultCode::SensorInit);
                Err(e)
            }
        }
    }

    fn poll(&mut self, now_ms: u32) -> Option<AttitudeSample> {
        if !self.source.has_data() {
            return None;
        }
        let raw = self.source.read()?;
        if !self.check(&raw) {
            return None;
        }

        self.last_raw = Some(raw);
        let sample = self.model.calculate(&raw);
        self.pitch.update(sample.pitch, now_ms);
        self.roll.update(sample.roll, now_ms);
        Some(self.filtered())
    }

    fn filtered(&self) -> AttitudeSample {
        AttitudeSample {
            pitch: self.pitch.filtered(),
            roll: self.roll.filtered(),
        }
    }

    fn instantaneous(&self) -> AttitudeSample {
        AttitudeSample {
            pitch: self.pitch.instantaneous(),
            roll: self.roll.instantaneous(),
        }
    }

    fn rate(&self) -> f64 {
        let (p, r) = (fabs(self.pitch.rate()), fabs(self.roll.rate()));
        if p > r {
            p
        } else {
            r
        }
    }

    fn zero(&mut self, map: &mut CalibrationMap) -> bool {
        match (self.zero_frame(), map.get_mut(self.slot)) {
            (Some(frame), Some(entry)) => {
                *entry = frame;
                true
            }
            _ => false,
        }
    }

    fn import_zero(&mut self, map: &CalibrationMap) {
        if let Some(frame) = map.get(self.slot) {
            self.import_frame(frame);
        }
    }
}

/// Two independently calibrated inclinometers checked against each other.
///
/// The output is the mean of the two latest filtered attitudes. If they differ by more than the
/// disagreement bound on either axis, `ReadingDisagreement` is latched and no sample is produced.
pub struct DualInclinometer<'a, A: SensorSource, B: SensorSource> {
    first: Inclinometer<'a, A>,
    second: Inclinometer<'a, B>,
    first_seen: bool,
    second_seen: bool,
    disagreement_rad: f64,
    faults: &'a FaultHandler,
}

impl<'a, A: SensorSource, B: SensorSource> DualInclinometer<'a, A, B> {
    pub fn new(
        first: A,
        second: B,
        faults: &'a FaultHandler,
        cfg: &LevelerConfig,
    ) -> Self {
        Self {
            first: Inclinometer::new(first, faults, cfg).with_slot(0),
            second: Inclinometer::new(second, faults, cfg).with_slot(1),
            first_seen: false,
            second_seen: false,
            disagreement_rad: cfg.disagreement_rad(),
            faults,
        }
    }

    pub fn first(&mut self) -> &mut Inclinometer<'a, A> {
        &mut self.first
    }

    pub fn second(&mut self) -> &mut Inclinometer<'a, B> {
        &mut self.second
    }

    fn mean(a: AttitudeSample, b: AttitudeSample) -> AttitudeSample {
        AttitudeSample {
            pitch: (a.pitch + b.pitch) / 2.0,
            roll: (a.roll + b.roll) / 2.0,
        }
    }
}

impl<'a, A: SensorSource, B: SensorSource> AttitudeSource for DualInclinometer<'a, A, B> {
    fn begin(&mut self) -> Result<(), SensorError> {
        let first = self.first.begin();
        let second = self.second.begin();
        first.and(second)
    }

    fn poll(&mut self, now_ms: u32) -> Option<AttitudeSample> {
        let a = self.first.poll(now_ms);
        let b = self.second.poll(now_ms);
        self.first_seen |= a.is_some();
        self.second_seen |= b.is_some();

        if (a.is_none() && b.is_none()) || !(self.first_seen && self.second_seen) {
            return None;
        }

        let (fa, fb) = (self.first.filtered(), self.second.filtered());
        if fabs(fa.pitch - fb.pitch) > self.disagreement_rad
            || fabs(fa.roll - fb.roll) > self.disagreement_rad
        {
            log_warn!("inclinometers disagree");
            self.faults.set_fault_code(FaultCode::ReadingDisagreement);
            return None;
        }

        Some(Self::mean(fa, fb))
    }

    fn filtered(&self) -> AttitudeSample {
        Self::mean(self.first.filtered(), self.second.filtered())
    }

    fn instantaneous(&self) -> AttitudeSample {
        Self::mean(self.first.instantaneous(), self.second.instantaneous())
    }

    fn rate(&self) -> f64 {
        let (a, b) = (self.first.rate(), self.second.rate());
        if a > b {
            a
        } else {
            b
        }
    }

    fn zero(&mut self, map: &mut CalibrationMap) -> bool {
        if !(self.first.has_reading() && self.second.has_reading()) {
            return false;
        }
        let first = self.first.zero(map);
        let second = self.second.zero(map);
        first && second
    }

    fn import_zero(&mut self, map: &CalibrationMap) {
        self.first.import_zero(map);
        self.second.import_zero(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSensor;
    use crate::sensor::AccelSample;

    fn flat(counts_per_g: u32, z: i32) -> RawMeasurement {
        RawMeasurement::Acceleration(AccelSample {
            x: 0,
            y: 0,
            z,
            counts_per_g,
        })
    }

    #[test]
    fn no_data_means_no_sample() {
        let faults = FaultHandler::new();
        let mut inc = Inclinometer::new(MockSensor::new(), &faults, &LevelerConfig::default());
        assert!(inc.poll(0).is_none());
        assert!(!faults.has_fault());
    }

    #[test]
    fn implausible_magnitude_latches_and_drops_sample() {
        let faults = FaultHandler::new();
        let mut inc = Inclinometer::new(MockSensor::new(), &faults, &LevelerConfig::default());

        inc.source().push(flat(256_000, 256_000 * 2));
        assert!(inc.poll(0).is_none());
        assert!(faults.is_latched(FaultCode::ImplausibleReading));

        inc.source().push(flat(256_000, 256_000));
        assert!(inc.poll(100).is_some());
        assert!(!faults.is_latched(FaultCode::ImplausibleReading));
    }

    #[test]
    fn magnitude_band_edges() {
        let faults = FaultHandler::new();
        let mut inc = Inclinometer::new(MockSensor::new(), &faults, &LevelerConfig::default());

        inc.source().push(flat(1000, 1240));
        assert!(inc.poll(0).is_some());
        inc.source().push(flat(1000, 760));
        assert!(inc.poll(10).is_some());
        inc.source().push(flat(1000, 740));
        assert!(inc.poll(20).is_none());
    }

    #[test]
    fn excess_tilt_latches_for_angle_sources() {
        let faults = FaultHandler::new();
        let mut inc = Inclinometer::new(MockSensor::new(), &faults, &LevelerConfig::default());

        inc.source().push(RawMeasurement::Angles {
            pitch: 6.0_f64.to_radians(),
            roll: 0.0,
        });
        assert!(inc.poll(0).is_none());
        assert!(faults.is_latched(FaultCode::ExcessTilt));
    }

    #[test]
    fn failed_begin_latches_sensor_init() {
        let faults = FaultHandler::new();
        let mut inc = Inclinometer::new(
            MockSensor::new().failing_begin(),
            &faults,
            &LevelerConfig::default(),
        );
        assert!(inc.begin().is_err());
        assert!(faults.is_latched(FaultCode::SensorInit));
    }

    #[test]
    fn zero_requires_a_reading_and_levels_output() {
        let faults = FaultHandler::new();
        let mut inc = Inclinometer::new(MockSensor::new(), &faults, &LevelerConfig::default());
        let mut map = [CalibrationFrame::identity(); 2];
        assert!(!inc.zero(&mut map));

        let tilted = RawMeasurement::Angles {
            pitch: 0.03,
            roll: -0.02,
        };
        inc.source().push(tilted);
        inc.poll(0);
        assert!(inc.zero(&mut map));
        assert_ne!(map[0], CalibrationFrame::identity());
        assert_eq!(map[1], CalibrationFrame::identity());

        inc.source().push(tilted);
        let out = inc.poll(100).unwrap();
        assert!(out.pitch.abs() < 1e-9);
        assert!(out.roll.abs() < 1e-9);
    }

    #[test]
    fn rate_reflects_filtered_motion() {
        let faults = FaultHandler::new();
        let cfg = LevelerConfig::default().with_smoothing_alpha(1.0);
        let mut inc = Inclinometer::new(MockSensor::new(), &faults, &cfg);

        inc.source().push(RawMeasurement::Angles {
            pitch: 0.0,
            roll: 0.0,
        });
        inc.poll(0);
        inc.source().push(RawMeasurement::Angles {
            pitch: 0.0,
            roll: -0.01,
        });
        inc.poll(100);
        assert!((inc.rate() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn dual_outputs_mean_when_agreeing() {
        let faults = FaultHandler::new();
        let mut dual =
            DualInclinometer::new(MockSensor::new(), MockSensor::new(), &faults, &LevelerConfig::default());

        dual.first().source().push(RawMeasurement::Angles {
            pitch: 0.010,
            roll: 0.0,
        });
        assert!(dual.poll(0).is_none());

        dual.second().source().push(RawMeasurement::Angles {
            pitch: 0.012,
            roll: 0.0,
        });
        let out = dual.poll(10).unwrap();
        assert!((out.pitch - 0.011).abs() < 1e-9);
        assert!(!faults.has_fault());
    }

    #[test]
    fn dual_latches_disagreement() {
        let faults = FaultHandler::new();
        let mut dual =
            DualInclinometer::new(MockSensor::new(), MockSensor::new(), &faults, &LevelerConfig::default());

        dual.first().source().push(RawMeasurement::Angles {
            pitch: 0.0,
            roll: 0.0,
        });
        dual.second().source().push(RawMeasurement::Angles {
            pitch: 1.0_f64.to_radians(),
            roll: 0.0,
        });
        assert!(dual.poll(0).is_none());
        assert!(faults.is_latched(FaultCode::ReadingDisagreement));
    }

    #[test]
    fn dual_zero_needs_both_readings() {
        let faults = FaultHandler::new();
        let mut dual =
            DualInclinometer::new(MockSensor::new(), MockSensor::new(), &faults, &LevelerConfig::default());

        dual.first().source().push(RawMeasurement::Angles {
            pitch: 0.02,
            roll: -0.01,
        });
        dual.poll(0);
        assert!(dual.first().has_reading());
        assert!(!dual.second().has_reading());

        let mut map = crate::storage::identity_map();
        assert!(!dual.zero(&mut map));
        assert_eq!(map, crate::storage::identity_map());
        assert_eq!(dual.first().model().zero_frame(), CalibrationFrame::identity());
    }
}
