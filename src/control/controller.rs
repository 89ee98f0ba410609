// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motion controller.
//!
//! Owns the motion state and drives the outputs. Call [`MotionController::step`] at a fixed
//! cadence with the current millisecond time:
//!
//! ```ignore
//! controller.initialize(clock.now_ms());
//! loop {
//!     let now = clock.now_ms();
//!     controller.step(now);
//!     controller.update_display(&mut lcd, now);
//! }
//! ```
//!
//! Each step:
//!
//! 1. polls the sensor; an accepted sample fires `SensorDataReceived` and feeds the stability
//!    timer,
//! 2. latches `SensorNotReady` if no sample has been accepted within the staleness timeout,
//! 3. consumes the pending request through [`transition`] and runs entry/exit effects,
//! 4. while `Moving`, re-runs the corner algorithm and drives the rams,
//! 5. refreshes the indicator outputs.

use crate::actuators::{ActuatorOutputs, Indicators, CORNERS};
use crate::config::LevelerConfig;
use crate::display::{DisplayRenderer, DisplaySnapshot};
use crate::fault::{FaultHandler, UnlatchEvent, FaultCode};
use crate::sensor::{AttitudeSample, AttitudeSource};
use crate::storage::CalibrationMap;
use crate::time::elapsed_ms;

use super::corner::CornerAlgorithm;
use super::motion::{transition, Direction, MotionState, Request, TransitionInput};

/// Why a zero request was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum ZeroError {
    /// Zeroing is only allowed while stopped.
    NotStopped,
    /// No reading has been taken yet.
    NoReading,
}

/// Leveling controller over a borrowed sensor stack and owned outputs.
pub struct MotionController<'a, S: AttitudeSource, O: ActuatorOutputs> {
    sensor: &'a mut S,
    outputs: O,
    faults: &'a FaultHandler,
    corners: CornerAlgorithm,

    state: MotionState,
    direction: Direction,
    pending: Option<Request>,

    /// Drive enables last applied, per logical corner.
    applied: [bool; CORNERS],
    motor_enabled: bool,
    attitude: AttitudeSample,

    settle_ms: u32,
    stability_rate: f64,
    sensor_timeout_ms: u32,
    display_period_ms: u32,

    now_ms: u32,
    last_sample_ms: u32,
    last_unstable_ms: u32,
    last_display_ms: Option<u32>,
}

impl<'a, S: AttitudeSource, O: ActuatorOutputs> MotionController<'a, S, O> {
    pub fn new(sensor: &'a mut S, outputs: O, faults: &'a FaultHandler, cfg: &LevelerConfig) -> Self {
        Self {
            sensor,
            outputs,
            faults,
            corners: CornerAlgorithm::new(cfg.stop_correcting_rad(), cfg.correct_tilt_rad()),
            state: MotionState::NotRunning,
            direction: Direction::None,
            pending: None,
            applied: [false; CORNERS],
            motor_enabled: false,
            attitude: AttitudeSample::LEVEL,
            settle_ms: cfg.settle_ms,
            stability_rate: cfg.stability_rate_rad_s(),
            sensor_timeout_ms: cfg.sensor_timeout_ms,
            display_period_ms: cfg.display_period_ms,
            now_ms: 0,
            last_sample_ms: 0,
            last_unstable_ms: 0,
            last_display_ms: None,
        }
    }

    /// Force every output off and start the timers at `now_ms`.
    pub fn initialize(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
        self.last_sample_ms = now_ms;
        self.last_unstable_ms = now_ms;
        self.last_display_ms = None;
        self.state = MotionState::NotRunning;
        self.direction = Direction::None;
        self.pending = None;
        self.outputs.all_off();
        self.applied = [false; CORNERS];
        self.motor_enabled = false;
        self.outputs.set_indicators(self.indicators());
    }

    pub fn request_raise(&mut self) {
        self.pending = Some(Request::Raise);
    }

    pub fn request_lower(&mut self) {
        self.pending = Some(Request::Lower);
    }

    pub fn request_off(&mut self) {
        self.pending = Some(Request::Off);
    }

    pub fn request_clear_fault(&mut self) {
        self.pending = Some(Request::ClearFault);
    }

    /// Queue a request; the latest one wins and is consumed on the next step.
    pub fn request(&mut self, request: Request) {
        self.pending = Some(request);
    }

    /// Run one control cycle. Returns the state after the cycle.
    pub fn step(&mut self, now_ms: u32) -> MotionState {
        self.now_ms = now_ms;
        self.faults.set_time(now_ms);

        self.poll_sensor(now_ms);

        if elapsed_ms(now_ms, self.last_sample_ms) > self.sensor_timeout_ms {
            self.faults.set_fault_code(FaultCode::SensorNotReady);
        }

        let request = self.pending.take();
        let input = TransitionInput {
            request,
            fault_latched: self.faults.has_fault(),
            settled: self.is_settled(now_ms),
        };
        let next = transition(self.state, input);

        if let Some(req) = request {
            self.apply_direction(req, next);
        }

        if next != self.state {
            log_info!("motion: {:?} -> {:?}", self.state, next);
            let prev = self.state;
            self.on_exit(prev);
            self.state = next;
            self.on_enter(prev, next);
        }

        if self.state == MotionState::Moving {
            self.movement_step();
        }

        self.outputs.set_indicators(self.indicators());
        self.state
    }

    fn poll_sensor(&mut self, now_ms: u32) {
        let Some(sample) = self.sensor.poll(now_ms) else {
            return;
        };

        self.faults.on_unlatch_event(UnlatchEvent::SensorDataReceived);
        self.last_sample_ms = now_ms;
        self.attitude = sample;

        if self.sensor.rate() >= self.stability_rate {
            self.last_unstable_ms = now_ms;
        }
    }

    fn is_settled(&self, now_ms: u32) -> bool {
        elapsed_ms(now_ms, self.last_unstable_ms) >= self.settle_ms
    }

    /// Record the direction of an accepted movement request.
    fn apply_direction(&mut self, req: Request, next: MotionState) {
        match (req.direction(), next) {
            (Some(dir), MotionState::MovementRequested | MotionState::Moving) => {
                self.direction = dir;
            }
            (None, MotionState::NotRunning) => self.direction = Direction::None,
            _ => {}
        }
    }

    fn on_enter(&mut self, prev: MotionState, state: MotionState) {
        // Leaving Moving has already halted everything.
        let halted = prev == MotionState::Moving;
        match state {
            MotionState::NotRunning => {
                if !halted {
                    self.stop_movement();
                }
            }
            MotionState::Faulted => {
                log_warn!("fault state entered");
                if !halted {
                    self.stop_movement();
                }
            }
            MotionState::MovementRequested => {
                log_info!("waiting for stabilization");
                self.last_unstable_ms = self.now_ms;
            }
            MotionState::Moving => self.start_movement(),
        }
    }

    fn on_exit(&mut self, state: MotionState) {
        if state == MotionState::Moving {
            self.stop_movement();
        }
    }

    fn start_movement(&mut self) {
        log_info!("movement started: {:?}", self.direction);
        self.outputs.set_motor(self.direction);
        self.motor_enabled = self.direction != Direction::None;
    }

    fn stop_movement(&mut self) {
        log_info!("movement halted");
        self.outputs.all_off();
        self.applied = [false; CORNERS];
        self.motor_enabled = false;
        self.faults.on_unlatch_event(UnlatchEvent::MovementCommandEnd);
    }

    /// Drive every corner that is not flagged as high (or low, when lowering).
    fn movement_step(&mut self) {
        self.corners.update(self.attitude.roll, self.attitude.pitch);
        let lowering = self.direction == Direction::Lower;
        let raising = self.direction == Direction::Raise;

        for i in 0..CORNERS {
            let enabled = !self.corners.get_corner(i, lowering);
            self.outputs.set_corner(i, enabled, raising);
            self.applied[i] = enabled;
        }
    }

    /// Capture the current reading as level. Only allowed while stopped.
    pub fn zero(&mut self, map: &mut CalibrationMap) -> Result<(), ZeroError> {
        if self.state != MotionState::NotRunning {
            return Err(ZeroError::NotStopped);
        }
        if self.sensor.zero(map) {
            log_info!("calibration captured");
            Ok(())
        } else {
            Err(ZeroError::NoReading)
        }
    }

    pub fn indicators(&self) -> Indicators {
        let latched = self.faults.has_fault();
        let faulted = self.state == MotionState::Faulted;
        Indicators {
            ready: !latched && !faulted,
            fault_active: latched || faulted,
            fault_clearable: faulted && !latched,
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let attitude = self.sensor.filtered();
        DisplaySnapshot {
            state: self.state,
            pitch_deg: attitude.pitch.to_degrees(),
            roll_deg: attitude.roll.to_degrees(),
            corners: self.applied,
            motor_enabled: self.motor_enabled,
            direction: self.direction,
            fault: self.faults.next_fault(0),
        }
    }

    /// Push a snapshot to `renderer` if the display period has elapsed. Returns `true` if it did.
    pub fn update_display<R: DisplayRenderer>(&mut self, renderer: &mut R, now_ms: u32) -> bool {
        let due = match self.last_display_ms {
            None => true,
            Some(last) => elapsed_ms(now_ms, last) >= self.display_period_ms,
        };
        if due {
            renderer.update(&self.snapshot());
            self.last_display_ms = Some(now_ms);
        }
        due
    }

    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last accepted (filtered) attitude.
    #[inline]
    pub fn attitude(&self) -> AttitudeSample {
        self.attitude
    }

    /// The sensor stack, for provisioning and diagnostics.
    pub fn sensor(&mut self) -> &mut S {
        &mut *self.sensor
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut O {
        &mut self.outputs
    }
}
