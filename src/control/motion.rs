// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motion states and the transition table.
//!
//! [`transition`] is a pure function. Side effects of entering and leaving states live in
//! [`MotionController`](super::MotionController).

/// Controller state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum MotionState {
    /// Rest state; outputs off.
    NotRunning,
    /// Raise/lower requested, waiting for the platform to settle.
    MovementRequested,
    /// Rams are being driven.
    Moving,
    /// A fault is or was latched; only a clear request leaves this state.
    Faulted,
}

impl MotionState {
    /// Operator-facing label.
    pub fn label(self) -> &'static str {
        match self {
            MotionState::NotRunning => "STOPPED",
            MotionState::MovementRequested => "STEADYING",
            MotionState::Moving => "MOVING",
            MotionState::Faulted => "FAULTED",
        }
    }
}

/// Direction of travel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum Direction {
    Raise,
    Lower,
    #[default]
    None,
}

/// External command consumed on the next step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
pub enum Request {
    Raise,
    Lower,
    Off,
    ClearFault,
}

impl Request {
    /// Direction implied by a movement request.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Request::Raise => Some(Direction::Raise),
            Request::Lower => Some(Direction::Lower),
            Request::Off | Request::ClearFault => None,
        }
    }
}

/// Everything the transition table looks at.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionInput {
    /// Pending request, if any.
    pub request: Option<Request>,
    /// Any fault latched.
    pub fault_latched: bool,
    /// The platform has been still for the settle duration.
    pub settled: bool,
}

/// Next state for `state` given `input`.
///
/// Rules, first match wins:
///
/// 1. `Faulted` leaves only on Off/ClearFault with no fault latched; everything else is ignored.
/// 2. A latched fault sends any other state to `Faulted`.
/// 3. Off goes to `NotRunning`; Raise/Lower go to `MovementRequested` (from `Moving` too, so the
///    platform settles again before a new direction is applied). ClearFault is a no-op.
/// 4. `MovementRequested` becomes `Moving` once settled.
pub fn transition(state: MotionState, input: TransitionInput) -> MotionState {
    if state == MotionState::Faulted {
        return match input.request {
            Some(Request::Off) | Some(Request::ClearFault) if !input.fault_latched => {
                MotionState::NotRunning
            }
            _ => MotionState::Faulted,
        };
    }

    if input.fault_latched {
        return MotionState::Faulted;
    }

    match input.request {
        Some(Request::Off) => return MotionState::NotRunning,
        Some(Request::Raise) | Some(Request::Lower) => {
            if state != MotionState::MovementRequested {
                return MotionState::MovementRequested;
            }
        }
        Some(Request::ClearFault) | None => {}
    }

    match state {
        MotionState::MovementRequested if input.settled => MotionState::Moving,
        other => other,
    }
}
