// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Leveling Control
//!
//! ## Modules
//!
//! - [`corner`] - Picks which corners to hold back from the current tilt, with hysteresis.
//! - [`motion`] - Motion states and the pure transition table.
//! - [`controller`] - Ties sensor, faults and outputs together on a fixed cadence.

pub mod controller;
pub mod corner;
pub mod motion;

pub use controller::{MotionController, ZeroError};
pub use corner::{CornerAlgorithm, CornerFlags};
pub use motion::{transition, Direction, MotionState, Request, TransitionInput};
