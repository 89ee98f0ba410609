// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Highest-corner selection with hysteresis.
//!
//! Corners are the quadrants of the roll (x) / pitch (y) plane, numbered counter-clockwise from
//! the first quadrant. Outside the outer bound the corners on the high side are flagged; inside the
//! inner deadband on both axes every flag is cleared. Between the two bounds the previous flags are
//! kept.
//!
//! Boundary convention: the outer bound is exclusive (`|angle| == upper` counts as within bounds)
//! and the deadband is exclusive (`|angle| == lower` is outside it). Exactly zero is inside the
//! deadband.

use libm::fabs;

/// Flags for the four corners.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CornerFlags(pub [bool; 4]);

impl CornerFlags {
    pub const NONE: CornerFlags = CornerFlags([false; 4]);

    pub fn any(&self) -> bool {
        self.0.iter().any(|&c| c)
    }
}

/// Corner algorithm state.
#[derive(Copy, Clone, Debug)]
pub struct CornerAlgorithm {
    /// Inner deadband (radians); both axes inside it stops correction.
    lower_bound: f64,
    /// Outer bound (radians); beyond it a corner must be corrected.
    upper_bound: f64,
    corners: CornerFlags,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Side {
    Low,
    Within,
    High,
}

impl CornerAlgorithm {
    /// `lower_bound` must be below `upper_bound`; both in radians.
    pub fn new(lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            corners: CornerFlags::NONE,
        }
    }

    fn side(&self, angle: f64) -> Side {
        if angle > self.upper_bound {
            Side::High
        } else if angle < -self.upper_bound {
            Side::Low
        } else {
            Side::Within
        }
    }

    /// Re-evaluate the flags for a new attitude.
    pub fn update(&mut self, roll: f64, pitch: f64) {
        const F: bool = false;
        const T: bool = true;
        let set = match (self.side(roll), self.side(pitch)) {
            (Side::High, Side::High) => Some([F, F, T, F]),
            (Side::High, Side::Low) => Some([F, T, F, F]),
            (Side::High, Side::Within) => Some([F, T, T, F]),
            (Side::Low, Side::High) => Some([F, F, F, T]),
            (Side::Low, Side::Low) => Some([T, F, F, F]),
            (Side::Low, Side::Within) => Some([T, F, F, T]),
            (Side::Within, Side::High) => Some([F, F, T, T]),
            (Side::Within, Side::Low) => Some([T, T, F, F]),
            (Side::Within, Side::Within) => None,
        };

        // Every branch that sets flags replaces all four.
        if let Some(flags) = set {
            self.corners = CornerFlags(flags);
        }

        if fabs(roll) < self.lower_bound && fabs(pitch) < self.lower_bound {
            self.corners = CornerFlags::NONE;
        }
    }

    /// Flag for corner `index`, or for the opposite corner when `invert` is set (lowering).
    pub fn get_corner(&self, index: usize, invert: bool) -> bool {
        let i = (index + if invert { 2 } else { 0 }) % 4;
        self.corners.0[i]
    }

    pub fn corners(&self) -> CornerFlags {
        self.corners
    }

    pub fn reset(&mut self) {
        self.corners = CornerFlags::NONE;
    }
}
