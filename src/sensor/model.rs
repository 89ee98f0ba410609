// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Rotation model turning raw readings into calibrated pitch and roll.
//!
//! A reading becomes a measured frame `M = Rx(roll) · Ry(pitch)`. The calibrated output is the
//! XYZ Euler decomposition of
//!
//! ```text
//! Base · Zeroᵀ · M
//! ```
//!
//! where `Zero` is the frame captured by [`Model::set_zero`] and `Base` is the installation offset.
//! All matrices are products of elementary rotations, so the transpose is the inverse.

use libm::{atan, atan2, cos, sin, sqrt};

use super::{AttitudeSample, RawMeasurement};

/// Row-major 3x3 matrix.
pub type Mat3 = [[f64; 3]; 3];

pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

pub fn rot_x(a: f64) -> Mat3 {
    let (s, c) = (sin(a), cos(a));
    [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
}

pub fn rot_y(a: f64) -> Mat3 {
    let (s, c) = (sin(a), cos(a));
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

pub fn rot_z(a: f64) -> Mat3 {
    let (s, c) = (sin(a), cos(a));
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

pub fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

pub fn transpose(m: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            out[j][i] = *v;
        }
    }
    out
}

/// Euler angles `(a, b, c)` such that `m = Rx(a) · Ry(b) · Rz(c)`.
pub fn euler_xyz(m: &Mat3) -> [f64; 3] {
    let a = atan2(-m[1][2], m[2][2]);
    let b = atan2(m[0][2], sqrt(m[0][0] * m[0][0] + m[0][1] * m[0][1]));
    let c = atan2(-m[0][1], m[0][0]);
    [a, b, c]
}

/// Zero pose persisted as nine row-major scalars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationFrame {
    pub m: [f64; 9],
}

impl Default for CalibrationFrame {
    fn default() -> Self {
        Self::identity()
    }
}

impl CalibrationFrame {
    pub fn identity() -> Self {
        Self::from_matrix(&IDENTITY)
    }

    pub fn from_matrix(m: &Mat3) -> Self {
        let mut out = [0.0; 9];
        for (i, row) in m.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(row);
        }
        Self { m: out }
    }

    pub fn to_matrix(&self) -> Mat3 {
        [
            [self.m[0], self.m[1], self.m[2]],
            [self.m[3], self.m[4], self.m[5]],
            [self.m[6], self.m[7], self.m[8]],
        ]
    }

    /// `true` when `Mᵀ · M` is the identity within `tol` for every entry.
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let m = self.to_matrix();
        let p = mul(&transpose(&m), &m);
        p.iter().enumerate().all(|(i, row)| {
            row.iter().enumerate().all(|(j, v)| {
                let expected = if i == j { 1.0 } else { 0.0 };
                let d = *v - expected;
                d <= tol && -d <= tol && !v.is_nan()
            })
        })
    }
}

/// Pitch and roll implied by a reading, before calibration.
pub fn measured_angles(raw: &RawMeasurement) -> AttitudeSample {
    match *raw {
        RawMeasurement::Acceleration(a) => {
            let (x, y, z) = (a.x as f64, a.y as f64, a.z as f64);
            let norm = sqrt(x * x + y * y + z * z);
            if norm == 0.0 {
                return AttitudeSample::LEVEL;
            }
            let (x, y, z) = (x / norm, y / norm, z / norm);
            // Gravity along X alone leaves pitch undefined; call it zero.
            let pitch = if y == 0.0 && z == 0.0 { 0.0 } else { atan(y / z) };
            AttitudeSample {
                pitch,
                roll: atan(-x / sqrt(y * y + z * z)),
            }
        }
        RawMeasurement::Angles { pitch, roll } => AttitudeSample { pitch, roll },
    }
}

/// Measured frame `Rx(roll) · Ry(pitch)`.
pub fn measured_frame(raw: &RawMeasurement) -> Mat3 {
    let angles = measured_angles(raw);
    mul(&rot_x(angles.roll), &rot_y(angles.pitch))
}

/// Calibration state of one inclinometer.
#[derive(Debug, Clone, Copy)]
pub struct Model {
    base: Mat3,
    zero: Mat3,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            base: IDENTITY,
            zero: IDENTITY,
        }
    }

    /// Calibrated attitude of `raw`.
    pub fn calculate(&self, raw: &RawMeasurement) -> AttitudeSample {
        let measured = measured_frame(raw);
        let frame = mul(&mul(&self.base, &transpose(&self.zero)), &measured);
        let angles = euler_xyz(&frame);
        AttitudeSample {
            roll: angles[0],
            pitch: angles[1],
        }
    }

    /// Make `raw` the new level reference and return it for persistence.
    pub fn set_zero(&mut self, raw: &RawMeasurement) -> CalibrationFrame {
        self.zero = measured_frame(raw);
        CalibrationFrame::from_matrix(&self.zero)
    }

    pub fn import_zero(&mut self, frame: &CalibrationFrame) {
        self.zero = frame.to_matrix();
    }

    pub fn zero_frame(&self) -> CalibrationFrame {
        CalibrationFrame::from_matrix(&self.zero)
    }

    /// Installation offset `Rx(roll) · Ry(pitch) · Rz(yaw)`.
    pub fn set_base_frame(&mut self, roll: f64, pitch: f64, yaw: f64) {
        self.base = mul(&mul(&rot_x(roll), &rot_y(pitch)), &rot_z(yaw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::AccelSample;

    const EPS: f64 = 1e-9;

    fn accel(x: i32, y: i32, z: i32) -> RawMeasurement {
        RawMeasurement::Acceleration(AccelSample {
            x,
            y,
            z,
            counts_per_g: 256_000,
        })
    }

    #[test]
    fn euler_decomposition_inverts_composition() {
        let m = mul(&mul(&rot_x(0.1), &rot_y(-0.2)), &rot_z(0.3));
        let [a, b, c] = euler_xyz(&m);
        assert!((a - 0.1).abs() < EPS);
        assert!((b + 0.2).abs() < EPS);
        assert!((c - 0.3).abs() < EPS);
    }

    #[test]
    fn gravity_along_x_zeroes_without_nan() {
        let raw = accel(256_000, 0, 0);
        let measured = measured_angles(&raw);
        assert_eq!(measured.pitch, 0.0);
        assert!((measured.roll + core::f64::consts::FRAC_PI_2).abs() < EPS);

        let mut model = Model::new();
        model.set_zero(&raw);
        let out = model.calculate(&raw);
        assert!(out.pitch.abs() < EPS, "pitch {}", out.pitch);
        assert!(out.roll.abs() < EPS, "roll {}", out.roll);

        let mut model = Model::new();
        model.set_zero(&accel(-256_000, 0, 0));
        let out = model.calculate(&accel(-256_000, 0, 0));
        assert!(out.pitch.abs() < EPS && out.roll.abs() < EPS);
    }

    #[test]
    fn flat_accelerometer_reads_level() {
        let model = Model::new();
        let out = model.calculate(&accel(0, 0, 256_000));
        assert!(out.pitch.abs() < EPS);
        assert!(out.roll.abs() < EPS);
    }

    #[test]
    fn angle_reading_passes_through_uncalibrated_model() {
        let model = Model::new();
        let out = model.calculate(&RawMeasurement::Angles {
            pitch: 0.02,
            roll: -0.01,
        });
        assert!((out.pitch - 0.02).abs() < EPS);
        assert!((out.roll + 0.01).abs() < EPS);
    }

    #[test]
    fn zeroing_a_reading_makes_it_level() {
        let raws = [
            accel(12_000, -30_000, 250_000),
            accel(-500, 800, 255_000),
            RawMeasurement::Angles {
                pitch: 0.05,
                roll: 0.03,
            },
        ];
        for raw in raws {
            let mut model = Model::new();
            model.set_base_frame(0.0, 0.0, 0.7);
            model.set_zero(&raw);
            let out = model.calculate(&raw);
            assert!(out.pitch.abs() < EPS, "pitch {}", out.pitch);
            assert!(out.roll.abs() < EPS, "roll {}", out.roll);
        }
    }

    #[test]
    fn imported_zero_matches_captured_zero() {
        let raw = accel(3_000, 9_000, 250_000);
        let mut a = Model::new();
        let frame = a.set_zero(&raw);
        assert!(frame.is_orthonormal(1e-12));

        let mut b = Model::new();
        b.import_zero(&frame);
        let probe = accel(-2_000, 4_000, 255_000);
        let (pa, pb) = (a.calculate(&probe), b.calculate(&probe));
        assert!((pa.pitch - pb.pitch).abs() < EPS);
        assert!((pa.roll - pb.roll).abs() < EPS);
    }

    #[test]
    fn garbage_frame_is_not_orthonormal() {
        let frame = CalibrationFrame { m: [1.0; 9] };
        assert!(!frame.is_orthonormal(1e-6));
        assert!(CalibrationFrame::identity().is_orthonormal(0.0));
    }
}
