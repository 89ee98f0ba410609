// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Operator display.
//!
//! The controller publishes a [`DisplaySnapshot`] at a fixed, slow rate. Renderers consume it and
//! never feed anything back into control. [`render_text`] lays a snapshot out for a 20x4
//! character display:
//!
//! ```text
//! +--------------------+   +--------------------+
//! |MOVING     P:  -0.12|   |!! Fault Detected !!|
//! |RAISING    R:   0.03|   |SENSOR NOT READY    |
//! |-1-- -2-- -3-- -4-- |   |Sensor timed out    |
//! |OK   OK   HALT OK   |   | (please try again) |
//! +--------------------+   +--------------------+
//! ```

use core::fmt::{self, Write};

use heapless::String;

use crate::actuators::{RamMap, CORNERS};
use crate::control::{Direction, MotionState};
use crate::fault::FaultCode;

/// Display columns.
pub const LINE_WIDTH: usize = 20;

/// One display line.
pub type Line = String<LINE_WIDTH>;

/// Everything a renderer may show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySnapshot {
    pub state: MotionState,
    /// Filtered pitch in degrees.
    pub pitch_deg: f64,
    /// Filtered roll in degrees.
    pub roll_deg: f64,
    /// Drive enable per logical corner.
    pub corners: [bool; CORNERS],
    /// Pump motor running.
    pub motor_enabled: bool,
    pub direction: Direction,
    /// Lowest latched fault, if any.
    pub fault: Option<FaultCode>,
}

/// Consumer of display snapshots.
pub trait DisplayRenderer {
    fn update(&mut self, snapshot: &DisplaySnapshot);
}

/// Writer that silently drops whatever does not fit in the line.
struct Truncate<'a>(&'a mut Line);

impl Write for Truncate<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn line(args: fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    let _ = Truncate(&mut out).write_fmt(args);
    out
}

/// Lay out a snapshot as four 20-column lines.
///
/// `map` places the logical corners under their site ram numbers.
pub fn render_text(snapshot: &DisplaySnapshot, map: &RamMap) -> [Line; 4] {
    if let Some(code) = snapshot.fault {
        let retry = if code.is_fatal() {
            " (re-boot required) "
        } else {
            " (please try again) "
        };
        return [
            line(format_args!("!! Fault Detected !!")),
            line(format_args!("{}", code.name())),
            line(format_args!("{}", code.help())),
            line(format_args!("{}", retry)),
        ];
    }

    let status = match (snapshot.state, snapshot.direction) {
        (MotionState::Moving, Direction::Raise) => "RAISING",
        (MotionState::Moving, Direction::Lower) => "LOWERING",
        (MotionState::Moving, Direction::None) => "OFF",
        (MotionState::Faulted, _) => "CAN RESUME",
        _ => "SYSTEM OK",
    };

    let mut rams = ["OFF"; CORNERS];
    for (corner, &enabled) in snapshot.corners.iter().enumerate() {
        rams[map.physical(corner)] = match (snapshot.motor_enabled, enabled) {
            (false, _) => "OFF",
            (true, true) => "OK",
            (true, false) => "HALT",
        };
    }

    [
        line(format_args!(
            "{:<10} P:{:>7.2}",
            snapshot.state.label(),
            snapshot.pitch_deg
        )),
        line(format_args!("{:<10} R:{:>7.2}", status, snapshot.roll_deg)),
        line(format_args!("-1-- -2-- -3-- -4-- ")),
        line(format_args!(
            "{:<4} {:<4} {:<4} {:<4} ",
            rams[0], rams[1], rams[2], rams[3]
        )),
    ]
}

/// Renderer that writes the four text lines to a serial terminal.
pub struct TextConsole<W: Write> {
    out: W,
    map: RamMap,
}

impl<W: Write> TextConsole<W> {
    pub fn new(out: W, map: RamMap) -> Self {
        Self { out, map }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn free(self) -> W {
        self.out
    }
}

impl<W: Write> DisplayRenderer for TextConsole<W> {
    fn update(&mut self, snapshot: &DisplaySnapshot) {
        let _ = self.out.write_str("+--------------------+\r\n");
        for l in render_text(snapshot, &self.map).iter() {
            let _ = write!(self.out, "|{:<20}|\r\n", l.as_str());
        }
        let _ = self.out.write_str("+--------------------+\r\n");
    }
}
