// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Leveler Firmware
//!
//! This crate contains the control and estimation stack for a self-leveling hydraulic platform,
//! written in Rust, targeting an STM32F767 MCU. Four rams, one per corner, are switched on and off
//! from a fixed-rate polling loop until the measured pitch and roll fall inside a deadband.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`protocol`] | Serial CAN frame codec and the J1939 identifier/message layer |
//! | [`fault`] | Latched fault table, unlatch events and the diagnostic flash code |
//! | [`sensor`] | Sensor sources, rotation model, smoothing and plausibility checks |
//! | [`control`] | Corner selection algorithm and the motion state machine |
//! | [`drivers`] | Device-level drivers (serial CAN adapter, MTLT inclinometer, ADXL355, FRAM) |
//! | [`actuators`] | Ram/motor output abstraction and the GPIO output bank |
//! | [`storage`] | Persistent calibration map |
//! | [`display`] | Display snapshot and indicator outputs |
//! | [`config`] | Tunable constants |
//! | `hw` | MCU-level wrappers (USART, bxCAN, clock), only with the `firmware` feature |
//!
//! ## Getting Started
//!
//! Run the host test suite:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features firmware --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod logging;

pub mod actuators;
pub mod config;
pub mod control;
pub mod display;
pub mod drivers;
pub mod fault;
pub mod protocol;
pub mod sensor;
pub mod storage;
pub mod time;

#[cfg(feature = "firmware")]
pub mod hw;

#[cfg(test)]
pub(crate) mod mock;
