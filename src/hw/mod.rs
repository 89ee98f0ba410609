// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCU-level wrappers. Only built with the `firmware` feature.

pub mod button;
pub mod can;
pub mod clock;
pub mod link;
pub mod pins;
pub mod spi;
pub mod usart;

pub use button::{Button, Edge};
pub use can::CanBus;
pub use clock::DwtClock;
pub use link::SensorLink;
pub use pins::BoardPins;
pub use spi::SpiBus;
pub use usart::{BufferedUsart, Usart};
