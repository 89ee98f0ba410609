// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Test doubles for the hardware seams.

use std::collections::VecDeque;
use std::vec::Vec;

use bxcan::Frame;
use embedded_hal::blocking::{i2c, spi};
use embedded_hal::digital::v2::OutputPin;

use crate::actuators::{ActuatorOutputs, Indicators, CORNERS};
use crate::control::Direction;
use crate::display::{DisplayRenderer, DisplaySnapshot};
use crate::protocol::{ByteStream, Error, FrameTransport};
use crate::sensor::{AttitudeSample, AttitudeSource, RawMeasurement, SensorError, SensorSource};
use crate::storage::{decode_map, encode_map, CalibrationMap, PersistentStore, StorageError, MAP_LEN};

/// Error returned by failing mock buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// Output pin that remembers its level.
#[derive(Debug, Default)]
pub struct MockPin {
    high: bool,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl OutputPin for MockPin {
    type Error = core::convert::Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// Output pin whose every write fails.
#[derive(Debug, Default)]
pub struct FailingPin;

impl OutputPin for FailingPin {
    type Error = BusFault;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(BusFault)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(BusFault)
    }
}

/// Frame transport with a scripted receive queue and a record of sent frames.
#[derive(Default)]
pub struct MockFrameTransport {
    rx: VecDeque<Frame>,
    sent: VecDeque<Frame>,
    pub flushes: usize,
    pub fail_writes: bool,
}

impl MockFrameTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rx(&mut self, frame: Frame) {
        self.rx.push_back(frame);
    }

    /// Oldest frame written and not yet taken.
    pub fn take_sent(&mut self) -> Option<Frame> {
        self.sent.pop_front()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }
}

impl FrameTransport for MockFrameTransport {
    fn has_frame(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read_frame(&mut self) -> Option<Frame> {
        self.rx.pop_front()
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        if self.fail_writes {
            return Err(Error::Transport);
        }
        self.sent.push_back(frame.clone());
        Ok(())
    }

    fn flush(&mut self) {
        self.rx.clear();
        self.flushes += 1;
    }
}

/// Byte stream over in-memory buffers.
#[derive(Default)]
pub struct MockByteStream {
    rx: VecDeque<u8>,
    pub tx: Vec<u8>,
}

impl MockByteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl ByteStream for MockByteStream {
    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }

    fn clear_rx(&mut self) {
        self.rx.clear();
    }
}

/// Raw sensor fed from a queue.
#[derive(Default)]
pub struct MockSensor {
    queue: VecDeque<RawMeasurement>,
    fail_begin: bool,
}

impl MockSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    pub fn push(&mut self, m: RawMeasurement) {
        self.queue.push_back(m);
    }
}

impl SensorSource for MockSensor {
    fn begin(&mut self) -> Result<(), SensorError> {
        if self.fail_begin {
            Err(SensorError::Bus)
        } else {
            Ok(())
        }
    }

    fn has_data(&mut self) -> bool {
        !self.queue.is_empty()
    }

    fn read(&mut self) -> Option<RawMeasurement> {
        self.queue.pop_front()
    }
}

/// Attitude source that repeats one sample every poll.
pub struct MockAttitude {
    pub sample: Option<AttitudeSample>,
    pub rate: f64,
    pub zeroed: bool,
}

impl MockAttitude {
    pub fn still(sample: AttitudeSample) -> Self {
        Self {
            sample: Some(sample),
            rate: 0.0,
            zeroed: false,
        }
    }

    pub fn silent() -> Self {
        Self {
            sample: None,
            rate: 0.0,
            zeroed: false,
        }
    }
}

impl AttitudeSource for MockAttitude {
    fn begin(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn poll(&mut self, _now_ms: u32) -> Option<AttitudeSample> {
        self.sample
    }

    fn filtered(&self) -> AttitudeSample {
        self.sample.unwrap_or(AttitudeSample::LEVEL)
    }

    fn instantaneous(&self) -> AttitudeSample {
        self.filtered()
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn zero(&mut self, _map: &mut CalibrationMap) -> bool {
        self.zeroed = self.sample.is_some();
        self.zeroed
    }

    fn import_zero(&mut self, _map: &CalibrationMap) {}
}

/// Actuator outputs recorded per logical corner.
#[derive(Debug, Default)]
pub struct MockOutputs {
    pub raise: [bool; CORNERS],
    pub lower: [bool; CORNERS],
    pub motor: Direction,
    pub indicators: Indicators,
    pub all_off_calls: usize,
}

impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActuatorOutputs for MockOutputs {
    fn set_corner(&mut self, index: usize, enabled: bool, raising: bool) {
        if raising {
            self.lower[index] = false;
            self.raise[index] = enabled;
        } else {
            self.raise[index] = false;
            self.lower[index] = enabled;
        }
    }

    fn set_motor(&mut self, direction: Direction) {
        self.motor = direction;
    }

    fn set_indicators(&mut self, indicators: Indicators) {
        self.indicators = indicators;
    }

    fn all_off(&mut self) {
        self.raise = [false; CORNERS];
        self.lower = [false; CORNERS];
        self.motor = Direction::None;
        self.all_off_calls += 1;
    }
}

/// Store backed by a byte image that starts erased.
pub struct MockStore {
    image: [u8; MAP_LEN],
    fail_begin: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            image: [0xFF; MAP_LEN],
            fail_begin: false,
        }
    }

    pub fn failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }
}

impl PersistentStore for MockStore {
    fn begin(&mut self) -> Result<(), StorageError> {
        if self.fail_begin {
            Err(StorageError::Bus)
        } else {
            Ok(())
        }
    }

    fn read_map(&mut self) -> Result<CalibrationMap, StorageError> {
        decode_map(&self.image)
    }

    fn write_map(&mut self, map: &CalibrationMap) -> Result<(), StorageError> {
        self.image = encode_map(map);
        Ok(())
    }
}

/// Renderer that keeps the last snapshot.
#[derive(Default)]
pub struct MockDisplay {
    pub updates: usize,
    pub last: Option<DisplaySnapshot>,
}

impl DisplayRenderer for MockDisplay {
    fn update(&mut self, snapshot: &DisplaySnapshot) {
        self.updates += 1;
        self.last = Some(*snapshot);
    }
}

/// SPI device modelled as a register file addressed by `(addr << 1) | rw`.
pub struct MockSpiRegs {
    pub regs: [u8; 0x40],
    pub writes: Vec<(u8, u8)>,
}

impl MockSpiRegs {
    pub fn new() -> Self {
        Self {
            regs: [0; 0x40],
            writes: Vec::new(),
        }
    }
}

impl spi::Transfer<u8> for MockSpiRegs {
    type Error = BusFault;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], BusFault> {
        if let Some((&mut cmd, rest)) = words.split_first_mut() {
            let addr = (cmd >> 1) as usize;
            if cmd & 1 == 1 {
                for (i, w) in rest.iter_mut().enumerate() {
                    *w = self.regs.get(addr + i).copied().unwrap_or(0);
                }
            }
        }
        Ok(words)
    }
}

impl spi::Write<u8> for MockSpiRegs {
    type Error = BusFault;

    fn write(&mut self, words: &[u8]) -> Result<(), BusFault> {
        if let [cmd, data @ ..] = words {
            let addr = cmd >> 1;
            for (i, &d) in data.iter().enumerate() {
                let reg = addr + i as u8;
                self.writes.push((reg, d));
                if let Some(r) = self.regs.get_mut(reg as usize) {
                    *r = d;
                }
            }
        }
        Ok(())
    }
}

/// I2C memory with 16-bit word addresses.
pub struct MockI2cMemory {
    pub address: u8,
    pub mem: Vec<u8>,
    pub present: bool,
}

impl MockI2cMemory {
    pub fn new(address: u8, size: usize) -> Self {
        Self {
            address,
            mem: std::vec![0xFF; size],
            present: true,
        }
    }

    fn check(&self, address: u8) -> Result<(), BusFault> {
        if self.present && address == self.address {
            Ok(())
        } else {
            Err(BusFault)
        }
    }
}

impl i2c::Write for MockI2cMemory {
    type Error = BusFault;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusFault> {
        self.check(address)?;
        if let [hi, lo, data @ ..] = bytes {
            let start = u16::from_be_bytes([*hi, *lo]) as usize;
            for (i, &d) in data.iter().enumerate() {
                if let Some(m) = self.mem.get_mut(start + i) {
                    *m = d;
                }
            }
        }
        Ok(())
    }
}

impl i2c::WriteRead for MockI2cMemory {
    type Error = BusFault;

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), BusFault> {
        self.check(address)?;
        let start = match bytes {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]) as usize,
            _ => return Err(BusFault),
        };
        for (i, b) in buffer.iter_mut().enumerate() {
            *b = self.mem.get(start + i).copied().unwrap_or(0xFF);
        }
        Ok(())
    }
}

/// Delay that only adds up what was asked of it.
#[derive(Default)]
pub struct MockDelay {
    pub total_ms: u32,
}

impl embedded_hal::blocking::delay::DelayMs<u32> for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
    }
}
