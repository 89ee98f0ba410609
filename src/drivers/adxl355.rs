// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ADXL355 3-axis accelerometer over SPI.
//!
//! Each SPI transaction starts with a command byte `(register << 1) | rw`, where `rw` is 1 for a
//! read. Acceleration is a 9-byte burst from `XDATA3`: three big-endian 20-bit values, each
//! left-aligned in 24 bits.

use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::digital::v2::OutputPin;

use crate::sensor::{AccelSample, RawMeasurement, SensorError, SensorSource};

// Register addresses
pub mod reg {
    pub const DEVID_AD: u8 = 0x00;
    pub const STATUS: u8 = 0x04;
    pub const XDATA3: u8 = 0x08;
    pub const FILTER: u8 = 0x28;
    pub const RANGE: u8 = 0x2C;
    pub const POWER_CTL: u8 = 0x2D;
    pub const RESET: u8 = 0x2F;
}

/// Analog Devices id in `DEVID_AD`.
pub const DEVICE_ID: u8 = 0xAD;

/// `POWER_CTL` value: measurement mode, temperature off, DRDY off.
pub const MEASURE_MODE: u8 = 0x06;

/// Code written to `RESET` for a soft reset.
const RESET_CODE: u8 = 0x52;

/// `STATUS` bits.
pub mod status {
    pub const DATA_READY: u8 = 1 << 0;
    pub const FIFO_FULL: u8 = 1 << 1;
    pub const FIFO_OVERRUN: u8 = 1 << 2;
}

/// Low-pass filter settings for the `FILTER` register.
pub mod filter {
    pub const OFF: u8 = 0x00;
    pub const LPF_16HZ: u8 = 0b1000;
    pub const LPF_8HZ: u8 = 0b1001;
    pub const LPF_4HZ: u8 = 0b1010;
}

const SAMPLE_LEN: usize = 9;

/// Full-scale range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "firmware", derive(defmt::Format))]
#[repr(u8)]
pub enum Range {
    G2 = 0x01,
    G4 = 0x02,
    G8 = 0x03,
}

impl Range {
    /// Sensitivity of the 20-bit output.
    pub fn counts_per_g(self) -> u32 {
        match self {
            Range::G2 => 256_000,
            Range::G4 => 128_000,
            Range::G8 => 64_000,
        }
    }
}

/// Split a burst into sign-extended 20-bit axis values.
pub fn decode_axes(buf: &[u8; SAMPLE_LEN]) -> [i32; 3] {
    let mut out = [0i32; 3];
    for (axis, b) in out.iter_mut().zip(buf.chunks_exact(3)) {
        let raw = u32::from(b[0]) << 16 | u32::from(b[1]) << 8 | u32::from(b[2]);
        // Move bit 23 to bit 31, then arithmetic-shift back down to 20 bits.
        *axis = ((raw << 8) as i32) >> 12;
    }
    out
}

/// ADXL355 bound to its bus and chip-select pin.
pub struct Adxl355<SPI, CS> {
    spi: SPI,
    cs: CS,
    range: Range,
    filter: u8,
}

impl<SPI, CS, E> Adxl355<SPI, CS>
where
    SPI: Transfer<u8, Error = E> + Write<u8, Error = E>,
    CS: OutputPin,
{
    /// ±2 g with the 4 Hz low-pass filter.
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            range: Range::G2,
            filter: filter::LPF_4HZ,
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    pub fn with_filter(mut self, filter: u8) -> Self {
        self.filter = filter;
        self
    }

    /// Release the bus and chip-select pin.
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn select(&mut self) -> Result<(), SensorError> {
        self.cs.set_low().map_err(|_| SensorError::Bus)
    }

    fn deselect(&mut self) -> Result<(), SensorError> {
        self.cs.set_high().map_err(|_| SensorError::Bus)
    }

    pub fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), SensorError> {
        self.select()?;
        let res = self.spi.write(&[addr << 1, value]);
        self.deselect()?;
        res.map_err(|_| SensorError::Bus)
    }

    /// Read `out.len()` consecutive registers starting at `addr` (at most 9).
    pub fn read_regs(&mut self, addr: u8, out: &mut [u8]) -> Result<(), SensorError> {
        let n = out.len().min(SAMPLE_LEN);
        let mut buf = [0u8; SAMPLE_LEN + 1];
        buf[0] = (addr << 1) | 1;

        self.select()?;
        let res = self.spi.transfer(&mut buf[..=n]).map(|_| ());
        self.deselect()?;
        res.map_err(|_| SensorError::Bus)?;

        out[..n].copy_from_slice(&buf[1..=n]);
        Ok(())
    }

    pub fn read_reg(&mut self, addr: u8) -> Result<u8, SensorError> {
        let mut b = [0u8; 1];
        self.read_regs(addr, &mut b)?;
        Ok(b[0])
    }

    pub fn status(&mut self) -> Result<u8, SensorError> {
        self.read_reg(reg::STATUS)
    }

    /// One burst read of all three axes.
    pub fn sample(&mut self) -> Result<AccelSample, SensorError> {
        let mut buf = [0u8; SAMPLE_LEN];
        self.read_regs(reg::XDATA3, &mut buf)?;
        let [x, y, z] = decode_axes(&buf);
        Ok(AccelSample {
            x,
            y,
            z,
            counts_per_g: self.range.counts_per_g(),
        })
    }
}

impl<SPI, CS, E> SensorSource for Adxl355<SPI, CS>
where
    SPI: Transfer<u8, Error = E> + Write<u8, Error = E>,
    CS: OutputPin,
{
    fn begin(&mut self) -> Result<(), SensorError> {
        self.deselect()?;
        self.write_reg(reg::RESET, RESET_CODE)?;
        self.write_reg(reg::RANGE, self.range as u8)?;
        self.write_reg(reg::FILTER, self.filter)?;
        self.write_reg(reg::POWER_CTL, MEASURE_MODE)?;

        let id = self.read_reg(reg::DEVID_AD)?;
        if id != DEVICE_ID {
            log_error!("accelerometer id mismatch: {}", id);
            return Err(SensorError::WrongDevice(id));
        }
        log_info!("accelerometer ready");
        Ok(())
    }

    fn has_data(&mut self) -> bool {
        matches!(self.status(), Ok(s) if s & status::DATA_READY != 0)
    }

    fn read(&mut self) -> Option<RawMeasurement> {
        match self.sample() {
            Ok(s) => Some(RawMeasurement::Acceleration(s)),
            Err(e) => {
                log_warn!("accelerometer read failed: {:?}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailingPin, MockPin, MockSpiRegs};

    fn device() -> Adxl355<MockSpiRegs, MockPin> {
        let mut spi = MockSpiRegs::new();
        spi.regs[reg::DEVID_AD as usize] = DEVICE_ID;
        Adxl355::new(spi, MockPin::new())
    }

    #[test]
    fn decode_sign_extends_twenty_bits() {
        let buf = [0x3E, 0x80, 0x00, 0xC1, 0x80, 0x00, 0x7F, 0xFF, 0xF0];
        assert_eq!(decode_axes(&buf), [256_000, -256_000, 0x7FFFF]);
        assert_eq!(decode_axes(&[0x80, 0, 0, 0xFF, 0xFF, 0xF0, 0, 0, 0]), [-0x80000, -1, 0]);
    }

    #[test]
    fn begin_configures_and_checks_id() {
        let mut dev = device().with_range(Range::G4);
        dev.begin().unwrap();

        let (spi, cs) = dev.free();
        assert!(cs.is_high());
        assert_eq!(
            spi.writes,
            vec![
                (reg::RESET, RESET_CODE),
                (reg::RANGE, 0x02),
                (reg::FILTER, filter::LPF_4HZ),
                (reg::POWER_CTL, MEASURE_MODE),
            ]
        );
    }

    #[test]
    fn wrong_device_is_reported() {
        let mut dev = Adxl355::new(MockSpiRegs::new(), MockPin::new());
        assert_eq!(dev.begin(), Err(SensorError::WrongDevice(0)));
    }

    #[test]
    fn chip_select_failure_is_a_bus_error() {
        let mut spi = MockSpiRegs::new();
        spi.regs[reg::DEVID_AD as usize] = DEVICE_ID;
        let mut dev = Adxl355::new(spi, FailingPin);
        assert_eq!(dev.read_reg(reg::DEVID_AD), Err(SensorError::Bus));
        assert_eq!(dev.write_reg(reg::POWER_CTL, 0), Err(SensorError::Bus));
        assert_eq!(dev.begin(), Err(SensorError::Bus));
    }

    #[test]
    fn data_ready_follows_status() {
        let mut dev = device();
        assert!(!dev.has_data());
        dev.spi.regs[reg::STATUS as usize] = status::DATA_READY;
        assert!(dev.has_data());
    }

    #[test]
    fn read_returns_scaled_sample() {
        let mut dev = device();
        let burst = [0, 0, 0, 0, 0, 0, 0x3E, 0x80, 0x00];
        let start = reg::XDATA3 as usize;
        dev.spi.regs[start..start + 9].copy_from_slice(&burst);

        match dev.read() {
            Some(RawMeasurement::Acceleration(s)) => {
                assert_eq!((s.x, s.y, s.z), (0, 0, 256_000));
                assert_eq!(s.counts_per_g, 256_000);
                assert!((s.magnitude_g() - 1.0).abs() < 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
