// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! I2C FRAM holding the calibration map.
//!
//! Byte-addressed with a 16-bit big-endian memory address after the device address. Writes take
//! effect immediately, so there is no page or busy handling.

use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::storage::{decode_map, encode_map, CalibrationMap, PersistentStore, StorageError, MAP_LEN};

/// Default device address (A0..A2 low).
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Data bytes per write transaction.
const CHUNK: usize = 32;

/// Map offset in FRAM.
const MAP_OFFSET: u16 = 0;

pub struct Fram<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Fram<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn free(self) -> I2C {
        self.i2c
    }

    pub fn read(&mut self, mem: u16, out: &mut [u8]) -> Result<(), StorageError> {
        self.i2c
            .write_read(self.address, &mem.to_be_bytes(), out)
            .map_err(|_| StorageError::Bus)
    }

    pub fn write(&mut self, mem: u16, data: &[u8]) -> Result<(), StorageError> {
        let mut buf = [0u8; CHUNK + 2];
        let mut addr = mem;
        for chunk in data.chunks(CHUNK) {
            buf[..2].copy_from_slice(&addr.to_be_bytes());
            buf[2..2 + chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.address, &buf[..2 + chunk.len()])
                .map_err(|_| StorageError::Bus)?;
            addr = addr.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }
}

impl<I2C, E> PersistentStore for Fram<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Probe the device with a one-byte read.
    fn begin(&mut self) -> Result<(), StorageError> {
        let mut probe = [0u8; 1];
        self.read(MAP_OFFSET, &mut probe)
    }

    fn read_map(&mut self) -> Result<CalibrationMap, StorageError> {
        let mut buf = [0u8; MAP_LEN];
        self.read(MAP_OFFSET, &mut buf)?;
        decode_map(&buf)
    }

    fn write_map(&mut self, map: &CalibrationMap) -> Result<(), StorageError> {
        self.write(MAP_OFFSET, &encode_map(map))?;
        log_info!("calibration map written");
        Ok(())
    }
}
