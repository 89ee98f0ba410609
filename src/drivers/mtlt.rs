// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Bus inclinometer (MTLT-series, J1939 over CAN).
//!
//! At start-up the sensor is told its output data rate, which periodic messages to emit and its
//! low-pass cutoff. It then streams SSI2 slope messages:
//!
//! ```text
//! byte  0..2   pitch, 24-bit little-endian, 1/32768 deg per count, offset -250 deg
//! byte  3..5   roll, same encoding
//! byte  6..7   unused
//! ```
//!
//! Orientation and the EEPROM save are one-time provisioning steps, sent only on request.

use crate::config::BusSensorConfig;
use crate::protocol::j1939::{J1939Interface, J1939Message};
use crate::protocol::{pgn, FrameTransport};
use crate::sensor::{RawMeasurement, SensorError, SensorSource};

/// Degrees per count of an SSI2 angle.
const SSI2_DEG_PER_COUNT: f64 = 1.0 / 32768.0;

/// Offset of an SSI2 angle in degrees.
const SSI2_OFFSET_DEG: f64 = -250.0;

fn ssi2_angle(bytes: &[u8]) -> f64 {
    let raw = u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16;
    (raw as f64 * SSI2_DEG_PER_COUNT + SSI2_OFFSET_DEG).to_radians()
}

/// Decode an SSI2 payload into `(pitch, roll)` in radians.
pub fn decode_ssi2(data: &[u8; 8]) -> (f64, f64) {
    (ssi2_angle(&data[0..3]), ssi2_angle(&data[3..6]))
}

/// J1939 inclinometer driver.
pub struct Mtlt<T: FrameTransport> {
    bus: J1939Interface<T>,
    cfg: BusSensorConfig,
    /// Last echoed periodic-type mask.
    enabled_types: Option<u8>,
}

impl<T: FrameTransport> Mtlt<T> {
    pub fn new(transport: T, cfg: BusSensorConfig) -> Self {
        Self {
            bus: J1939Interface::new(transport),
            cfg,
            enabled_types: None,
        }
    }

    fn send(&mut self, pgn: u32, value: u8) -> Result<(), SensorError> {
        let msg = J1939Message::command(
            self.cfg.source_address,
            self.cfg.sensor_address,
            pgn,
            value,
        )?;
        self.bus.write(&msg, self.cfg.sensor_address)?;
        Ok(())
    }

    /// Write the orientation word and commit the settings to the sensor's EEPROM.
    pub fn provision(&mut self) -> Result<(), SensorError> {
        let [hi, lo] = self.cfg.orientation.to_be_bytes();
        let msg = J1939Message::command2(
            self.cfg.source_address,
            self.cfg.sensor_address,
            pgn::ORIENTATION,
            hi,
            lo,
        )?;
        self.bus.write(&msg, self.cfg.sensor_address)?;

        let save = J1939Message::with_payload(
            self.cfg.source_address,
            pgn::SAVE_EEPROM,
            &[self.cfg.sensor_address],
        )?;
        self.bus.write(&save, self.cfg.sensor_address)?;
        log_info!("inclinometer provisioned: orientation {}", self.cfg.orientation);
        Ok(())
    }

    /// Periodic-type mask the sensor last reported, if it has.
    pub fn enabled_types(&self) -> Option<u8> {
        self.enabled_types
    }

    pub fn bus(&mut self) -> &mut J1939Interface<T> {
        &mut self.bus
    }
}

impl<T: FrameTransport> SensorSource for Mtlt<T> {
    fn begin(&mut self) -> Result<(), SensorError> {
        self.send(pgn::ODR, self.cfg.output_data_rate)?;
        self.send(pgn::PERIODIC_DATA_TYPES, self.cfg.periodic_types)?;
        self.send(pgn::LOW_PASS, self.cfg.low_pass_hz)?;
        self.bus.flush();
        log_info!("inclinometer configured at address {}", self.cfg.sensor_address);
        Ok(())
    }

    fn has_data(&mut self) -> bool {
        self.bus.has_frame()
    }

    fn read(&mut self) -> Option<RawMeasurement> {
        if !self.bus.has_frame() {
            return None;
        }
        let msg = self.bus.read();
        // Only the newest telemetry matters; drop anything queued behind it.
        self.bus.flush();
        let msg = msg?;

        match msg.id.pgn() {
            pgn::SSI2DATA => {
                let (pitch, roll) = decode_ssi2(&msg.data);
                Some(RawMeasurement::Angles { pitch, roll })
            }
            pgn::ENABLED_PERIODIC_DATA_TYPES => {
                self.enabled_types = Some(msg.data[0]);
                None
            }
            other => {
                log_warn!("unexpected PGN from inclinometer: {}", other);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFrameTransport;
    use crate::protocol::j1939::J1939Id;
    use bxcan::{Data, ExtendedId, Frame};

    fn sensor_frame(pgn: u32, data: [u8; 8]) -> Frame {
        let id = J1939Id::new(3, pgn, 0x80).unwrap();
        Frame::new_data(ExtendedId::new(id.raw()).unwrap(), Data::new(&data).unwrap())
    }

    fn ssi2_counts(deg: f64) -> [u8; 3] {
        let raw = ((deg + 250.0) * 32768.0) as u32;
        let b = raw.to_le_bytes();
        [b[0], b[1], b[2]]
    }

    fn sent_pgns(bus: &mut MockFrameTransport) -> Vec<(u32, [u8; 8])> {
        let mut out = Vec::new();
        while let Some(f) = bus.take_sent() {
            let msg = J1939Message::from_frame(&f).unwrap();
            out.push((msg.id.pgn(), msg.data));
        }
        out
    }

    #[test]
    fn ssi2_zero_and_offset() {
        let mut data = [0u8; 8];
        data[0..3].copy_from_slice(&ssi2_counts(0.0));
        data[3..6].copy_from_slice(&ssi2_counts(1.5));
        let (pitch, roll) = decode_ssi2(&data);
        assert!(pitch.abs() < 1e-9);
        assert!((roll - 1.5f64.to_radians()).abs() < 1e-9);

        let (pitch, _) = decode_ssi2(&[0; 8]);
        assert!((pitch - (-250.0f64).to_radians()).abs() < 1e-9);
    }

    #[test]
    fn begin_sends_configuration() {
        let mut mtlt = Mtlt::new(MockFrameTransport::new(), BusSensorConfig::default());
        mtlt.begin().unwrap();

        let sent = sent_pgns(mtlt.bus().transport());
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].0, pgn::ODR);
        assert_eq!(&sent[0].1[..2], &[0x80, 10]);
        assert_eq!(sent[1].0, pgn::PERIODIC_DATA_TYPES);
        assert_eq!(sent[1].1[1], 1);
        assert_eq!(sent[2].0, pgn::LOW_PASS);
        assert_eq!(sent[2].1[1], 2);
        assert_eq!(mtlt.bus().transport().flushes, 1);
    }

    #[test]
    fn provision_writes_orientation_then_saves() {
        let cfg = BusSensorConfig {
            orientation: 0x0102,
            ..BusSensorConfig::default()
        };
        let mut mtlt = Mtlt::new(MockFrameTransport::new(), cfg);
        mtlt.provision().unwrap();

        let sent = sent_pgns(mtlt.bus().transport());
        assert_eq!(sent[0].0, pgn::ORIENTATION);
        assert_eq!(&sent[0].1[..3], &[0x80, 0x01, 0x02]);
        assert_eq!(sent[1].0, pgn::SAVE_EEPROM);
    }

    #[test]
    fn failed_write_is_a_sensor_error() {
        let mut bus = MockFrameTransport::new();
        bus.fail_writes = true;
        let mut mtlt = Mtlt::new(bus, BusSensorConfig::default());
        assert!(matches!(mtlt.begin(), Err(SensorError::Protocol(_))));
    }

    #[test]
    fn reads_ssi2_and_flushes_backlog() {
        let mut mtlt = Mtlt::new(MockFrameTransport::new(), BusSensorConfig::default());
        let mut data = [0u8; 8];
        data[0..3].copy_from_slice(&ssi2_counts(0.25));
        data[3..6].copy_from_slice(&ssi2_counts(-0.5));
        mtlt.bus().transport().push_rx(sensor_frame(pgn::SSI2DATA, data));
        mtlt.bus().transport().push_rx(sensor_frame(pgn::SSI2DATA, data));

        assert!(mtlt.has_data());
        match mtlt.read() {
            Some(RawMeasurement::Angles { pitch, roll }) => {
                assert!((pitch - 0.25f64.to_radians()).abs() < 1e-6);
                assert!((roll + 0.5f64.to_radians()).abs() < 1e-6);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(mtlt.bus().transport().flushes >= 1);
    }

    #[test]
    fn enabled_types_echo_is_recorded() {
        let mut mtlt = Mtlt::new(MockFrameTransport::new(), BusSensorConfig::default());
        mtlt.bus()
            .transport()
            .push_rx(sensor_frame(pgn::ENABLED_PERIODIC_DATA_TYPES, [1, 0, 0, 0, 0, 0, 0, 0]));
        assert!(mtlt.read().is_none());
        assert_eq!(mtlt.enabled_types(), Some(1));
    }

    #[test]
    fn other_pgns_are_ignored() {
        let mut mtlt = Mtlt::new(MockFrameTransport::new(), BusSensorConfig::default());
        mtlt.bus().transport().push_rx(sensor_frame(0xFEF1, [0; 8]));
        assert!(mtlt.read().is_none());
    }
}
