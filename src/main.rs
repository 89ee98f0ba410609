// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Leveler firmware for the STM32F767 controller board.
//!
//! One cooperative loop: read the operator buttons, step the motion controller, refresh the console
//! display and flash the fault code. Nothing in the loop blocks except the fixed loop delay.

#![no_main]
#![no_std]

use cortex_m::delay::Delay;
use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_halt as _;

use hal::{
    can::Can,
    i2c::{BlockingI2c, Mode as I2cMode},
    pac,
    prelude::*,
    serial::{Config, Serial},
    spi::{Mode, Phase, Polarity, Spi},
};
use stm32f7xx_hal as hal;

use leveler::{
    actuators::{GpioBank, Led, RamMap, RamPins},
    config::LevelerConfig,
    control::{MotionController, MotionState},
    display::TextConsole,
    drivers::{Adxl355, CanBitrate, Fram, Mtlt, SerialCan},
    fault::{FaultFlasher, FaultHandler},
    hw::{BoardPins, BufferedUsart, Button, CanBus, DwtClock, Edge, SensorLink, SpiBus, Usart},
    log_error, log_info, log_warn,
    sensor::{AttitudeSource, DualInclinometer},
    storage::{load_calibration, PersistentStore},
    time::{elapsed_ms, Clock},
};

/// Reach the bus inclinometer through the on-chip CAN controller instead of the UART adapter.
const NATIVE_CAN: bool = false;

/// CAN_BTR for 250 kbit/s with a 54 MHz APB1 clock (prescaler 12, BS1 15 tq, BS2 2 tq).
const CAN_BTR_250K: u32 = 0x001E_000B;

const LOOP_PERIOD_MS: u32 = 100;
const HEARTBEAT_PERIOD_MS: u32 = 500;

fn usart_config(baud: u32) -> Config {
    Config {
        baud_rate: baud.bps(),
        ..Default::default()
    }
}

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
    let mut apb1 = rcc.apb1;
    let mut apb2 = rcc.apb2;

    let clock = DwtClock::start(&mut cp.DCB, &mut cp.DWT, clocks.sysclk().raw());
    let mut delay = Delay::new(cp.SYST, clocks.sysclk().raw());

    let pins = BoardPins::new(
        dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE, dp.GPIOF, dp.GPIOG,
    );

    // USART1 (DBG)
    let serial = Serial::new(
        dp.USART1,
        (pins.usart1.tx, pins.usart1.rx),
        &clocks,
        usart_config(115_200),
    );
    let mut debug = Usart::new(serial);
    debug.println("leveler starting");

    let cfg = LevelerConfig::default();
    if let Err(e) = cfg.validate() {
        log_error!("invalid configuration: {}", e);
    }

    let faults = FaultHandler::new();
    faults.set_time(clock.now_ms());

    // FRAM (I2C1)
    let i2c = BlockingI2c::i2c1(
        dp.I2C1,
        (pins.i2c1.scl, pins.i2c1.sda),
        I2cMode::standard(100.kHz()),
        &clocks,
        &mut apb1,
        10_000,
    );
    let mut fram = Fram::new(i2c);
    let mut map = load_calibration(&mut fram, &faults);

    // Bus inclinometer link
    let link = if NATIVE_CAN {
        let can = Can::new(dp.CAN1, &mut apb1, (pins.can1.tx, pins.can1.rx));
        let mut bus = CanBus::new(can, CAN_BTR_250K, false, false);
        bus.accept_all();
        log_info!("bus inclinometer on CAN1");
        SensorLink::Native(bus)
    } else {
        let serial = Serial::new(
            dp.USART2,
            (pins.usart2.tx, pins.usart2.rx),
            &clocks,
            usart_config(115_200),
        );
        let mut adapter = SerialCan::new(BufferedUsart::new(serial));
        if adapter.configure(CanBitrate::Kbps250, &mut delay).is_err() {
            log_warn!("serial CAN adapter did not accept its configuration");
        }
        SensorLink::Adapter(adapter)
    };
    let mtlt = Mtlt::new(link, cfg.bus_sensor);

    // Accelerometer (SPI4)
    let spi_mode = Mode {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnFirstTransition,
    };
    let spi4 = Spi::new(dp.SPI4, (pins.spi4.sck, pins.spi4.miso, pins.spi4.mosi))
        .enable::<u8>(spi_mode, 1.MHz(), &clocks, &mut apb2);
    let adxl = Adxl355::new(SpiBus::new(spi4), pins.spi4.cs_accel);

    let mut sensor = DualInclinometer::new(mtlt, adxl, &faults, &cfg);
    if let Err(e) = sensor.begin() {
        log_error!("sensor start failed: {}", e);
    }
    if cfg.provision_sensor {
        if let Err(e) = sensor.first().source().provision() {
            log_error!("inclinometer provisioning failed: {}", e);
        }
    }
    sensor.import_zero(&map);

    // Outputs
    let [r1, r2, r3, r4] = pins.rams.raise;
    let [l1, l2, l3, l4] = pins.rams.lower;
    let ram = |raise, lower| RamPins {
        raise: Led::active_high(raise),
        lower: Led::active_high(lower),
    };
    let outputs = GpioBank::new(
        [ram(r1, l1), ram(r2, l2), ram(r3, l3), ram(r4, l4)],
        Led::active_high(pins.rams.motor_raise),
        Led::active_high(pins.rams.motor_lower),
        [
            Led::active_high(pins.rams.ready),
            Led::active_high(pins.rams.fault_active),
            Led::active_high(pins.rams.fault_clearable),
        ],
    )
    .with_map(RamMap::SITE);

    let mut status_led = Led::active_high(pins.leds.status);
    let mut heartbeat = Led::active_high(pins.leds.heartbeat);
    let mut flasher = FaultFlasher::new();
    let mut console = TextConsole::new(debug, RamMap::SITE);

    let mut zero_btn = Button::active_low(pins.buttons.zero);
    let mut raise_btn = Button::active_low(pins.buttons.raise);
    let mut lower_btn = Button::active_low(pins.buttons.lower);
    let mut clear_btn = Button::active_low(pins.buttons.clear_fault);
    let mut provision_btn = Button::active_low(pins.buttons.provision);

    let mut controller = MotionController::new(&mut sensor, outputs, &faults, &cfg);
    controller.initialize(clock.now_ms());
    log_info!("leveler ready");

    let mut last_heartbeat = clock.now_ms();

    loop {
        let now = clock.now_ms();

        // Raise and lower are hold-to-run.
        match raise_btn.poll() {
            Some(Edge::Pressed) => controller.request_raise(),
            Some(Edge::Released) if !lower_btn.is_pressed() => controller.request_off(),
            _ => {}
        }
        match lower_btn.poll() {
            Some(Edge::Pressed) => controller.request_lower(),
            Some(Edge::Released) if !raise_btn.is_pressed() => controller.request_off(),
            _ => {}
        }
        if clear_btn.pressed() {
            controller.request_clear_fault();
        }

        if zero_btn.pressed() {
            match controller.zero(&mut map) {
                Ok(()) => {
                    if let Err(e) = fram.write_map(&map) {
                        log_error!("failed to store calibration: {}", e);
                    }
                }
                Err(e) => log_warn!("zero rejected: {}", e),
            }
        }

        if provision_btn.pressed() {
            if controller.state() == MotionState::NotRunning {
                if let Err(e) = controller.sensor().first().source().provision() {
                    log_error!("inclinometer provisioning failed: {}", e);
                }
            } else {
                log_warn!("provisioning ignored while running");
            }
        }

        controller.step(now);
        controller.update_display(&mut console, now);

        let flash = flasher.step(&faults, now);
        status_led.set(flash.led);
        if flash.report {
            let _ = faults.write_report(console.writer());
        }

        if elapsed_ms(now, last_heartbeat) >= HEARTBEAT_PERIOD_MS {
            heartbeat.toggle();
            last_heartbeat = now;
        }

        delay.delay_ms(LOOP_PERIOD_MS);
    }
}
