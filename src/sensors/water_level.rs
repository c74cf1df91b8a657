//! Resistive water-level probe, power-gated.
//!
//! The probe is only energised for the duration of a measurement: drive the
//! power GPIO high, let the divider settle, take one ADC sample, hold
//! briefly, then drive it low again. Leaving DC across the electrodes
//! between samples corrodes them and self-heats the water column.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection, and only
//! while the simulated power GPIO is high. `sim_fail_water_adc` makes the
//! conversion fail like a driver error would.
//!
//! A failed conversion is an error, never a zero level: the caller keeps
//! the previous valid sample.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::pins;

#[cfg(not(target_os = "espidf"))]
static SIM_WATER_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
static SIM_WATER_ADC_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_water_adc(raw: u16) {
    SIM_WATER_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_water_adc(fail: bool) {
    SIM_WATER_ADC_FAULT.store(fail, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterLevelReading {
    /// Raw 12-bit ADC count.
    pub raw: u16,
    /// Scaled level, `raw / divisor`.
    pub level: u16,
}

pub struct WaterLevelSensor {
    power_settle: Duration,
    read_settle: Duration,
    divisor: u16,
}

impl WaterLevelSensor {
    pub fn new(power_settle_ms: u32, read_settle_ms: u32, divisor: u16) -> Self {
        Self {
            power_settle: Duration::from_millis(u64::from(power_settle_ms)),
            read_settle: Duration::from_millis(u64::from(read_settle_ms)),
            divisor: divisor.max(1),
        }
    }

    /// Energise, sample, de-energise. Blocks for both settle delays. The
    /// probe is switched off again even when the conversion fails.
    pub fn read(&mut self) -> Result<WaterLevelReading, SensorError> {
        hw_init::gpio_write(pins::WATER_POWER_GPIO, true);
        std::thread::sleep(self.power_settle);
        let raw = self.read_adc();
        std::thread::sleep(self.read_settle);
        hw_init::gpio_write(pins::WATER_POWER_GPIO, false);

        let raw = raw?;
        Ok(WaterLevelReading {
            raw,
            level: scale_level(raw, self.divisor),
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(pins::WATER_SIGNAL_ADC1_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        if SIM_WATER_ADC_FAULT.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed(-1));
        }
        // An unpowered probe floats near ground.
        if hw_init::gpio_output_level(pins::WATER_POWER_GPIO) {
            Ok(SIM_WATER_ADC.load(Ordering::Relaxed))
        } else {
            Ok(0)
        }
    }
}

/// Integer division of the raw count, e.g. 530 / 10 → 53.
pub fn scale_level(raw: u16, divisor: u16) -> u16 {
    raw / divisor.max(1)
}
