//! DS18B20 digital temperature probe on the 1-Wire bus.
//!
//! One conversion per sample: reset, skip ROM, CONVERT T, wait for the
//! 12-bit conversion (750 ms), reset, skip ROM, READ SCRATCHPAD. The nine
//! scratchpad bytes are CRC-checked before the temperature word is used.
//!
//! [`in_band`] is the plausibility check applied by the sampler; readings
//! outside the band are dropped, not clamped.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`Ds18b20`] over a bit-banged [`OneWire`](crate::drivers::one_wire::OneWire).
//! On host/test: [`SimProbe`] reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use crate::drivers::one_wire::{crc8, OneWireBus, OneWireError, CMD_SKIP_ROM};
use crate::error::SensorError;

const CMD_CONVERT_T: u8 = 0x44;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;
const SCRATCHPAD_LEN: usize = 9;

/// Anything that can produce one temperature sample in °C.
pub trait TemperatureProbe {
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

impl From<OneWireError> for SensorError {
    fn from(e: OneWireError) -> Self {
        match e {
            OneWireError::Pin | OneWireError::BusStuckLow => Self::BusFault,
        }
    }
}

/// Single DS18B20 on a dedicated bus (addressed with SKIP ROM).
pub struct Ds18b20<B, D> {
    bus: B,
    delay: D,
    conversion_ms: u32,
}

impl<B, D> Ds18b20<B, D>
where
    B: OneWireBus,
    D: DelayNs,
{
    /// `delay` is only used for the conversion wait, so it should yield
    /// (FreeRTOS delay) rather than spin.
    pub fn new(bus: B, delay: D, conversion_ms: u32) -> Self {
        Self {
            bus,
            delay,
            conversion_ms,
        }
    }

    fn select(&mut self) -> Result<(), SensorError> {
        if !self.bus.reset()? {
            return Err(SensorError::NoDevice);
        }
        self.bus.write_byte(CMD_SKIP_ROM)?;
        Ok(())
    }

    fn read_scratchpad(&mut self) -> Result<[u8; SCRATCHPAD_LEN], SensorError> {
        self.select()?;
        self.bus.write_byte(CMD_READ_SCRATCHPAD)?;
        let mut pad = [0u8; SCRATCHPAD_LEN];
        for byte in pad.iter_mut() {
            *byte = self.bus.read_byte()?;
        }
        if crc8(&pad[..SCRATCHPAD_LEN - 1]) != pad[SCRATCHPAD_LEN - 1] {
            return Err(SensorError::CrcMismatch);
        }
        Ok(pad)
    }
}

impl<B, D> TemperatureProbe for Ds18b20<B, D>
where
    B: OneWireBus,
    D: DelayNs,
{
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.select()?;
        self.bus.write_byte(CMD_CONVERT_T)?;
        self.delay.delay_ms(self.conversion_ms);

        let pad = self.read_scratchpad()?;
        Ok(raw_to_celsius(i16::from_le_bytes([pad[0], pad[1]])))
    }
}

/// 12-bit two's complement, 1/16 °C per LSB.
pub fn raw_to_celsius(raw: i16) -> f32 {
    f32::from(raw) / 16.0
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_PRESENT: AtomicBool = AtomicBool::new(true);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temperature(celsius: f32) {
    SIM_TEMP_BITS.store(celsius.to_bits(), Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_present(present: bool) {
    SIM_PROBE_PRESENT.store(present, Ordering::Relaxed);
}

/// Host stand-in for the DS18B20.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimProbe;

#[cfg(not(target_os = "espidf"))]
impl TemperatureProbe for SimProbe {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        if !SIM_PROBE_PRESENT.load(Ordering::Relaxed) {
            return Err(SensorError::NoDevice);
        }
        Ok(f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed)))
    }
}

// ── Plausibility band ─────────────────────────────────────────

/// Open interval check; NaN is never in band.
pub fn in_band(celsius: f32, min_c: f32, max_c: f32) -> bool {
    celsius > min_c && celsius < max_c
}
