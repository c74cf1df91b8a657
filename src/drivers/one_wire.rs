//! Bit-banged 1-Wire bus master (standard speed).
//!
//! Works over any open-drain pin that implements the `embedded-hal` 1.0
//! `InputPin + OutputPin` traits (on ESP-IDF: a `PinDriver` in
//! `InputOutput` open-drain mode) and a microsecond [`DelayNs`].
//!
//! Slot timings follow Maxim AN126 "standard" values. Each slot runs inside
//! a critical section: an interrupt landing between pulling the line low and
//! sampling it would stretch the slot past the device's window.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

// ── Timing (µs) ───────────────────────────────────────────────

const RESET_LOW_US: u32 = 480;
const PRESENCE_SAMPLE_US: u32 = 70;
const RESET_RECOVERY_US: u32 = 410;
const WRITE_ONE_LOW_US: u32 = 6;
const WRITE_ONE_RELEASE_US: u32 = 64;
const WRITE_ZERO_LOW_US: u32 = 60;
const WRITE_ZERO_RELEASE_US: u32 = 10;
const READ_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_RECOVERY_US: u32 = 55;

// ── ROM commands ──────────────────────────────────────────────

/// Address every device on the bus (single-drop bus only).
pub const CMD_SKIP_ROM: u8 = 0xCC;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireError {
    /// The pin driver reported an error.
    Pin,
    /// The line is held low while idle (short or missing pull-up).
    BusStuckLow,
}

impl fmt::Display for OneWireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin => write!(f, "pin driver error"),
            Self::BusStuckLow => write!(f, "bus held low while idle"),
        }
    }
}

// ── Bus abstraction ───────────────────────────────────────────

/// Byte-level 1-Wire operations. Device drivers (DS18B20) are written
/// against this trait so they can be tested with a scripted bus.
pub trait OneWireBus {
    /// Issue a reset pulse. Returns `true` if a device answered with a
    /// presence pulse.
    fn reset(&mut self) -> Result<bool, OneWireError>;

    /// Write one byte, LSB first.
    fn write_byte(&mut self, byte: u8) -> Result<(), OneWireError>;

    /// Read one byte, LSB first.
    fn read_byte(&mut self) -> Result<u8, OneWireError>;
}

/// 1-Wire master over a single open-drain GPIO.
pub struct OneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take ownership of the pin and release the line (high = idle).
    pub fn new(mut pin: P, delay: D) -> Result<Self, OneWireError> {
        pin.set_high().map_err(|_| OneWireError::Pin)?;
        Ok(Self { pin, delay })
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), OneWireError> {
        let (low_us, release_us) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_RELEASE_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_RELEASE_US)
        };
        critical_section::with(|_| {
            self.pin.set_low().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(low_us);
            self.pin.set_high().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(release_us);
            Ok(())
        })
    }

    fn read_bit(&mut self) -> Result<bool, OneWireError> {
        let bit = critical_section::with(|_| {
            self.pin.set_low().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(READ_LOW_US);
            self.pin.set_high().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(READ_SAMPLE_US);
            self.pin.is_high().map_err(|_| OneWireError::Pin)
        })?;
        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }

    /// Return the pin, e.g. to reconfigure it.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P, D> OneWireBus for OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn reset(&mut self) -> Result<bool, OneWireError> {
        self.pin.set_high().map_err(|_| OneWireError::Pin)?;
        if self.pin.is_low().map_err(|_| OneWireError::Pin)? {
            return Err(OneWireError::BusStuckLow);
        }

        let present = critical_section::with(|_| {
            self.pin.set_low().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(RESET_LOW_US);
            self.pin.set_high().map_err(|_| OneWireError::Pin)?;
            self.delay.delay_us(PRESENCE_SAMPLE_US);
            self.pin.is_low().map_err(|_| OneWireError::Pin)
        })?;
        self.delay.delay_us(RESET_RECOVERY_US);
        Ok(present)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), OneWireError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, OneWireError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

/// Dallas/Maxim CRC-8 (polynomial x⁸ + x⁵ + x⁴ + 1, reflected 0x8C).
///
/// Running it over data followed by its own CRC byte yields zero.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}
