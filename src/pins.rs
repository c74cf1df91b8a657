//! GPIO / peripheral pin assignments for the AquaSense board (ESP32-WROOM).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Water-level probe (resistive, power-gated)
// ---------------------------------------------------------------------------

/// Digital output: supplies the probe only while it is being measured.
/// Keeping it de-energised between samples slows electrode corrosion.
pub const WATER_POWER_GPIO: i32 = 17;
/// Analog input: probe signal. GPIO 36 is ADC1 channel 0 on the ESP32.
pub const WATER_SIGNAL_GPIO: i32 = 36;
pub const WATER_SIGNAL_ADC1_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Temperature probe (DS18B20, 1-Wire)
// ---------------------------------------------------------------------------

/// Open-drain 1-Wire data line with external 4.7 kΩ pull-up.
pub const ONE_WIRE_GPIO: i32 = 23;

// ---------------------------------------------------------------------------
// Flow sensor (hall-effect, pulse output)
// ---------------------------------------------------------------------------

/// Input with pull-up; rising-edge interrupt increments the pulse counter.
pub const FLOW_PULSE_GPIO: i32 = 2;
