//! Latest valid value of each measured quantity.
//!
//! Each field changes only when a sample is accepted. Rejected samples
//! leave the previous value in place, so a publish always carries the
//! most recent good reading (or the initial zero).

use crate::sensors::flow::FlowReading;
use crate::sensors::temperature::in_band;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatestReadings {
    /// Scaled water level (raw ADC / divisor).
    pub water_level: u16,
    /// Flow rate in L/min.
    pub flow_lpm: f32,
    /// Temperature in °C.
    pub temperature_c: f32,
}

impl LatestReadings {
    pub fn apply_water_level(&mut self, level: u16) {
        self.water_level = level;
    }

    /// Accept the flow rate only if at least one pulse was counted.
    ///
    /// A window with no pulses keeps the previous rate, so the stored value
    /// never decays to zero when the water stops. Returns whether the value
    /// was taken.
    pub fn apply_flow(&mut self, reading: &FlowReading) -> bool {
        if reading.has_pulses() {
            self.flow_lpm = reading.litres_per_min;
            true
        } else {
            false
        }
    }

    /// Accept `celsius` only if strictly inside `(min_c, max_c)`.
    pub fn apply_temperature(&mut self, celsius: f32, min_c: f32, max_c: f32) -> bool {
        if in_band(celsius, min_c, max_c) {
            self.temperature_c = celsius;
            true
        } else {
            false
        }
    }
}
