//! The four string values written per publish cycle.
//!
//! | node              | value                          |
//! |-------------------|--------------------------------|
//! | `<root>/string`   | `value_<water level>`          |
//! | `<root>/int`      | publish sequence number        |
//! | `<root>/temp`     | temperature, rounded to °C     |
//! | `<root>/flowread` | flow rate, two decimals        |
//!
//! Everything is stored as a string, including the numbers.

use super::readings::LatestReadings;

pub const FIELD_STRING: &str = "string";
pub const FIELD_INT: &str = "int";
pub const FIELD_TEMP: &str = "temp";
pub const FIELD_FLOW: &str = "flowread";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    pub path: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    entries: [PayloadEntry; 4],
}

impl Payload {
    pub fn build(root: &str, readings: &LatestReadings, sequence: u32) -> Self {
        let entry = |field: &str, value: String| PayloadEntry {
            path: format!("{root}/{field}"),
            value,
        };
        Self {
            entries: [
                entry(FIELD_STRING, format_water_level(readings.water_level)),
                entry(FIELD_INT, sequence.to_string()),
                entry(FIELD_TEMP, format_temperature(readings.temperature_c)),
                entry(FIELD_FLOW, format_flow(readings.flow_lpm)),
            ],
        }
    }

    /// Entries in write order.
    pub fn entries(&self) -> &[PayloadEntry] {
        &self.entries
    }

    pub fn value_of(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.path.rsplit('/').next() == Some(field))
            .map(|e| e.value.as_str())
    }
}

pub fn format_water_level(level: u16) -> String {
    format!("value_{level}")
}

/// Nearest whole degree, halves away from zero: 23.5 → "24", -0.4 → "0".
pub fn format_temperature(celsius: f32) -> String {
    // `as` saturates, so NaN maps to 0 and infinities to the i32 limits.
    let whole = celsius.round() as i32;
    whole.to_string()
}

pub fn format_flow(lpm: f32) -> String {
    format!("{lpm:.2}")
}
