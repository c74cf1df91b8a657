//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and implements
//! [`SensorPort`](crate::app::ports::SensorPort), so the monitor service
//! never sees pins, buses or ISRs.

pub mod flow;
pub mod temperature;
pub mod water_level;

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::error::SensorError;
use flow::{FlowReading, FlowSensor, FLOW_PULSES};
use temperature::TemperatureProbe;
use water_level::{WaterLevelReading, WaterLevelSensor};

/// Aggregates all sensor drivers.
pub struct SensorHub<T> {
    pub water_level: WaterLevelSensor,
    pub flow: FlowSensor,
    pub temperature: T,
}

impl<T: TemperatureProbe> SensorHub<T> {
    pub fn new(water_level: WaterLevelSensor, flow: FlowSensor, temperature: T) -> Self {
        Self {
            water_level,
            flow,
            temperature,
        }
    }

    /// Hub wired to the global flow counter with calibration from `config`.
    pub fn from_config(config: &SystemConfig, temperature: T) -> Self {
        Self::new(
            WaterLevelSensor::new(
                config.water_power_settle_ms,
                config.water_read_settle_ms,
                config.water_level_divisor,
            ),
            FlowSensor::new(&FLOW_PULSES, config.flow_pulses_per_lpm),
            temperature,
        )
    }
}

impl<T: TemperatureProbe> SensorPort for SensorHub<T> {
    fn read_water_level(&mut self) -> Result<WaterLevelReading, SensorError> {
        self.water_level.read()
    }

    fn read_flow(&mut self) -> FlowReading {
        self.flow.read()
    }

    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.temperature.read_celsius()
    }
}
