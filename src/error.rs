//! Unified error types for the AquaSense firmware.
//!
//! Each subsystem keeps its own small error enum next to the code that
//! produces it (`ConnectivityError`, `DbError`, `HwInitError`, ...). This
//! module holds the sensor errors shared by every driver and the top-level
//! [`Error`] every subsystem converts into, so `main` can `?` through boot.

use core::fmt;

use crate::app::ports::ConnectivityError;
use crate::config::ConfigError;
use crate::drivers::hw_init::HwInitError;
use crate::rtdb::DbError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// The Wi-Fi link could not be brought up.
    Connectivity(ConnectivityError),
    /// The remote database rejected or failed a request.
    Database(DbError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// Configuration or credentials are invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Connectivity(e) => write!(f, "wifi: {e}"),
            Self::Database(e) => write!(f, "database: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No device answered the 1-Wire reset with a presence pulse.
    NoDevice,
    /// Scratchpad CRC did not match its contents.
    CrcMismatch,
    /// The bus pin could not be driven or sampled.
    BusFault,
    /// The ADC driver rejected a conversion (ESP error code).
    AdcReadFailed(i32),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no device on bus"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::BusFault => write!(f, "bus I/O fault"),
            Self::AdcReadFailed(rc) => write!(f, "ADC read failed (rc={rc})"),
        }
    }
}

impl std::error::Error for SensorError {}
