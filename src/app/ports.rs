//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (sensors, Wi-Fi, database, event sinks) implement these
//! traits. The [`MonitorService`](super::service::MonitorService) consumes
//! them via generics, so the domain core never touches hardware directly.

use core::fmt;
use core::net::Ipv4Addr;

use crate::error::SensorError;
use crate::rtdb::{DbError, TokenStatus};
use crate::sensors::flow::FlowReading;
use crate::sensors::water_level::WaterLevelReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per sampling interval.
pub trait SensorPort {
    /// Power-gated analog read of the water-level probe.
    fn read_water_level(&mut self) -> Result<WaterLevelReading, SensorError>;

    /// Drain the pulse counter accumulated since the previous call.
    fn read_flow(&mut self) -> FlowReading;

    /// One temperature conversion, unfiltered. Band checking is the
    /// caller's job.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain → Wi-Fi)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// The driver rejected a configuration or start call (ESP error code).
    Driver(i32),
    /// Association did not complete within the connect timeout.
    Timeout,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::Driver(rc) => write!(f, "WiFi driver error (rc={rc})"),
            Self::Timeout => write!(f, "WiFi connection timed out"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

pub trait ConnectivityPort {
    /// One bounded association attempt. Returns the station IPv4 address.
    fn connect(&mut self) -> Result<Ipv4Addr, ConnectivityError>;

    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Database port (driven adapter: domain → remote database)
// ───────────────────────────────────────────────────────────────

/// Key/value string writes guarded by a readiness check.
pub trait DatabasePort {
    /// `true` when writes can be attempted. May block to sign in or
    /// refresh credentials.
    fn ready(&mut self, now_ms: u64) -> bool;

    /// Write `value` at `path`. Each call is independent.
    fn set_string(&mut self, path: &str, value: &str) -> Result<(), DbError>;

    /// Oldest credential status change not yet reported.
    fn poll_status_change(&mut self) -> Option<TokenStatus>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
