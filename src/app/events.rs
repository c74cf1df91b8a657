//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log today).

use core::net::Ipv4Addr;

use super::ports::ConnectivityError;
use super::readings::LatestReadings;
use crate::rtdb::{DbError, TokenStatus};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started,

    /// A sampling pass finished; carries the stored values after it.
    Sampled(LatestReadings),

    /// The Wi-Fi link came up.
    WifiConnected { ip: Ipv4Addr },

    /// A connect attempt failed; it is retried on the next loop pass.
    WifiConnectFailed(ConnectivityError),

    /// The database credential status moved.
    TokenStatusChanged(TokenStatus),

    /// A publish cycle found the database not ready and wrote nothing.
    PublishSkipped,

    /// A publish cycle issued its writes.
    Published(PublishReport),
}

/// Outcome of one write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub path: String,
    pub result: Result<(), DbError>,
}

/// What one publish cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    /// Sequence number written to `<root>/int`.
    pub sequence: u32,
    pub writes: Vec<WriteOutcome>,
}

impl PublishReport {
    pub fn all_ok(&self) -> bool {
        self.writes.iter().all(|w| w.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.writes.iter().filter(|w| w.result.is_err())
    }
}
