//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART in production) as the human-readable lines an operator
//! watches on the serial monitor.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("Monitor started"),
            AppEvent::Sampled(r) => {
                info!(
                    "Water: {}, Flow: {:.2} L/min, Temp: {:.2}\u{00b0}C",
                    r.water_level, r.flow_lpm, r.temperature_c
                );
            }
            AppEvent::WifiConnected { ip } => {
                info!("Wi-Fi connected");
                info!("IP: {ip}");
            }
            AppEvent::WifiConnectFailed(e) => warn!("Failed to connect to Wi-Fi: {e}"),
            AppEvent::TokenStatusChanged(status) => info!("Token status changed: {status}"),
            AppEvent::PublishSkipped => warn!("Database not ready"),
            AppEvent::Published(report) => {
                for w in report.failures() {
                    if let Err(e) = &w.result {
                        warn!("Database write {} failed: {e}", w.path);
                    }
                }
                if report.all_ok() {
                    info!("Database updated (#{})", report.sequence);
                } else {
                    warn!(
                        "Database partially updated (#{}, {}/{} writes failed)",
                        report.sequence,
                        report.failures().count(),
                        report.writes.len()
                    );
                }
            }
        }
    }
}
