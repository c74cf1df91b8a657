//! Monitor service: the hexagonal core.
//!
//! [`MonitorService`] owns the latest readings, the publish sequence number
//! and the two loop timers. All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!       SensorPort ──▶ ┌──────────────────────┐ ──▶ EventSink
//!  ConnectivityPort ◀──│    MonitorService     │
//!    DatabasePort  ◀──│ readings · sequence   │
//!                      └──────────────────────┘
//! ```

use log::{debug, info};

use crate::config::SystemConfig;
use crate::scheduler::IntervalTimer;

use super::events::{AppEvent, PublishReport, WriteOutcome};
use super::payload::Payload;
use super::ports::{ConnectivityPort, DatabasePort, EventSink, SensorPort};
use super::readings::LatestReadings;

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService {
    config: SystemConfig,
    readings: LatestReadings,
    /// Value written to `<root>/int` by the next publish.
    sequence: u32,
    sample_timer: IntervalTimer,
    publish_timer: IntervalTimer,
}

impl MonitorService {
    pub fn new(config: SystemConfig) -> Self {
        let sample_timer = IntervalTimer::new(config.sample_interval_ms);
        let publish_timer = IntervalTimer::new(config.publish_interval_ms);
        Self {
            config,
            readings: LatestReadings::default(),
            sequence: 0,
            sample_timer,
            publish_timer,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "MonitorService started (sample every {} ms, publish every {} ms to {})",
            self.config.sample_interval_ms, self.config.publish_interval_ms, self.config.db_root
        );
        sink.emit(&AppEvent::Started);
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One main-loop pass: keep Wi-Fi up, then run whichever of sample and
    /// publish are due at `now_ms`, in that order.
    pub fn poll(
        &mut self,
        now_ms: u64,
        sensors: &mut impl SensorPort,
        wifi: &mut impl ConnectivityPort,
        db: &mut impl DatabasePort,
        sink: &mut impl EventSink,
    ) {
        self.ensure_connected(wifi, sink);

        if self.sample_timer.due(now_ms) {
            self.sample(sensors, sink);
        }

        if self.publish_timer.due(now_ms) {
            self.publish(now_ms, db, sink);
        }
    }

    /// Attempt a connection if the link is down. No backoff: the next pass
    /// tries again.
    pub fn ensure_connected(&mut self, wifi: &mut impl ConnectivityPort, sink: &mut impl EventSink) -> bool {
        if wifi.is_connected() {
            return true;
        }
        match wifi.connect() {
            Ok(ip) => {
                sink.emit(&AppEvent::WifiConnected { ip });
                true
            }
            Err(e) => {
                sink.emit(&AppEvent::WifiConnectFailed(e));
                false
            }
        }
    }

    /// Read all three sensors and fold the accepted values into the stored
    /// readings.
    pub fn sample(&mut self, sensors: &mut impl SensorPort, sink: &mut impl EventSink) -> LatestReadings {
        match sensors.read_water_level() {
            Ok(water) => self.readings.apply_water_level(water.level),
            Err(e) => debug!("water level: read failed ({e}), keeping {}", self.readings.water_level),
        }

        let flow = sensors.read_flow();
        if !self.readings.apply_flow(&flow) {
            debug!("flow: no pulses this window, keeping {:.2} L/min", self.readings.flow_lpm);
        }

        match sensors.read_temperature() {
            Ok(celsius) => {
                if !self
                    .readings
                    .apply_temperature(celsius, self.config.temp_min_c, self.config.temp_max_c)
                {
                    debug!("temperature: {celsius:.2}°C outside band, dropped");
                }
            }
            Err(e) => debug!("temperature: probe read failed ({e}), dropped"),
        }

        sink.emit(&AppEvent::Sampled(self.readings));
        self.readings
    }

    /// Write the stored readings if the database is ready.
    ///
    /// Returns `None` (and writes nothing) when not ready. Otherwise every
    /// field is written independently; failures are recorded in the report
    /// and do not stop the remaining writes. Failures are rendered by the
    /// sink from the `Published` event. The sequence number advances
    /// once per ready cycle whatever the write outcomes.
    pub fn publish(
        &mut self,
        now_ms: u64,
        db: &mut impl DatabasePort,
        sink: &mut impl EventSink,
    ) -> Option<PublishReport> {
        let ready = db.ready(now_ms);
        Self::report_token_changes(db, sink);
        if !ready {
            sink.emit(&AppEvent::PublishSkipped);
            return None;
        }

        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let payload = Payload::build(self.config.db_root.as_str(), &self.readings, sequence);
        let writes = payload
            .entries()
            .iter()
            .map(|entry| WriteOutcome {
                path: entry.path.clone(),
                result: db.set_string(&entry.path, &entry.value),
            })
            .collect();

        let report = PublishReport { sequence, writes };
        sink.emit(&AppEvent::Published(report.clone()));
        Some(report)
    }

    fn report_token_changes(db: &mut impl DatabasePort, sink: &mut impl EventSink) {
        while let Some(status) = db.poll_status_change() {
            sink.emit(&AppEvent::TokenStatusChanged(status));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn readings(&self) -> &LatestReadings {
        &self.readings
    }

    /// Sequence number the next publish will write.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }
}
