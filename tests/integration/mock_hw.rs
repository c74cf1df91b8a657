//! Mock adapters for integration tests.
//!
//! Each mock scripts its inputs up front and records every call so tests
//! can assert on the full history without touching GPIO, Wi-Fi or TLS.

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

use aquasense::app::events::AppEvent;
use aquasense::app::ports::{ConnectivityError, ConnectivityPort, DatabasePort, EventSink, SensorPort};
use aquasense::error::SensorError;
use aquasense::rtdb::{DbError, HttpClient, HttpError, HttpResponse, Method, TokenStatus};
use aquasense::sensors::flow::{pulses_to_lpm, FlowReading};
use aquasense::sensors::water_level::{scale_level, WaterLevelReading};

// ── Sensors ───────────────────────────────────────────────────

/// Serves queued samples; once a queue is empty its last value repeats
/// (pulses fall back to zero).
pub struct MockSensors {
    pub water_raw: VecDeque<Result<u16, SensorError>>,
    pub pulses: VecDeque<u32>,
    pub temps: VecDeque<Result<f32, SensorError>>,
    last_raw: u16,
    last_temp: Result<f32, SensorError>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockSensors {
    pub fn new() -> Self {
        Self {
            water_raw: VecDeque::new(),
            pulses: VecDeque::new(),
            temps: VecDeque::new(),
            last_raw: 0,
            last_temp: Err(SensorError::NoDevice),
            reads: 0,
        }
    }

    pub fn steady(raw: u16, pulses: u32, temp: f32) -> Self {
        let mut s = Self::new();
        s.last_raw = raw;
        s.last_temp = Ok(temp);
        s.pulses.push_back(pulses);
        s
    }

    pub fn queue(self, raw: u16, pulses: u32, temp: Result<f32, SensorError>) -> Self {
        self.queue_water(Ok(raw), pulses, temp)
    }

    pub fn queue_water(mut self, raw: Result<u16, SensorError>, pulses: u32, temp: Result<f32, SensorError>) -> Self {
        self.water_raw.push_back(raw);
        self.pulses.push_back(pulses);
        self.temps.push_back(temp);
        self
    }
}

impl Default for MockSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockSensors {
    fn read_water_level(&mut self) -> Result<WaterLevelReading, SensorError> {
        self.reads += 1;
        if let Some(raw) = self.water_raw.pop_front() {
            self.last_raw = raw?;
        }
        Ok(WaterLevelReading {
            raw: self.last_raw,
            level: scale_level(self.last_raw, 10),
        })
    }

    fn read_flow(&mut self) -> FlowReading {
        let pulse_count = self.pulses.pop_front().unwrap_or(0);
        FlowReading {
            pulse_count,
            litres_per_min: pulses_to_lpm(pulse_count, 18.0),
        }
    }

    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        if let Some(t) = self.temps.pop_front() {
            self.last_temp = t;
        }
        self.last_temp
    }
}

// ── Wi-Fi ─────────────────────────────────────────────────────

pub struct MockWifi {
    pub connected: bool,
    /// Outcomes of successive connect attempts; empty means success.
    pub outcomes: VecDeque<Result<Ipv4Addr, ConnectivityError>>,
    pub connect_calls: u32,
}

#[allow(dead_code)]
impl MockWifi {
    pub fn up() -> Self {
        Self {
            connected: true,
            outcomes: VecDeque::new(),
            connect_calls: 0,
        }
    }

    pub fn down() -> Self {
        Self {
            connected: false,
            ..Self::up()
        }
    }

    pub fn failing(times: usize) -> Self {
        let mut w = Self::down();
        w.outcomes
            .extend(std::iter::repeat_n(Err(ConnectivityError::Timeout), times));
        w
    }
}

impl ConnectivityPort for MockWifi {
    fn connect(&mut self) -> Result<Ipv4Addr, ConnectivityError> {
        self.connect_calls += 1;
        let outcome = self
            .outcomes
            .pop_front()
            .unwrap_or(Ok(Ipv4Addr::new(10, 0, 0, 7)));
        self.connected = outcome.is_ok();
        outcome
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── Database ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDb {
    pub ready: bool,
    pub ready_calls: u32,
    pub writes: Vec<(String, String)>,
    /// Paths whose writes fail with the given error.
    pub failing: HashMap<String, DbError>,
    pub status_changes: VecDeque<TokenStatus>,
}

#[allow(dead_code)]
impl MockDb {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Default::default()
        }
    }

    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn value_at(&self, path: &str) -> Option<&str> {
        self.writes
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, v)| v.as_str())
    }

    /// Values written to `path`, oldest first.
    pub fn history(&self, path: &str) -> Vec<&str> {
        self.writes
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl DatabasePort for MockDb {
    fn ready(&mut self, _now_ms: u64) -> bool {
        self.ready_calls += 1;
        self.ready
    }

    fn set_string(&mut self, path: &str, value: &str) -> Result<(), DbError> {
        self.writes.push((path.to_owned(), value.to_owned()));
        match self.failing.get(path) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn poll_status_change(&mut self) -> Option<TokenStatus> {
        self.status_changes.pop_front()
    }
}

// ── HTTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: String,
}

/// Fake Firebase endpoints: sign-in and refresh hand out numbered tokens,
/// writes return `write_status`, or 401 for a revoked token or a path a
/// security rule denies.
pub struct FakeFirebase {
    pub requests: Vec<RecordedRequest>,
    pub sign_in_status: u16,
    pub write_status: u16,
    pub expires_in_secs: u64,
    pub revoked: Vec<String>,
    /// Node paths (e.g. `/test/string`) whose writes are denied.
    pub denied_paths: Vec<String>,
    pub reachable: bool,
    issued: u32,
}

#[allow(dead_code)]
impl FakeFirebase {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            sign_in_status: 200,
            write_status: 200,
            expires_in_secs: 3600,
            revoked: Vec::new(),
            denied_paths: Vec::new(),
            reachable: true,
            issued: 0,
        }
    }

    pub fn puts(&self) -> Vec<&RecordedRequest> {
        self.requests.iter().filter(|r| r.method == Method::Put).collect()
    }

    pub fn sign_ins(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.url.contains("signInWithPassword"))
            .count()
    }

    pub fn refreshes(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.url.contains("securetoken"))
            .count()
    }

    fn issue(&mut self) -> String {
        self.issued += 1;
        format!("token-{}", self.issued)
    }
}

impl Default for FakeFirebase {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for FakeFirebase {
    fn request(&mut self, method: Method, url: &str, body: &[u8]) -> Result<HttpResponse, HttpError> {
        self.requests.push(RecordedRequest {
            method,
            url: url.to_owned(),
            body: String::from_utf8_lossy(body).into_owned(),
        });
        if !self.reachable {
            return Err(HttpError::Connect(-1));
        }

        let respond = |status: u16, body: String| {
            Ok(HttpResponse {
                status,
                body: body.into_bytes(),
            })
        };

        if url.contains("signInWithPassword") {
            if self.sign_in_status != 200 {
                return respond(
                    self.sign_in_status,
                    r#"{"error":{"message":"INVALID_LOGIN_CREDENTIALS"}}"#.into(),
                );
            }
            let token = self.issue();
            return respond(
                200,
                format!(
                    r#"{{"idToken":"{token}","refreshToken":"refresh-{token}","expiresIn":"{}"}}"#,
                    self.expires_in_secs
                ),
            );
        }
        if url.contains("securetoken") {
            let token = self.issue();
            return respond(
                200,
                format!(
                    r#"{{"id_token":"{token}","refresh_token":"refresh-{token}","expires_in":"{}"}}"#,
                    self.expires_in_secs
                ),
            );
        }

        let token = url.rsplit("auth=").next().unwrap_or_default();
        let denied = self
            .denied_paths
            .iter()
            .any(|p| url.contains(&format!("{p}.json?")));
        if denied || self.revoked.iter().any(|t| t == token) {
            return respond(401, r#"{"error":"Permission denied"}"#.into());
        }
        respond(self.write_status, body_echo(body))
    }
}

fn body_echo(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn token_statuses(&self) -> Vec<TokenStatus> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::TokenStatusChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
