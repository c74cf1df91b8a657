//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to               |
//! |---------------|--------------------|---------------------------|
//! | `http_client` | HttpClient         | ESP-IDF HTTPS client      |
//! | `log_sink`    | EventSink          | Serial log output         |
//! | `time`        | (clock)            | ESP32 system timer        |
//! | `wifi`        | ConnectivityPort   | ESP-IDF WiFi STA          |
//!
//! The sensor port is implemented by [`SensorHub`](crate::sensors::SensorHub)
//! and the database port by [`RtdbClient`](crate::rtdb::RtdbClient).

#[cfg(target_os = "espidf")]
pub mod http_client;
pub mod log_sink;
pub mod time;
pub mod wifi;
