//! System configuration parameters
//!
//! All tunable parameters for the AquaSense monitor, plus the credentials
//! compiled in from the build environment (see `build.rs`).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of the database root path (e.g. `/test`).
pub const MAX_ROOT_LEN: usize = 32;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Sensor sampling interval (milliseconds)
    pub sample_interval_ms: u32,
    /// Database publish interval (milliseconds)
    pub publish_interval_ms: u32,
    /// Main loop idle sleep between iterations (milliseconds)
    pub loop_idle_ms: u32,

    // --- Water level ---
    /// Settling time after energising the probe, before the ADC read
    pub water_power_settle_ms: u32,
    /// Hold time after the ADC read, before de-energising the probe
    pub water_read_settle_ms: u32,
    /// Raw ADC counts per stored water-level unit (integer division)
    pub water_level_divisor: u16,

    // --- Flow ---
    /// Pulses per sampling interval that correspond to 1 L/min
    pub flow_pulses_per_lpm: f32,

    // --- Temperature ---
    /// Lower bound of the plausible band (exclusive, Celsius)
    pub temp_min_c: f32,
    /// Upper bound of the plausible band (exclusive, Celsius)
    pub temp_max_c: f32,
    /// DS18B20 12-bit conversion time (milliseconds)
    pub ds18b20_conversion_ms: u32,

    // --- Wi-Fi ---
    /// Upper bound on a single association attempt (milliseconds)
    pub wifi_connect_timeout_ms: u32,
    /// Link-state poll period while associating (milliseconds)
    pub wifi_poll_interval_ms: u32,

    // --- Database ---
    /// Key prefix under which the four values are written
    pub db_root: heapless::String<MAX_ROOT_LEN>,
    /// Refresh the id token this many seconds before it expires
    pub token_refresh_margin_secs: u32,
    /// Per-request HTTP timeout (milliseconds)
    pub http_timeout_ms: u32,

    // --- Supervision ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut db_root = heapless::String::new();
        // "/test" always fits in MAX_ROOT_LEN.
        let _ = db_root.push_str("/test");

        Self {
            // Timing
            sample_interval_ms: 1_000,   // 1 Hz
            publish_interval_ms: 10_000, // every 10 s
            loop_idle_ms: 10,

            // Water level
            water_power_settle_ms: 500,
            water_read_settle_ms: 50,
            water_level_divisor: 10,

            // Flow
            flow_pulses_per_lpm: 18.0,

            // Temperature
            temp_min_c: -50.0,
            temp_max_c: 125.0,
            ds18b20_conversion_ms: 750,

            // Wi-Fi
            wifi_connect_timeout_ms: 10_000,
            wifi_poll_interval_ms: 500,

            // Database
            db_root,
            token_refresh_margin_secs: 300,
            http_timeout_ms: 10_000,

            // Supervision
            watchdog_timeout_ms: 90_000,
        }
    }
}

/// Errors from [`SystemConfig::validate`] and [`Credentials::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// A build-time credential was not provided.
    MissingCredential(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::MissingCredential(var) => write!(f, "missing credential: {} not set at build time", var),
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sample_interval_ms must be > 0"));
        }
        if self.publish_interval_ms < self.sample_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "publish_interval_ms must be >= sample_interval_ms",
            ));
        }
        if self.water_level_divisor == 0 {
            return Err(ConfigError::ValidationFailed("water_level_divisor must be > 0"));
        }
        if !(self.flow_pulses_per_lpm > 0.0) {
            return Err(ConfigError::ValidationFailed("flow_pulses_per_lpm must be > 0"));
        }
        if self.temp_min_c >= self.temp_max_c {
            return Err(ConfigError::ValidationFailed("temp_min_c must be < temp_max_c"));
        }
        if self.wifi_poll_interval_ms == 0 || self.wifi_poll_interval_ms > self.wifi_connect_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "wifi_poll_interval_ms must be in 1..=wifi_connect_timeout_ms",
            ));
        }
        if !self.db_root.starts_with('/') || self.db_root.ends_with('/') {
            return Err(ConfigError::ValidationFailed(
                "db_root must start with '/' and not end with '/'",
            ));
        }
        // The loop stalls for at most one Wi-Fi attempt, one sample, one
        // token request and four HTTP writes; the watchdog must outlast that.
        let worst_case_ms = self.wifi_connect_timeout_ms
            + self.water_power_settle_ms
            + self.water_read_settle_ms
            + self.ds18b20_conversion_ms
            + 5 * self.http_timeout_ms;
        if self.watchdog_timeout_ms <= worst_case_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed the worst-case loop stall",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Network and database secrets, compiled in from the build environment.
#[derive(Clone, Copy)]
pub struct Credentials {
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    pub api_key: &'static str,
    pub database_url: &'static str,
    pub user_email: &'static str,
    pub user_password: &'static str,
}

impl Credentials {
    /// Credentials forwarded by `build.rs`. Unset variables become `""`.
    pub const fn from_build_env() -> Self {
        Self {
            wifi_ssid: unwrap_or_empty(option_env!("AQUASENSE_WIFI_SSID")),
            wifi_password: unwrap_or_empty(option_env!("AQUASENSE_WIFI_PASS")),
            api_key: unwrap_or_empty(option_env!("AQUASENSE_FIREBASE_API_KEY")),
            database_url: unwrap_or_empty(option_env!("AQUASENSE_FIREBASE_DB_URL")),
            user_email: unwrap_or_empty(option_env!("AQUASENSE_FIREBASE_EMAIL")),
            user_password: unwrap_or_empty(option_env!("AQUASENSE_FIREBASE_PASSWORD")),
        }
    }

    /// Reports the first required value that is empty. The Wi-Fi password
    /// may be empty (open network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (self.wifi_ssid, "AQUASENSE_WIFI_SSID"),
            (self.api_key, "AQUASENSE_FIREBASE_API_KEY"),
            (self.database_url, "AQUASENSE_FIREBASE_DB_URL"),
            (self.user_email, "AQUASENSE_FIREBASE_EMAIL"),
            (self.user_password, "AQUASENSE_FIREBASE_PASSWORD"),
        ];
        for (value, var) in required {
            if value.is_empty() {
                return Err(ConfigError::MissingCredential(var));
            }
        }
        if !self.database_url.starts_with("https://") {
            return Err(ConfigError::ValidationFailed("AQUASENSE_FIREBASE_DB_URL must be https://"));
        }
        Ok(())
    }
}

// Secrets stay out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("database_url", &self.database_url)
            .field("user_email", &self.user_email)
            .finish_non_exhaustive()
    }
}

const fn unwrap_or_empty(value: Option<&'static str>) -> &'static str {
    match value {
        Some(v) => v,
        None => "",
    }
}
