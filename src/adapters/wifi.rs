//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]: the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! None inside the adapter. Each [`connect`](ConnectivityPort::connect) is a
//! single attempt bounded by the connect timeout; the monitor loop calls it
//! again on every pass that finds the link down.

use core::net::Ipv4Addr;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort};
use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_AP_IN_RANGE: AtomicBool = AtomicBool::new(true);
#[cfg(not(target_os = "espidf"))]
static SIM_LINK_DROPPED: AtomicBool = AtomicBool::new(false);

/// Whether the simulated access point answers association requests.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ap_in_range(in_range: bool) {
    SIM_AP_IN_RANGE.store(in_range, Ordering::Relaxed);
}

/// Drop an established simulated link (as if the AP went away).
#[cfg(not(target_os = "espidf"))]
pub fn sim_drop_link() {
    SIM_LINK_DROPPED.store(true, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
const SIM_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 2);

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    connect_timeout: Duration,
    poll_interval: Duration,
    ip: Option<Ipv4Addr>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(target_os = "espidf")]
    configured: bool,
    /// Simulation: link state and attempt count.
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>, config: &SystemConfig) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            connect_timeout: Duration::from_millis(u64::from(config.wifi_connect_timeout_ms)),
            poll_interval: Duration::from_millis(u64::from(config.wifi_poll_interval_ms)),
            ip: None,
            wifi,
            configured: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            connect_timeout: Duration::from_millis(u64::from(config.wifi_connect_timeout_ms)),
            poll_interval: Duration::from_millis(u64::from(config.wifi_poll_interval_ms)),
            ip: None,
            sim_connected: false,
            sim_attempts: 0,
        }
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Address obtained by the last successful connect.
    pub fn ip(&self) -> Option<Ipv4Addr> {
        self.ip
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|e| ConnectivityError::Driver(e.code()))?;
        self.wifi.start().map_err(|e| ConnectivityError::Driver(e.code()))?;
        info!("WiFi(espidf): station started");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<Ipv4Addr, ConnectivityError> {
        if !self.configured {
            self.platform_configure()?;
            self.configured = true;
        }

        // Non-blocking request; association is polled below so the attempt
        // stays bounded by our own timeout.
        if let Err(e) = self.wifi.wifi_mut().connect() {
            warn!("WiFi(espidf): connect request returned {e}");
        }

        let started = std::time::Instant::now();
        while !self.wifi.is_connected().unwrap_or(false) {
            if started.elapsed() >= self.connect_timeout {
                if let Err(e) = self.wifi.wifi_mut().disconnect() {
                    warn!("WiFi(espidf): abort after timeout returned {e}");
                }
                return Err(ConnectivityError::Timeout);
            }
            std::thread::sleep(self.poll_interval);
        }

        self.wifi
            .wait_netif_up()
            .map_err(|e| ConnectivityError::Driver(e.code()))?;
        let ip_info = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(|e| ConnectivityError::Driver(e.code()))?;
        Ok(ip_info.ip)
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<Ipv4Addr, ConnectivityError> {
        self.sim_attempts = self.sim_attempts.wrapping_add(1);
        if !SIM_AP_IN_RANGE.load(Ordering::Relaxed) {
            // Do not actually wait out the timeout on the host.
            let polls = self.connect_timeout.as_millis() / self.poll_interval.as_millis().max(1);
            warn!("WiFi(sim): no AP after {polls} polls (attempt {})", self.sim_attempts);
            return Err(ConnectivityError::Timeout);
        }
        SIM_LINK_DROPPED.store(false, Ordering::Relaxed);
        self.sim_connected = true;
        Ok(SIM_IP)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected && !SIM_LINK_DROPPED.load(Ordering::Relaxed)
    }

    /// Number of connect attempts made (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim_attempts
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<Ipv4Addr, ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(ip) => {
                self.ip = Some(ip);
                info!("WiFi: connected, IP {ip}");
                Ok(ip)
            }
            Err(e) => {
                self.ip = None;
                warn!("WiFi: connection failed: {e}");
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
