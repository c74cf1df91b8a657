//! AquaSense Firmware: Main Entry Point
//!
//! Single cooperative loop plus one GPIO interrupt (flow pulses).
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub        WifiAdapter        RtdbClient   LogEventSink │
//! │  (SensorPort)     (Connectivity)     (Database)   (EventSink)  │
//! │   ├ WaterLevel     BlockingWifi       EspHttpClient            │
//! │   ├ Flow ◀─ ISR                       TokenManager             │
//! │   └ DS18B20 ◀─ OneWire                                         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        MonitorService (pure logic)                     │    │
//! │  │  sample timer · publish timer · latest readings        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{error, info};

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use aquasense::adapters::http_client::EspHttpClient;
use aquasense::adapters::log_sink::LogEventSink;
use aquasense::adapters::time::MonotonicClock;
use aquasense::adapters::wifi::WifiAdapter;
use aquasense::app::service::MonitorService;
use aquasense::config::{Credentials, SystemConfig};
use aquasense::drivers::hw_init::{self, HwInitError};
use aquasense::drivers::one_wire::OneWire;
use aquasense::drivers::watchdog::Watchdog;
use aquasense::error::Error;
use aquasense::pins;
use aquasense::rtdb::{RtdbClient, SignInAccount};
use aquasense::sensors::temperature::Ds18b20;
use aquasense::sensors::SensorHub;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AquaSense v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration and credentials ──────────────────────
    let config = SystemConfig::default();
    config.validate().map_err(Error::from)?;
    let creds = Credentials::from_build_env();
    if let Err(e) = creds.validate() {
        error!("Credentials incomplete: {e} (set it in .env and rebuild)");
        return Err(Error::from(e).into());
    }
    info!("Config: {config:?}");

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {e}");
        return Err(Error::from(e).into());
    }
    hw_init::init_isr_service().map_err(Error::from)?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Slots are timed with the ROM busy-wait; the 750 ms conversion yields.
    let one_wire_pin = PinDriver::input_output_od(peripherals.pins.gpio23)?;
    let bus = OneWire::new(one_wire_pin, Ets).map_err(|_| Error::Init(HwInitError::OneWirePinFailed))?;
    info!("1-Wire bus on GPIO{}", pins::ONE_WIRE_GPIO);
    let probe = Ds18b20::new(bus, FreeRtos, config.ds18b20_conversion_ms);
    let mut sensors = SensorHub::from_config(&config, probe);

    // ── 4. Wi-Fi ──────────────────────────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?, &config);
    wifi.set_credentials(creds.wifi_ssid, creds.wifi_password)
        .map_err(Error::from)?;

    // ── 5. Database ───────────────────────────────────────────
    let account = SignInAccount {
        api_key: creds.api_key,
        email: creds.user_email,
        password: creds.user_password,
    };
    let mut db = RtdbClient::new(
        EspHttpClient::new(config.http_timeout_ms),
        creds.database_url,
        account,
        config.token_refresh_margin_secs,
    );

    // ── 6. Monitor loop ───────────────────────────────────────
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let idle = Duration::from_millis(u64::from(config.loop_idle_ms));

    let mut service = MonitorService::new(config);
    service.start(&mut sink);
    service.ensure_connected(&mut wifi, &mut sink);
    watchdog.feed();

    info!("System ready. Entering monitor loop.");
    loop {
        service.poll(clock.uptime_ms(), &mut sensors, &mut wifi, &mut db, &mut sink);
        watchdog.feed();
        std::thread::sleep(idle);
    }
}
