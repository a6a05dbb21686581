//! Aquameter firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  WifiAdapter      MqttAdapter       NvsAdapter           │
//! │  (STA uplink)     (TelemetryPort)   (StoragePort)        │
//! │                                                          │
//! │  ────────────── Port Trait Boundary ──────────────       │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │           Sampler / ConfigStore (pure)         │      │
//! │  │  pulse drain · flow math · config apply        │      │
//! │  └────────────────────────────────────────────────┘      │
//! │                                                          │
//! │  PulseCounter (ISR) · FlowLed · Watchdog                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;

use aquameter::adapters::mqtt::{HEARTBEAT_PERIOD_SECS, MqttAdapter};
use aquameter::adapters::nvs::NvsAdapter;
use aquameter::adapters::wifi::WifiAdapter;
use aquameter::app::ports::TelemetryPort;
use aquameter::app::records::StatusRecord;
use aquameter::app::remote::RemoteConfigHandler;
use aquameter::app::sampler::Sampler;
use aquameter::app::store::ConfigStore;
use aquameter::drivers::flow_led::FlowLed;
use aquameter::drivers::hw_init;
use aquameter::drivers::watchdog::Watchdog;
use aquameter::sensors::pulse::FLOW_PULSES;

// Build-time credentials; override via environment when flashing.
const WIFI_SSID: &str = match option_env!("AQUAMETER_WIFI_SSID") {
    Some(s) => s,
    None => "aquameter-net",
};
const WIFI_PASSWORD: &str = match option_env!("AQUAMETER_WIFI_PASSWORD") {
    Some(s) => s,
    None => "changeme123",
};
const MQTT_BROKER_URL: &str = match option_env!("AQUAMETER_MQTT_URL") {
    Some(s) => s,
    None => "mqtt://192.168.1.10:1883",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Aquameter v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Hardware bring-up ──────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without the sensor pin there is nothing to measure — halt and
        // let the watchdog reset.
        error!("HAL init failed: {e} — halting");
        #[allow(clippy::empty_loop)]
        loop {}
    }
    hw_init::init_isr_service()
        .map_err(|e| anyhow!("ISR service init failed: {e}"))?;
    let watchdog = Watchdog::new();

    // ── 3. Persistent config ──────────────────────────────────
    // NVS must come up before anything reads calibration; a flash that
    // cannot initialise is a startup failure, not a silent default.
    let nvs = NvsAdapter::new().context("NVS bring-up failed")?;
    let store = Arc::new(ConfigStore::load(&nvs));

    // ── 4. Network uplink ─────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take().context("system event loop unavailable")?;

    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop)
        .map_err(|e| anyhow!("WiFi driver: {e}"))?;
    wifi.set_credentials(WIFI_SSID, WIFI_PASSWORD)
        .map_err(|e| anyhow!("WiFi credentials: {e}"))?;
    wifi.connect().map_err(|e| anyhow!("WiFi connect: {e}"))?;

    // The remote-config handler owns the NVS handle: persistence happens
    // from the inbound-message context only.
    let mut remote = RemoteConfigHandler::new(Arc::clone(&store), nvs);
    let mut mqtt = MqttAdapter::connect(MQTT_BROKER_URL, move |raw| {
        let _ = remote.handle(raw);
    })
    .map_err(|e| anyhow!("MQTT connect: {e}"))?;

    // ── 5. Sampling loop ──────────────────────────────────────
    let mut led = FlowLed::new();
    let mut sampler = Sampler::new(&FLOW_PULSES, Arc::clone(&store));
    let mut heartbeat_secs: u32 = 0;

    info!(
        "System ready (factor={}, interval={}s). Entering sampling loop.",
        store.current().calibration_factor,
        store.current().interval_seconds
    );

    loop {
        FreeRtos::delay_ms(1000);
        watchdog.feed();
        wifi.poll();

        heartbeat_secs += 1;
        if heartbeat_secs >= HEARTBEAT_PERIOD_SECS {
            heartbeat_secs = 0;
            if let Err(e) = mqtt.publish_status(&StatusRecord::ONLINE) {
                warn!("Heartbeat publish failed ({e})");
            }
        }

        sampler.on_second_elapsed(&mut mqtt, &mut led);
    }
}
