//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter | Implements    | Connects to              |
//! |---------|---------------|--------------------------|
//! | `mqtt`  | TelemetryPort | ESP-IDF MQTT client      |
//! | `nvs`   | StoragePort   | NVS / in-memory store    |
//! | `wifi`  | —             | ESP-IDF WiFi STA         |
//!
//! Every adapter carries a host-side simulation backend behind
//! `cfg(not(target_os = "espidf"))` so the application core is testable
//! off-device.

pub mod mqtt;
pub mod nvs;
pub mod wifi;
