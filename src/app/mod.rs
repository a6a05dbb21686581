//! Application core — pure domain logic behind port traits.
//!
//! ```text
//!   ISR ──▶ PulseCounter ──▶ Sampler ──▶ TelemetryPort / IndicatorPort
//!                               │
//!                          ConfigStore ◀── RemoteConfigHandler ◀── inbound bytes
//!                               │
//!                          StoragePort (NVS)
//! ```
//!
//! Nothing in this module touches hardware directly; adapters implement the
//! traits in [`ports`] and are injected at call sites.

pub mod ports;
pub mod records;
pub mod remote;
pub mod sampler;
pub mod store;
