//! Port traits — the hexagonal boundary between domain logic and the
//! outside world.
//!
//! Driven adapters (MQTT client, NVS, LED) implement these traits. The
//! domain core consumes them via generics, so it never touches hardware
//! directly and every piece is testable with mock adapters.

use crate::app::records::{StatusRecord, TelemetryRecord};
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Telemetry port (domain → transport)
// ───────────────────────────────────────────────────────────────

/// Outbound delivery boundary. Fire-and-forget: the core never retries a
/// failed publish; the caller logs the error and moves on to the next tick.
pub trait TelemetryPort {
    /// Publish a telemetry record on the data channel.
    fn publish_telemetry(&mut self, record: &TelemetryRecord) -> Result<(), CommsError>;

    /// Publish a status record on the status channel (retained).
    fn publish_status(&mut self, record: &StatusRecord) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → side indicator)
// ───────────────────────────────────────────────────────────────

/// Binary "flow active" side-indicator (an LED on the reference board).
pub trait IndicatorPort {
    fn set_flow_active(&mut self, active: bool);
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Keys are namespaced to prevent collisions between subsystems. Write
/// operations MUST be atomic — no partial writes on power loss. The
/// ESP-IDF NVS API guarantees this natively; the in-memory simulation
/// achieves it trivially.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
