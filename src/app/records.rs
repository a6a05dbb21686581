//! Outbound records emitted by the application core.
//!
//! The sampler emits these through the
//! [`TelemetryPort`](super::ports::TelemetryPort); the MQTT adapter decides
//! how they travel. Records are immutable once emitted.

use serde::Serialize;

/// One sampling tick's telemetry, published as JSON on the data channel:
/// `{"flow_rate_lpm": <real>, "total_liters": <real>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// Instantaneous flow rate over the tick, litres per minute.
    pub flow_rate_lpm: f64,
    /// Accumulated volume since process start, litres.
    pub total_liters: f64,
}

/// Device availability, published as JSON on the status channel:
/// `{"status": "online"}` / `{"status": "offline"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Offline,
}

impl StatusRecord {
    pub const ONLINE: Self = Self {
        status: Status::Online,
    };

    /// Registered once at startup as the broker's Last-Will announcement;
    /// never actively sent by the core.
    pub const OFFLINE: Self = Self {
        status: Status::Offline,
    };
}
