//! Flow-meter configuration parameters.
//!
//! Two tunables: the sensor's pulses-per-litre calibration factor and the
//! sampling interval. Both can be overridden remotely over MQTT and are
//! persisted to NVS on every accepted change.

use serde::{Deserialize, Serialize};

/// Default calibration factor for the YF-S201 (datasheet: frequency in Hz
/// = 7.5 × flow rate in L/min).
pub const DEFAULT_CALIBRATION_FACTOR: f64 = 7.5;

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECONDS: u32 = 1;

/// Active flow-meter configuration.
///
/// Invariant: both fields are strictly positive (and the factor finite).
/// Every path that constructs or mutates a config goes through
/// [`FlowConfig::sanitized`], so readers never observe an invalid value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Sensor calibration factor (pulses per second per L/min).
    pub calibration_factor: f64,
    /// Sampling interval in seconds.
    pub interval_seconds: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            calibration_factor: DEFAULT_CALIBRATION_FACTOR,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
        }
    }
}

impl FlowConfig {
    /// Enforce the positivity invariant field-by-field, replacing invalid
    /// values with the compiled-in defaults. Pure — substitutions are
    /// logged by the caller, which knows where the candidate came from.
    pub fn sanitized(self) -> Self {
        let calibration_factor = if self.calibration_factor.is_finite() && self.calibration_factor > 0.0
        {
            self.calibration_factor
        } else {
            DEFAULT_CALIBRATION_FACTOR
        };
        let interval_seconds = if self.interval_seconds > 0 {
            self.interval_seconds
        } else {
            DEFAULT_INTERVAL_SECONDS
        };
        Self {
            calibration_factor,
            interval_seconds,
        }
    }

    /// Merge the present fields of `update` over this config. Absent fields
    /// keep their current value. The result is not yet sanitized.
    pub fn merged(self, update: &ConfigUpdate) -> Self {
        Self {
            calibration_factor: update.calibration_factor.unwrap_or(self.calibration_factor),
            interval_seconds: update.interval_seconds.unwrap_or(self.interval_seconds),
        }
    }
}

/// Partially-populated remote configuration update.
///
/// Deserialized from the JSON body on the `config/set` topic. Unknown keys
/// are ignored; a payload that fails to parse is discarded as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub calibration_factor: Option<f64>,
    #[serde(default)]
    pub interval_seconds: Option<u32>,
}

impl ConfigUpdate {
    /// True if no recognized field is present (an accepted no-op).
    pub fn is_empty(&self) -> bool {
        self.calibration_factor.is_none() && self.interval_seconds.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = FlowConfig::default();
        assert!(c.calibration_factor > 0.0);
        assert!(c.interval_seconds > 0);
        assert_eq!(c, c.sanitized());
    }

    #[test]
    fn sanitize_coerces_nonpositive_factor() {
        for bad in [0.0, -7.5, f64::NAN, f64::NEG_INFINITY, f64::INFINITY] {
            let c = FlowConfig {
                calibration_factor: bad,
                interval_seconds: 4,
            }
            .sanitized();
            assert_eq!(c.calibration_factor, DEFAULT_CALIBRATION_FACTOR);
            assert_eq!(c.interval_seconds, 4, "valid field must be untouched");
        }
    }

    #[test]
    fn sanitize_coerces_zero_interval() {
        let c = FlowConfig {
            calibration_factor: 5.5,
            interval_seconds: 0,
        }
        .sanitized();
        assert_eq!(c.interval_seconds, DEFAULT_INTERVAL_SECONDS);
        assert_eq!(c.calibration_factor, 5.5);
    }

    #[test]
    fn merge_applies_only_present_fields() {
        let base = FlowConfig::default();
        let merged = base.merged(&ConfigUpdate {
            calibration_factor: None,
            interval_seconds: Some(5),
        });
        assert_eq!(merged.calibration_factor, DEFAULT_CALIBRATION_FACTOR);
        assert_eq!(merged.interval_seconds, 5);

        let unchanged = base.merged(&ConfigUpdate::default());
        assert_eq!(unchanged, base);
    }

    #[test]
    fn update_json_ignores_unknown_keys() {
        let u: ConfigUpdate =
            serde_json::from_str(r#"{"interval_seconds": 5, "firmware": "1.2.3"}"#).unwrap();
        assert_eq!(u.interval_seconds, Some(5));
        assert_eq!(u.calibration_factor, None);
    }
}
