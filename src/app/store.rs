//! Validated, persisted configuration store.
//!
//! The two calibration parameters live behind a single `Mutex<FlowConfig>`
//! — never two independent cells — so the sampling context always observes
//! a consistent pair: either the fully-old or the fully-new config, never a
//! stale calibration factor next to a fresh interval.
//!
//! Writers (the inbound-message context) go through [`ConfigStore::apply`],
//! which persists the sanitized result to NVS *before* making it visible to
//! readers. A persistence failure is logged and the in-memory config stays
//! authoritative for the running session.

use std::sync::{Mutex, PoisonError};

use log::{info, warn};

use crate::config::{ConfigUpdate, FlowConfig};
use crate::app::ports::{StorageError, StoragePort};

/// NVS namespace holding the persisted parameters.
pub const CONFIG_NAMESPACE: &str = "aquameter";
/// Calibration factor entry: 8 bytes, f64 little-endian.
pub const KEY_CALIBRATION: &str = "cal_factor";
/// Sampling interval entry: 4 bytes, u32 little-endian.
pub const KEY_INTERVAL: &str = "interval_s";

/// The presently active configuration plus its persistence glue.
pub struct ConfigStore {
    active: Mutex<FlowConfig>,
}

impl ConfigStore {
    /// Load the persisted configuration, substituting the compiled-in
    /// default for each field that is independently absent or invalid.
    /// Never fails — a corrupt or empty NVS yields the default config.
    pub fn load(storage: &impl StoragePort) -> Self {
        let calibration_factor = match read_f64(storage, KEY_CALIBRATION) {
            Some(c) if c.is_finite() && c > 0.0 => c,
            Some(c) => {
                warn!("ConfigStore: persisted calibration factor {c} invalid, using default");
                FlowConfig::default().calibration_factor
            }
            None => {
                info!("ConfigStore: no persisted calibration factor, using default");
                FlowConfig::default().calibration_factor
            }
        };
        let interval_seconds = match read_u32(storage, KEY_INTERVAL) {
            Some(i) if i > 0 => i,
            Some(i) => {
                warn!("ConfigStore: persisted interval {i}s invalid, using default");
                FlowConfig::default().interval_seconds
            }
            None => {
                info!("ConfigStore: no persisted interval, using default");
                FlowConfig::default().interval_seconds
            }
        };

        let config = FlowConfig {
            calibration_factor,
            interval_seconds,
        };
        info!(
            "ConfigStore: active config factor={} interval={}s",
            config.calibration_factor, config.interval_seconds
        );
        Self {
            active: Mutex::new(config),
        }
    }

    /// Construct from an explicit config (tests, defaults-only startup).
    pub fn with_config(config: FlowConfig) -> Self {
        Self {
            active: Mutex::new(config.sanitized()),
        }
    }

    /// The presently active, already-sanitized configuration.
    pub fn current(&self) -> FlowConfig {
        *self.lock()
    }

    /// Merge `update` into the active config, sanitize, persist, and only
    /// then make the new values visible to readers. Returns the config that
    /// ended up active.
    pub fn apply(&self, update: &ConfigUpdate, storage: &mut impl StoragePort) -> FlowConfig {
        let merged = self.current().merged(update);
        let sanitized = merged.sanitized();
        if sanitized != merged {
            warn!("ConfigStore: update contained out-of-range fields, coerced to defaults");
        }

        if let Err(e) = persist(storage, &sanitized) {
            // In-memory config stays authoritative; NVS will be rewritten
            // on the next accepted update.
            warn!("ConfigStore: persist failed ({e}), continuing with in-memory config");
        }

        *self.lock() = sanitized;
        info!(
            "ConfigStore: applied update, factor={} interval={}s",
            sanitized.calibration_factor, sanitized.interval_seconds
        );
        sanitized
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlowConfig> {
        // A poisoned lock only means a panic elsewhere; the config itself
        // is always a valid sanitized value.
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write both entries. The first failure aborts the write; NVS commits are
/// per-key atomic so a partial write still leaves each entry well-formed.
fn persist(storage: &mut impl StoragePort, config: &FlowConfig) -> Result<(), StorageError> {
    storage.write(
        CONFIG_NAMESPACE,
        KEY_CALIBRATION,
        &config.calibration_factor.to_le_bytes(),
    )?;
    storage.write(
        CONFIG_NAMESPACE,
        KEY_INTERVAL,
        &config.interval_seconds.to_le_bytes(),
    )
}

fn read_f64(storage: &impl StoragePort, key: &str) -> Option<f64> {
    let mut buf = [0u8; 8];
    match storage.read(CONFIG_NAMESPACE, key, &mut buf) {
        Ok(8) => Some(f64::from_le_bytes(buf)),
        Ok(n) => {
            warn!("ConfigStore: entry '{key}' has unexpected size {n}");
            None
        }
        Err(StorageError::NotFound) => None,
        Err(e) => {
            warn!("ConfigStore: read of '{key}' failed: {e}");
            None
        }
    }
}

fn read_u32(storage: &impl StoragePort, key: &str) -> Option<u32> {
    let mut buf = [0u8; 4];
    match storage.read(CONFIG_NAMESPACE, key, &mut buf) {
        Ok(4) => Some(u32::from_le_bytes(buf)),
        Ok(n) => {
            warn!("ConfigStore: entry '{key}' has unexpected size {n}");
            None
        }
        Err(StorageError::NotFound) => None,
        Err(e) => {
            warn!("ConfigStore: read of '{key}' failed: {e}");
            None
        }
    }
}
