//! Remote configuration update handling.
//!
//! Raw bytes arrive from the transport's inbound-message context (the MQTT
//! client callback), concurrent with the sampling task. The handler parses
//! the JSON payload and forwards the extracted partial update through
//! [`ConfigStore::apply`] — it never mutates config fields directly, and a
//! malformed payload is discarded whole with zero state change.
//!
//! The handler owns the storage handle: NVS is written from this context
//! only, so no synchronization of the storage itself is needed.

use std::sync::Arc;

use log::{error, info};

use crate::config::ConfigUpdate;
use crate::app::ports::StoragePort;
use crate::app::store::ConfigStore;

/// Malformed inbound payload.
#[derive(Debug)]
pub enum ParseError {
    Json(serde_json::Error),
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed config payload: {e}"),
        }
    }
}

pub struct RemoteConfigHandler<S: StoragePort> {
    store: Arc<ConfigStore>,
    storage: S,
}

impl<S: StoragePort> RemoteConfigHandler<S> {
    pub fn new(store: Arc<ConfigStore>, storage: S) -> Self {
        Self { store, storage }
    }

    /// Parse one inbound payload and apply it.
    ///
    /// Returns the extracted update on success. Unknown JSON keys are
    /// ignored; an unparsable payload yields `Err` and is observable only
    /// as a logged error — it must never partially apply.
    pub fn handle(&mut self, raw: &[u8]) -> Result<ConfigUpdate, ParseError> {
        let update: ConfigUpdate = serde_json::from_slice(raw).map_err(|e| {
            error!("RemoteConfig: discarding payload: {e}");
            ParseError::Json(e)
        })?;

        if update.is_empty() {
            info!("RemoteConfig: update carried no recognized fields");
            return Ok(update);
        }

        self.store.apply(&update, &mut self.storage);
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::nvs::NvsAdapter;
    use crate::config::FlowConfig;
    use crate::app::store::{CONFIG_NAMESPACE, KEY_CALIBRATION, KEY_INTERVAL};

    fn handler() -> (Arc<ConfigStore>, RemoteConfigHandler<NvsAdapter>) {
        let store = Arc::new(ConfigStore::with_config(FlowConfig::default()));
        let h = RemoteConfigHandler::new(Arc::clone(&store), NvsAdapter::new().unwrap());
        (store, h)
    }

    #[test]
    fn applies_full_update() {
        let (store, mut h) = handler();
        let update = h
            .handle(br#"{"calibration_factor": 6.0, "interval_seconds": 5}"#)
            .unwrap();
        assert_eq!(update.calibration_factor, Some(6.0));
        let cfg = store.current();
        assert_eq!(cfg.calibration_factor, 6.0);
        assert_eq!(cfg.interval_seconds, 5);
    }

    #[test]
    fn applies_partial_update() {
        let (store, mut h) = handler();
        h.handle(br#"{"interval_seconds": 5}"#).unwrap();
        let cfg = store.current();
        assert_eq!(cfg.calibration_factor, 7.5);
        assert_eq!(cfg.interval_seconds, 5);
    }

    #[test]
    fn ignores_unknown_keys() {
        let (store, mut h) = handler();
        h.handle(br#"{"interval_seconds": 3, "qos": 2}"#).unwrap();
        assert_eq!(store.current().interval_seconds, 3);
    }

    #[test]
    fn empty_object_is_accepted_noop() {
        let (store, mut h) = handler();
        let before = store.current();
        let update = h.handle(b"{}").unwrap();
        assert!(update.is_empty());
        assert_eq!(store.current(), before);
    }

    #[test]
    fn malformed_payload_leaves_all_state_untouched() {
        let store = Arc::new(ConfigStore::with_config(FlowConfig::default()));
        let mut h = RemoteConfigHandler::new(Arc::clone(&store), NvsAdapter::new().unwrap());
        let before = store.current();

        for bad in [
            &b"not json"[..],
            br#"{"interval_seconds": "five"}"#,
            br#"{"calibration_factor": }"#,
            br#"{"interval_seconds": 2.5}"#,
            b"",
        ] {
            assert!(h.handle(bad).is_err(), "payload {bad:?} must be rejected");
        }

        assert_eq!(store.current(), before);
        // Nothing was ever persisted either.
        assert!(!h.storage.exists(CONFIG_NAMESPACE, KEY_CALIBRATION));
        assert!(!h.storage.exists(CONFIG_NAMESPACE, KEY_INTERVAL));
    }
}
