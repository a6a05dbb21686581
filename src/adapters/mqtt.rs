//! MQTT transport adapter.
//!
//! Implements [`TelemetryPort`] over the ESP-IDF MQTT client and delivers
//! inbound `config/set` payloads to a caller-supplied handler, which runs
//! in the client's event-callback context (concurrent with the sampler).
//!
//! Host builds get a simulation backend that records publishes and exposes
//! an inject hook for the inbound path, so the whole boundary is testable
//! without a broker.
//!
//! Delivery semantics: telemetry is fire-and-forget at QoS 1; the status
//! record is retained so late subscribers see the last announcement. The
//! `offline` status is registered as the broker's Last-Will at connect
//! time and never actively sent by the firmware.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::app::ports::TelemetryPort;
use crate::app::records::{StatusRecord, TelemetryRecord};
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};

/// Outbound telemetry channel.
pub const TOPIC_DATA: &str = "aquameter/data";
/// Outbound status channel (retained).
pub const TOPIC_STATUS: &str = "aquameter/status";
/// Inbound configuration update channel.
pub const TOPIC_CONFIG_SET: &str = "aquameter/config/set";

/// Online heartbeat period, independent of the sampling interval.
pub const HEARTBEAT_PERIOD_SECS: u32 = 15;

pub struct MqttAdapter {
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    published: Vec<(String, Vec<u8>)>,
    #[cfg(not(target_os = "espidf"))]
    on_config: Box<dyn FnMut(&[u8]) + Send>,
}

impl MqttAdapter {
    /// Connect to the broker, register the Last-Will, subscribe to the
    /// config channel, and announce `online`.
    ///
    /// `on_config` receives every raw payload arriving on
    /// [`TOPIC_CONFIG_SET`]; it runs in the MQTT event-callback context.
    pub fn connect(
        broker_url: &str,
        on_config: impl FnMut(&[u8]) + Send + 'static,
    ) -> Result<Self, CommsError> {
        let connected = Arc::new(AtomicBool::new(false));

        #[cfg(target_os = "espidf")]
        {
            let mut on_config = on_config;
            let conf = MqttClientConfiguration {
                client_id: Some("aquameter"),
                lwt: Some(LwtConfiguration {
                    topic: TOPIC_STATUS,
                    payload: br#"{"status":"offline"}"#,
                    qos: QoS::AtLeastOnce,
                    retain: true,
                }),
                ..Default::default()
            };

            let connected_cb = Arc::clone(&connected);
            let mut client = EspMqttClient::new(broker_url, &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        info!("MQTT: connected to broker");
                        connected_cb.store(true, Ordering::Release);
                    }
                    EventPayload::Disconnected => {
                        log::warn!("MQTT: disconnected from broker");
                        connected_cb.store(false, Ordering::Release);
                    }
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        ..
                    } if topic == TOPIC_CONFIG_SET => {
                        on_config(data);
                    }
                    _ => {}
                }
            })
            .map_err(|_| CommsError::MqttConnectFailed)?;

            client
                .subscribe(TOPIC_CONFIG_SET, QoS::AtLeastOnce)
                .map_err(|_| CommsError::MqttSubscribeFailed)?;
            info!("MQTT: subscribed to {TOPIC_CONFIG_SET}");

            let mut adapter = Self { connected, client };
            // The connection races the first publish; a missed online
            // announcement is recovered by the heartbeat.
            let _ = adapter.publish_status(&StatusRecord::ONLINE);
            Ok(adapter)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("MQTT(sim): connected to '{broker_url}'");
            connected.store(true, Ordering::Release);
            let mut adapter = Self {
                connected,
                published: Vec::new(),
                on_config: Box::new(on_config),
            };
            adapter.publish_status(&StatusRecord::ONLINE)?;
            Ok(adapter)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::NotConnected);
        }

        #[cfg(target_os = "espidf")]
        {
            self.client
                .enqueue(topic, QoS::AtLeastOnce, retain, payload)
                .map(|_| ())
                .map_err(|_| CommsError::MqttPublishFailed)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = retain;
            self.published.push((topic.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    // ── Simulation hooks (host tests) ─────────────────────────

    /// Deliver a payload as if it arrived on the config channel.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject_config(&mut self, payload: &[u8]) {
        (self.on_config)(payload);
    }

    /// Everything published so far, in order.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.published
    }

    /// Simulate a broker disconnect.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_connected(&mut self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

impl TelemetryPort for MqttAdapter {
    fn publish_telemetry(&mut self, record: &TelemetryRecord) -> Result<(), CommsError> {
        let payload = serde_json::to_vec(record).map_err(|_| CommsError::MqttPublishFailed)?;
        self.publish(TOPIC_DATA, &payload, false)
    }

    fn publish_status(&mut self, record: &StatusRecord) -> Result<(), CommsError> {
        let payload = serde_json::to_vec(record).map_err(|_| CommsError::MqttPublishFailed)?;
        self.publish(TOPIC_STATUS, &payload, true)
    }
}
