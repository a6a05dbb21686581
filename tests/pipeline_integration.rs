//! End-to-end pipeline tests on the host simulation backends.
//!
//! Wires the real `Sampler`, `ConfigStore`, `RemoteConfigHandler`,
//! `NvsAdapter`, and `MqttAdapter` (sim) together the way `main()` does,
//! and drives the loop by hand.

#![cfg(not(target_os = "espidf"))]

use std::sync::Arc;

use aquameter::adapters::mqtt::{MqttAdapter, TOPIC_DATA, TOPIC_STATUS};
use aquameter::adapters::nvs::NvsAdapter;
use aquameter::app::ports::IndicatorPort;
use aquameter::app::remote::RemoteConfigHandler;
use aquameter::app::sampler::Sampler;
use aquameter::app::store::ConfigStore;
use aquameter::sensors::pulse::PulseCounter;

struct NullLed;
impl IndicatorPort for NullLed {
    fn set_flow_active(&mut self, _active: bool) {}
}

fn telemetry_payloads(mqtt: &MqttAdapter) -> Vec<serde_json::Value> {
    mqtt.sim_published()
        .iter()
        .filter(|(topic, _)| topic == TOPIC_DATA)
        .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
        .collect()
}

#[test]
fn pulses_flow_through_to_broker() {
    static COUNTER: PulseCounter = PulseCounter::new();
    let nvs = NvsAdapter::new().unwrap();
    let store = Arc::new(ConfigStore::load(&nvs));
    let mut remote = RemoteConfigHandler::new(Arc::clone(&store), nvs);
    let mut mqtt = MqttAdapter::connect("mqtt://test", move |raw| {
        let _ = remote.handle(raw);
    })
    .unwrap();
    let mut led = NullLed;
    let mut sampler = Sampler::new(&COUNTER, Arc::clone(&store));

    // 75 pulses in 1 s at factor 7.5 → 10 L/min.
    for _ in 0..75 {
        COUNTER.record_edge();
    }
    sampler.on_second_elapsed(&mut mqtt, &mut led).unwrap();

    // Connect announces retained "online" before any data.
    assert_eq!(mqtt.sim_published()[0].0, TOPIC_STATUS);

    let data = telemetry_payloads(&mqtt);
    assert_eq!(data.len(), 1);
    assert!((data[0]["flow_rate_lpm"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert!((data[0]["total_liters"].as_f64().unwrap() - 10.0 / 60.0).abs() < 1e-9);
}

#[test]
fn remote_update_reshapes_the_next_tick() {
    static COUNTER: PulseCounter = PulseCounter::new();
    let nvs = NvsAdapter::new().unwrap();
    let store = Arc::new(ConfigStore::load(&nvs));
    let mut remote = RemoteConfigHandler::new(Arc::clone(&store), nvs);
    let mut mqtt = MqttAdapter::connect("mqtt://test", move |raw| {
        let _ = remote.handle(raw);
    })
    .unwrap();
    let mut led = NullLed;
    let mut sampler = Sampler::new(&COUNTER, Arc::clone(&store));

    for _ in 0..75 {
        COUNTER.record_edge();
    }
    sampler.on_second_elapsed(&mut mqtt, &mut led).unwrap();

    // A config update arrives over MQTT mid-run.
    mqtt.sim_inject_config(br#"{"calibration_factor": 15.0}"#);
    assert_eq!(store.current().calibration_factor, 15.0);

    for _ in 0..75 {
        COUNTER.record_edge();
    }
    sampler.on_second_elapsed(&mut mqtt, &mut led).unwrap();

    let data = telemetry_payloads(&mqtt);
    assert!((data[0]["flow_rate_lpm"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert!((data[1]["flow_rate_lpm"].as_f64().unwrap() - 5.0).abs() < 1e-9);
}

#[test]
fn malformed_remote_payload_changes_nothing_downstream() {
    static COUNTER: PulseCounter = PulseCounter::new();
    let nvs = NvsAdapter::new().unwrap();
    let store = Arc::new(ConfigStore::load(&nvs));
    let before = store.current();
    let mut remote = RemoteConfigHandler::new(Arc::clone(&store), nvs);
    let mut mqtt = MqttAdapter::connect("mqtt://test", move |raw| {
        let _ = remote.handle(raw);
    })
    .unwrap();

    mqtt.sim_inject_config(b"{ garbage");
    mqtt.sim_inject_config(br#"{"calibration_factor": "high"}"#);

    assert_eq!(store.current(), before);
}

#[test]
fn interval_update_slows_the_cadence() {
    static COUNTER: PulseCounter = PulseCounter::new();
    let nvs = NvsAdapter::new().unwrap();
    let store = Arc::new(ConfigStore::load(&nvs));
    let mut remote = RemoteConfigHandler::new(Arc::clone(&store), nvs);
    let mut mqtt = MqttAdapter::connect("mqtt://test", move |raw| {
        let _ = remote.handle(raw);
    })
    .unwrap();
    let mut led = NullLed;
    let mut sampler = Sampler::new(&COUNTER, Arc::clone(&store));

    // Default 1 s cadence, then switch to 3 s remotely.
    assert!(sampler.on_second_elapsed(&mut mqtt, &mut led).is_some());
    mqtt.sim_inject_config(br#"{"interval_seconds": 3}"#);

    // The cycle already in flight still runs at 1 s…
    assert!(sampler.on_second_elapsed(&mut mqtt, &mut led).is_some());

    // …then the 3 s cadence governs.
    assert!(sampler.on_second_elapsed(&mut mqtt, &mut led).is_none());
    assert!(sampler.on_second_elapsed(&mut mqtt, &mut led).is_none());
    assert!(sampler.on_second_elapsed(&mut mqtt, &mut led).is_some());
}
