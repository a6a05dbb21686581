//! Property and fuzz-style tests for robustness of the core data paths.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use aquameter::app::sampler::compute;
use aquameter::config::{ConfigUpdate, FlowConfig};
use aquameter::sensors::pulse::PulseCounter;
use proptest::prelude::*;

// ── Pulse accounting ──────────────────────────────────────────

proptest! {
    /// Interleaving edges and drains must never lose or duplicate a pulse:
    /// the drained totals plus the residual always equal the edges recorded.
    #[test]
    fn drain_preserves_every_pulse(
        batches in proptest::collection::vec(0u32..=500u32, 1..=32),
    ) {
        let counter = PulseCounter::new();
        let mut recorded: u64 = 0;
        let mut drained: u64 = 0;

        for (i, &batch) in batches.iter().enumerate() {
            for _ in 0..batch {
                counter.record_edge();
            }
            recorded += u64::from(batch);
            // Drain after every other batch to interleave.
            if i % 2 == 0 {
                drained += u64::from(counter.drain());
            }
        }
        drained += u64::from(counter.drain());

        prop_assert_eq!(drained, recorded);
        prop_assert_eq!(counter.drain(), 0);
    }
}

// ── Flow math ─────────────────────────────────────────────────

proptest! {
    /// For any in-range inputs the computed sample is finite, non-negative,
    /// and volume is consistent with rate over the elapsed window.
    #[test]
    fn compute_is_finite_and_consistent(
        pulses in 0u32..=1_000_000u32,
        elapsed in 1u32..=3600u32,
        factor in 0.1f64..=1000.0f64,
    ) {
        let s = compute(pulses, elapsed, factor);

        prop_assert!(s.flow_rate_lpm.is_finite());
        prop_assert!(s.flow_rate_lpm >= 0.0);
        prop_assert!(s.incremental_liters >= 0.0);

        let expected_liters = s.flow_rate_lpm / 60.0 * f64::from(elapsed);
        prop_assert!((s.incremental_liters - expected_liters).abs() < 1e-9);
    }

    /// Zero pulses always means zero flow, for any calibration and window.
    #[test]
    fn zero_pulses_is_always_zero_flow(
        elapsed in 1u32..=3600u32,
        factor in 0.1f64..=1000.0f64,
    ) {
        let s = compute(0, elapsed, factor);
        prop_assert_eq!(s.flow_rate_lpm, 0.0);
        prop_assert_eq!(s.incremental_liters, 0.0);
    }
}

// ── Config sanitization ───────────────────────────────────────

proptest! {
    /// Sanitization always yields a strictly-positive, finite config, no
    /// matter how hostile the raw values are.
    #[test]
    fn sanitized_config_is_always_valid(
        factor in proptest::num::f64::ANY,
        interval in proptest::num::u32::ANY,
    ) {
        let cfg = FlowConfig {
            calibration_factor: factor,
            interval_seconds: interval,
        }
        .sanitized();

        prop_assert!(cfg.calibration_factor.is_finite());
        prop_assert!(cfg.calibration_factor > 0.0);
        prop_assert!(cfg.interval_seconds > 0);
    }

    /// Merging an arbitrary partial update into a valid config and
    /// sanitizing keeps the config valid.
    #[test]
    fn merge_then_sanitize_keeps_validity(
        factor in proptest::option::of(proptest::num::f64::ANY),
        interval in proptest::option::of(proptest::num::u32::ANY),
    ) {
        let update = ConfigUpdate {
            calibration_factor: factor,
            interval_seconds: interval,
        };
        let cfg = FlowConfig::default().merged(&update).sanitized();

        prop_assert!(cfg.calibration_factor.is_finite());
        prop_assert!(cfg.calibration_factor > 0.0);
        prop_assert!(cfg.interval_seconds > 0);
    }
}

// ── Inbound payload fuzz ──────────────────────────────────────

proptest! {
    /// Arbitrary bytes fed to the update parser either parse into a
    /// well-formed partial update or fail cleanly — never panic.
    #[test]
    fn arbitrary_payloads_never_panic(
        raw in proptest::collection::vec(proptest::num::u8::ANY, 0..=256),
    ) {
        let _ = serde_json::from_slice::<ConfigUpdate>(&raw);
    }
}
