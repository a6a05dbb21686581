//! Periodic sampling pipeline: pulse count → flow rate → telemetry.
//!
//! The [`Sampler`] is driven at 1 Hz by the main loop and fires one
//! sampling tick every `interval_seconds`. The interval is latched at the
//! tick boundary, so a remote configuration change landing mid-cycle takes
//! effect on the *next* tick and the elapsed-seconds used for the flow
//! math always equals the interval that was actually waited.

use std::sync::Arc;

use log::{info, warn};

use crate::app::ports::{IndicatorPort, TelemetryPort};
use crate::app::records::TelemetryRecord;
use crate::app::store::ConfigStore;
use crate::sensors::pulse::PulseCounter;

// ───────────────────────────────────────────────────────────────
// Flow computation
// ───────────────────────────────────────────────────────────────

/// Result of converting one tick's pulse count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSample {
    /// Instantaneous flow rate, litres per minute.
    pub flow_rate_lpm: f64,
    /// Volume that passed during the tick, litres.
    pub incremental_liters: f64,
}

/// Convert a pulse count into a flow sample.
///
/// Pure. `elapsed_seconds` and `calibration_factor` are guaranteed
/// positive by the config invariant, so no division by zero is possible.
pub fn compute(pulses: u32, elapsed_seconds: u32, calibration_factor: f64) -> FlowSample {
    let flow_rate_lpm = f64::from(pulses) / (calibration_factor * f64::from(elapsed_seconds));
    let incremental_liters = flow_rate_lpm / 60.0 * f64::from(elapsed_seconds);
    FlowSample {
        flow_rate_lpm,
        incremental_liters,
    }
}

// ───────────────────────────────────────────────────────────────
// Sampling scheduler
// ───────────────────────────────────────────────────────────────

/// Drives the fixed-period sampling loop and owns the accumulated volume.
///
/// Accumulated volume is volatile by design: it resets to zero on restart.
pub struct Sampler<'c> {
    counter: &'c PulseCounter,
    store: Arc<ConfigStore>,
    total_liters: f64,
    flowing: bool,
    /// Interval latched at the last tick boundary; governs both the wait
    /// and the elapsed-time math of the cycle in progress.
    cycle_interval: u32,
    seconds_in_cycle: u32,
}

impl<'c> Sampler<'c> {
    pub fn new(counter: &'c PulseCounter, store: Arc<ConfigStore>) -> Self {
        let cycle_interval = store.current().interval_seconds;
        Self {
            counter,
            store,
            total_liters: 0.0,
            flowing: false,
            cycle_interval,
            seconds_in_cycle: 0,
        }
    }

    /// Advance the scheduler by one second of wall time. Returns the
    /// telemetry record when this second completed a sampling cycle.
    pub fn on_second_elapsed(
        &mut self,
        publisher: &mut impl TelemetryPort,
        indicator: &mut impl IndicatorPort,
    ) -> Option<TelemetryRecord> {
        self.seconds_in_cycle += 1;
        if self.seconds_in_cycle < self.cycle_interval {
            return None;
        }

        let record = self.sample_tick(publisher, indicator);

        // Tick boundary: re-latch the interval so a remote change becomes
        // effective for the next cycle.
        self.seconds_in_cycle = 0;
        self.cycle_interval = self.store.current().interval_seconds;

        Some(record)
    }

    /// One sampling tick: drain → compute → accumulate → indicate → emit.
    fn sample_tick(
        &mut self,
        publisher: &mut impl TelemetryPort,
        indicator: &mut impl IndicatorPort,
    ) -> TelemetryRecord {
        let pulses = self.counter.drain();
        let config = self.store.current();
        let sample = compute(pulses, self.cycle_interval, config.calibration_factor);

        self.total_liters += sample.incremental_liters;

        let was_flowing = self.flowing;
        self.flowing = sample.flow_rate_lpm > 0.0;
        if self.flowing && !was_flowing {
            info!("Flow started");
        }
        if !self.flowing && was_flowing {
            info!("Flow stopped");
        }
        indicator.set_flow_active(self.flowing);

        let record = TelemetryRecord {
            flow_rate_lpm: sample.flow_rate_lpm,
            total_liters: self.total_liters,
        };

        // Fire-and-forget: a failed publish is dropped for this tick and
        // the next tick proceeds independently.
        if let Err(e) = publisher.publish_telemetry(&record) {
            warn!("Sampler: telemetry publish failed ({e}), dropped");
        }

        info!(
            "Flow: {:.2} L/min ({} pulses) | total {:.2} L",
            sample.flow_rate_lpm, pulses, self.total_liters
        );
        record
    }

    /// Accumulated volume since process start, litres.
    pub fn total_liters(&self) -> f64 {
        self.total_liters
    }

    /// Whether the last tick observed a non-zero flow rate.
    pub fn flow_active(&self) -> bool {
        self.flowing
    }
}
