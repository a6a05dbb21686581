//! Flow indicator LED.
//!
//! Implements [`IndicatorPort`]: lit while water is moving, dark when the
//! last sample counted zero pulses. Driven from the sampling context only.

use log::debug;

use crate::app::ports::IndicatorPort;
use crate::drivers::hw_init;
use crate::pins;

pub struct FlowLed {
    lit: bool,
}

impl Default for FlowLed {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowLed {
    pub fn new() -> Self {
        hw_init::gpio_write(pins::FLOW_LED_GPIO, false);
        Self { lit: false }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl IndicatorPort for FlowLed {
    fn set_flow_active(&mut self, active: bool) {
        if active != self.lit {
            debug!("FlowLed: {}", if active { "on" } else { "off" });
        }
        self.lit = active;
        hw_init::gpio_write(pins::FLOW_LED_GPIO, active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_commanded_state() {
        let mut led = FlowLed::new();
        assert!(!led.is_lit());
        led.set_flow_active(true);
        assert!(led.is_lit());
        led.set_flow_active(false);
        assert!(!led.is_lit());
    }
}
