//! GPIO pin assignments for the Aquameter board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

/// YF-S201 hall-effect flow sensor — open-collector pulse output,
/// interrupt-driven on the rising edge. Requires the internal pull-up.
pub const FLOW_PULSE_GPIO: i32 = 13;

/// Flow indicator LED (on-board LED on most devkits). Driven HIGH while
/// flow is detected.
pub const FLOW_LED_GPIO: i32 = 2;
