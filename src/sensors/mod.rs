//! Sensor subsystem.
//!
//! One sensor on this board: the hall-effect flow sensor, counted by the
//! interrupt-driven [`pulse::PulseCounter`].

pub mod pulse;
