//! Hardware initialisation and peripheral drivers.

pub mod flow_led;
pub mod hw_init;
pub mod watchdog;
