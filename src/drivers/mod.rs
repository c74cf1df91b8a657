//! Bus drivers, hardware initialisation, and the task watchdog.

pub mod hw_init;
pub mod one_wire;
pub mod watchdog;
