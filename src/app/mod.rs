//! Application core: pure domain logic, zero I/O.
//!
//! Sampling policy, the publish payload and the loop cadence live here.
//! All interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod payload;
pub mod ports;
pub mod readings;
pub mod service;
