//! AquaSense water-monitor firmware library.
//!
//! Exposes every module for the firmware binary and for host-side
//! integration tests. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module, with simulation
//! stand-ins on other targets.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod rtdb;
pub mod scheduler;
pub mod sensors;
