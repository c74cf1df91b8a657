//! Hall-effect water flow sensor driver.
//!
//! The sensor outputs one pulse per fixed volume of water. An ISR
//! increments an atomic counter on each rising edge; [`FlowSensor::read`]
//! drains it once per sampling interval and converts the count to L/min.
//!
//! Draining is a single `swap(0)`, so a pulse that lands while the main
//! loop consumes the count is attributed to exactly one interval: either
//! it is in the swapped-out value or it increments the fresh zero.

use core::sync::atomic::{AtomicU32, Ordering};

/// Edge counter shared between the flow ISR (producer) and the sampler
/// (consumer).
pub struct PulseCounter {
    count: AtomicU32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Count one edge. Lock-free, safe from interrupt context.
    #[inline]
    pub fn record_pulse(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Return the pulses seen since the previous call and reset to zero.
    pub fn take(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Current count without consuming it.
    pub fn peek(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Global counter incremented by the GPIO ISR.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
pub static FLOW_PULSES: PulseCounter = PulseCounter::new();

/// Called from the GPIO ISR on each rising edge.
pub fn flow_isr_handler() {
    FLOW_PULSES.record_pulse();
}

/// Result of a flow measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowReading {
    /// Pulses counted in the measurement window.
    pub pulse_count: u32,
    /// Flow rate (L/min) assuming a window of one sampling interval.
    pub litres_per_min: f32,
}

impl FlowReading {
    /// A window with no pulses carries no new information.
    pub fn has_pulses(&self) -> bool {
        self.pulse_count > 0
    }
}

/// Flow sensor driver.
pub struct FlowSensor {
    counter: &'static PulseCounter,
    pulses_per_lpm: f32,
}

impl FlowSensor {
    pub fn new(counter: &'static PulseCounter, pulses_per_lpm: f32) -> Self {
        Self {
            counter,
            pulses_per_lpm,
        }
    }

    /// Drain the pulse counter and compute the flow rate.
    pub fn read(&mut self) -> FlowReading {
        let pulse_count = self.counter.take();
        FlowReading {
            pulse_count,
            litres_per_min: pulses_to_lpm(pulse_count, self.pulses_per_lpm),
        }
    }
}

/// `pulses / pulses_per_lpm`, e.g. 36 pulses at 18.0 → 2.0 L/min.
pub fn pulses_to_lpm(pulses: u32, pulses_per_lpm: f32) -> f32 {
    pulses as f32 / pulses_per_lpm
}
