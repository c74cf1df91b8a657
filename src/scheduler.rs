//! Fixed-period interval timers for the monitor loop.
//!
//! The loop runs two independent cadences (sampling and publishing) off a
//! single monotonic millisecond clock:
//!
//! ```text
//!   now ──▶ sample_timer.due(now)?  ──▶ MonitorService::sample()
//!       └─▶ publish_timer.due(now)? ──▶ MonitorService::publish()
//! ```
//!
//! A timer fires when at least one period has elapsed since it last fired
//! and then restarts from `now`, not from the ideal deadline. A pass that
//! overruns (slow network) therefore delays the next firing instead of
//! causing a burst of catch-up firings.

/// One periodic deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period_ms: u64,
    last_ms: u64,
}

impl IntervalTimer {
    /// Timer that first fires once `period_ms` has elapsed since boot.
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms: period_ms as u64,
            last_ms: 0,
        }
    }

    /// `true` (and re-armed at `now_ms`) if `now_ms - last >= period`.
    ///
    /// A clock that appears to run backwards never fires.
    pub fn due(&mut self, now_ms: u64) -> bool {
        match now_ms.checked_sub(self.last_ms) {
            Some(elapsed) if elapsed >= self.period_ms => {
                self.last_ms = now_ms;
                true
            }
            _ => false,
        }
    }

    /// Time of the last firing (0 before the first).
    pub fn last_ms(&self) -> u64 {
        self.last_ms
    }
}
