//! Energy accumulation
//!
//! First-order (rectangular) integration of instantaneous power over the
//! *measured* elapsed interval between cycles. Accuracy tracks the
//! telemetry cadence, not this integrator; irregular cycle periods need no
//! special handling because the nominal cadence is never used.
//!
//! The first cycle after (re)initialization has no previous timestamp and
//! contributes zero elapsed time, so a freshly booted node cannot book a
//! spurious energy burst against an undefined interval.

use crate::constants::time::MS_PER_HOUR;
use crate::time::Timestamp;

/// Running watt-hour total for one channel.
///
/// Monotonically non-decreasing between resets: integration only adds when
/// power is non-negative and the elapsed interval is positive. Lives for
/// the process lifetime; there is no durable storage behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyAccumulator {
    total_wh: f64,
    last: Option<Timestamp>,
}

impl EnergyAccumulator {
    /// Fresh accumulator with no history.
    pub const fn new() -> Self {
        Self {
            total_wh: 0.0,
            last: None,
        }
    }

    /// Fold one cycle's power reading into the total.
    ///
    /// `power_w` is this cycle's instantaneous power; `now` the cycle
    /// timestamp. The last-seen timestamp advances unconditionally, even
    /// when the power or interval guard skips the addition.
    pub fn integrate(&mut self, power_w: f32, now: Timestamp) -> f64 {
        if let Some(last) = self.last {
            let elapsed_ms = now.saturating_sub(last);
            if power_w >= 0.0 && elapsed_ms > 0 {
                let hours = elapsed_ms as f64 / MS_PER_HOUR as f64;
                self.total_wh += power_w as f64 * hours;
            }
        }
        self.last = Some(now);
        self.total_wh
    }

    /// Accumulated energy in watt-hours.
    pub fn total_wh(&self) -> f64 {
        self.total_wh
    }

    /// Drop the total and the timestamp history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
