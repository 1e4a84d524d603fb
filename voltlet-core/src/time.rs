//! Time and delay abstraction
//!
//! The engine never reads a clock or sleeps directly. It goes through the
//! `TimeSource` and `DelaySource` traits so that:
//! - the same core runs on bare metal, an RTOS tick, or a host clock
//! - tests supply deterministic time and skip real sampling delays
//!
//! Implementations here cover the host (`SystemClock`) and tests
//! (`FixedClock`, `NoDelay`). Hardware targets implement the traits
//! against their platform timer.

/// Timestamp in milliseconds. Epoch depends on the source: Unix epoch for
/// wall clocks, boot for monotonic counters, arbitrary for test clocks.
pub type Timestamp = u64;

/// Source of current time for the engine.
pub trait TimeSource {
    /// Current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Blocking microsecond delay used to pace the sampling window.
///
/// The engine calls this between consecutive ADC reads; the call must not
/// return early. Accuracy directly sets the sampling interval accuracy.
pub trait DelaySource {
    /// Block for `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Wall-clock time source backed by the operating system.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Controllable time source for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: Timestamp,
}

impl FixedClock {
    /// Create a clock frozen at `timestamp`.
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Jump to an absolute timestamp.
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Delay source that returns immediately. For tests that feed synthetic
/// samples and do not care about real pacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelaySource for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = FixedClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);

        clock.set(10_000);
        assert_eq!(clock.now(), 10_000);
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_clock_is_nonzero() {
        assert!(SystemClock.now() > 0);
    }
}
