//! Analog sampling and window statistics
//!
//! ## Overview
//!
//! A measurement starts as a fixed window of raw ADC reads from one pin,
//! reduced on the fly to mean, RMS, minimum and maximum counts. The RMS is
//! computed over the AC component only - `RMS(x - mean)` - via the one-pass
//! identity `variance = E[x²] - E[x]²`, which removes the sensor's DC bias
//! without a separate pass or a stored sample buffer.
//!
//! ## Numeric stability
//!
//! The sums are accumulated in `f64`. With 12-bit counts and windows of a
//! few thousand samples, `sum²` stays within exact integer range of `f64`,
//! so the only rounding exposure is the final subtraction. Under a true
//! zero-signal condition that subtraction can still land a hair below zero;
//! the variance is clamped at zero before the square root.
//!
//! ## Blocking contract
//!
//! [`SampleEngine::sample`] blocks for the entire window
//! (`count × interval_us`). Nothing in the window is usable early, and no
//! other work proceeds while it runs. Callers own that trade-off; see the
//! device cycle in [`crate::device`].

use crate::time::DelaySource;
use crate::traits::AdcReader;
use crate::constants::time::{DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_INTERVAL_US};

/// Reduced statistics of one sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawStats {
    /// Mean of the raw counts (DC level).
    pub mean: f32,
    /// RMS of the AC component, in counts.
    pub rms: f32,
    /// Smallest raw count observed.
    pub min: u16,
    /// Largest raw count observed.
    pub max: u16,
}

/// One-pass accumulator over a window of raw counts.
///
/// Created fresh per window, consumed by [`SampleWindow::finish`].
#[derive(Debug, Clone)]
pub struct SampleWindow {
    count: u32,
    sum: f64,
    sum_sq: f64,
    min: u16,
    max: u16,
}

impl SampleWindow {
    /// Start an empty window.
    pub const fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: u16::MAX,
            max: 0,
        }
    }

    /// Fold one raw count into the running sums.
    pub fn record(&mut self, raw: u16) {
        let x = raw as f64;
        self.sum += x;
        self.sum_sq += x * x;
        if raw < self.min {
            self.min = raw;
        }
        if raw > self.max {
            self.max = raw;
        }
        self.count += 1;
    }

    /// Number of samples folded in so far.
    pub fn len(&self) -> u32 {
        self.count
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Reduce the window to its statistics.
    ///
    /// An empty window reduces to all-zero stats rather than NaN, so a
    /// misconfigured zero-length window degrades to "no signal" instead
    /// of poisoning downstream arithmetic.
    pub fn finish(self) -> RawStats {
        if self.count == 0 {
            return RawStats {
                mean: 0.0,
                rms: 0.0,
                min: 0,
                max: 0,
            };
        }

        let n = self.count as f64;
        let mean = self.sum / n;
        let mut variance = self.sum_sq / n - mean * mean;
        // Round-off can push a true zero-signal variance slightly negative.
        if variance < 0.0 {
            variance = 0.0;
        }

        RawStats {
            mean: mean as f32,
            rms: libm::sqrt(variance) as f32,
            min: self.min,
            max: self.max,
        }
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives a fixed, delay-paced sampling window over one analog pin.
#[derive(Debug, Clone, Copy)]
pub struct SampleEngine {
    count: u32,
    interval_us: u32,
}

impl SampleEngine {
    /// Engine taking `count` reads spaced `interval_us` apart.
    pub const fn new(count: u32, interval_us: u32) -> Self {
        Self { count, interval_us }
    }

    /// Configured reads per window.
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Window duration in microseconds.
    pub const fn window_us(&self) -> u64 {
        self.count as u64 * self.interval_us as u64
    }

    /// Take one full window from `pin` and reduce it.
    ///
    /// Blocks for the whole window. Reads the hardware input and nothing
    /// else; the converter is untouched between windows.
    pub fn sample<A, D>(&self, adc: &mut A, delay: &mut D, pin: u8) -> RawStats
    where
        A: AdcReader,
        D: DelaySource,
    {
        let mut window = SampleWindow::new();
        for _ in 0..self.count {
            window.record(adc.read(pin));
            delay.delay_us(self.interval_us);
        }
        window.finish()
    }
}

impl Default for SampleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_INTERVAL_US)
    }
}
