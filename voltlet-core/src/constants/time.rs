//! Time Conversion Factors and Default Intervals

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1_000;

/// Milliseconds per hour. Divisor for watt-hour integration.
pub const MS_PER_HOUR: u64 = 3_600_000;

/// Default number of raw reads per sampling window.
///
/// With the default inter-sample delay this spans a 0.4 s window per pin,
/// an integer number of mains cycles at both 50 and 60 Hz.
pub const DEFAULT_SAMPLE_COUNT: u32 = 2_000;

/// Default delay between consecutive raw reads (µs).
pub const DEFAULT_SAMPLE_INTERVAL_US: u32 = 200;

/// Default wall-clock cadence of the telemetry cycle (ms).
///
/// Lower bound in practice is the summed per-pin window durations, since
/// sampling blocks the loop.
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 2_000;
