//! Constants for the Voltlet engine
//!
//! Centralized numeric values used throughout the measurement and control
//! path, with their purpose and source. Use these instead of magic numbers;
//! when adding new constants, document where the value comes from.
//!
//! ## Organization
//!
//! - **Adc**: converter resolution, reference and saturation margins
//! - **Limits**: noise floors and sanity clamps on calibrated values
//! - **Time**: intervals and unit-conversion factors

/// ADC converter characteristics and saturation margins.
pub mod adc;

/// Noise floors and sanity bounds on calibrated measurements.
pub mod limits;

/// Time conversion factors and default intervals.
pub mod time;

// Re-export commonly used constants for convenience
pub use adc::{
    ADC_FULL_SCALE_COUNTS, ADC_VREF_VOLTS,
    SATURATION_LOW_COUNTS, SATURATION_HIGH_COUNTS,
};

pub use limits::{
    VOLTAGE_NOISE_FLOOR_VOLTS, VOLTAGE_CLAMP_MAX_VOLTS,
    CURRENT_NOISE_FLOOR_VRMS,
};

pub use time::{
    MS_PER_SECOND, MS_PER_HOUR,
    DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_INTERVAL_US,
    DEFAULT_TELEMETRY_INTERVAL_MS,
};
