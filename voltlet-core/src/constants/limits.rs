//! Noise Floors and Sanity Bounds on Calibrated Measurements
//!
//! Thresholds below which a reading is indistinguishable from sensor noise,
//! and clamps that keep runaway calibration errors from reaching consumers.

/// Line voltage below which the reading is floored to zero (V).
///
/// A ZMPT101B-class voltage transformer produces a few volts equivalent of
/// noise with nothing connected; anything under this level is not a real
/// mains presence.
///
/// Source: bench measurement with open input
pub const VOLTAGE_NOISE_FLOOR_VOLTS: f32 = 5.0;

/// Upper sanity clamp on calibrated line voltage (V).
///
/// Well above any single- or split-phase nominal the node will meet.
/// Readings beyond it indicate a calibration or sampling fault, so the
/// value is clamped rather than propagated.
pub const VOLTAGE_CLAMP_MAX_VOLTS: f32 = 400.0;

/// Current-sensor output RMS below which current is floored to zero (V).
///
/// A ZMCT103C current transformer with its burden resistor idles at a few
/// millivolts RMS of noise. Below this the two-point model would resolve
/// the intercept, not a real load.
///
/// Source: bench measurement with no primary current
pub const CURRENT_NOISE_FLOOR_VRMS: f32 = 0.004;
