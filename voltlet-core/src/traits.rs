//! Hardware seams
//!
//! The engine owns no peripherals. Everything it touches on the way to
//! hardware goes through one of these traits, which keeps the measurement
//! path testable with synthetic inputs and portable across targets.
//!
//! - [`AdcReader`] - raw analog conversions for the sampling window
//! - [`RelayPin`] - the output line behind each relay channel
//! - [`LinkQuality`] - signal-strength readout for telemetry
//!
//! Time and delay seams live in [`crate::time`].

/// Raw analog conversions, one pin at a time.
///
/// `read` performs a single conversion and returns the count value.
/// The engine calls it in a tight loop for the whole sampling window, so
/// implementations should not add their own settling delays; pacing is the
/// job of the injected [`crate::time::DelaySource`].
pub trait AdcReader {
    /// One conversion from the given input pin, in raw counts.
    fn read(&mut self, pin: u8) -> u16;
}

/// Output line driving one relay coil (or its driver transistor).
///
/// The controller maps logical on/off through the configured polarity
/// before calling this, so implementations write the level verbatim.
pub trait RelayPin {
    /// Drive the line high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool);
}

/// Signal-strength readout of the network link.
///
/// Telemetry reports this verbatim. Radio-backed implementations return
/// RSSI in dBm; wired or synthetic links return a fixed placeholder.
pub trait LinkQuality {
    /// Current signal strength in dBm.
    fn rssi_dbm(&self) -> i32;
}
