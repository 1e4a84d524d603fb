//! Error types for the measurement and control path
//!
//! Errors here are deliberately small: `Copy`, no heap, inline data only.
//! They are returned on hot paths and may cross into logging on targets
//! where a `String` is not an option.
//!
//! Note that most degraded conditions in this system are *not* errors:
//! a clipped current window becomes a flagged zero reading, a malformed
//! command is dropped without a reply. The enums below cover the cases
//! where a caller can actually branch on the failure.

use thiserror_no_std::Error;

/// Failures while deriving calibration coefficients at initialization.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// The two current reference points share one sensor-output voltage,
    /// which would make the model's slope infinite.
    #[error("current reference points coincide at {volts} Vrms")]
    DegeneratePoints {
        /// The shared sensor-output RMS voltage of both points.
        volts: f32,
    },
}

/// Reasons an inbound command is discarded.
///
/// Per the command contract these are never reported back over the wire;
/// they exist so the drop can be logged and unit tested.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Payload did not decode as a command record.
    #[error("payload is not a command record")]
    Malformed,

    /// Channel field does not name a known channel.
    #[error("unrecognized channel {0}")]
    UnknownChannel(u8),

    /// State field is not a boolean encoding (0 or 1).
    #[error("state {0} is not a boolean encoding")]
    InvalidState(u8),
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::DegeneratePoints { volts } => {
                defmt::write!(fmt, "reference points coincide at {} Vrms", volts)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Malformed => defmt::write!(fmt, "not a command record"),
            Self::UnknownChannel(ch) => defmt::write!(fmt, "unknown channel {}", ch),
            Self::InvalidState(st) => defmt::write!(fmt, "invalid state {}", st),
        }
    }
}
