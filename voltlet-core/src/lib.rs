//! Measurement and control engine for Voltlet
//!
//! Switches two independent AC loads and turns raw ADC windows into
//! calibrated voltage, current, power and accumulated energy per channel.
//!
//! Key constraints:
//! - Single-threaded, cooperative: a sampling window blocks the whole loop
//! - No heap allocation in the measurement path
//! - Hardware access only through injectable traits
//!
//! ```no_run
//! use voltlet_core::{Device, SampleEngine, RelayController, Polarity, ChannelConfig};
//! use voltlet_core::channel::{ChannelId, CalPoint};
//!
//! # fn demo<A, D, P, T>(adc: &mut A, delay: &mut D, pins: [P; 2], clock: &T)
//! # -> Result<(), voltlet_core::CalibrationError>
//! # where A: voltlet_core::AdcReader, D: voltlet_core::DelaySource,
//! #       P: voltlet_core::RelayPin, T: voltlet_core::TimeSource {
//! let configs = [
//!     ChannelConfig::new(ChannelId::Ch1, 33, 32, 840.0,
//!         [CalPoint::new(0.170, 0.149), CalPoint::new(0.320, 0.212)]),
//!     ChannelConfig::new(ChannelId::Ch3, 35, 34, 592.4,
//!         [CalPoint::new(0.170, 0.410), CalPoint::new(0.330, 0.478)]),
//! ];
//! let relays = RelayController::new(pins, Polarity::ActiveLow);
//! let mut device = Device::new(configs, SampleEngine::default(), relays)?;
//!
//! // One full measurement cycle over both channels
//! let report = device.run_cycle(adc, delay, clock);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod calibration;
pub mod channel;
pub mod command;
pub mod constants;
pub mod device;
pub mod energy;
pub mod errors;
pub mod relay;
pub mod sampling;
pub mod telemetry;
pub mod time;
pub mod traits;

#[cfg(feature = "serde")]
pub mod payload;

// Public API
pub use calibration::{ChannelCalibration, Measurement};
pub use channel::{ChannelConfig, ChannelId};
pub use command::CommandAck;
pub use device::{ChannelReading, CycleReport, Device};
pub use energy::EnergyAccumulator;
pub use errors::{CalibrationError, CommandError};
pub use relay::{Polarity, RelayController, RelaySnapshot};
pub use sampling::{RawStats, SampleEngine};
pub use time::{DelaySource, TimeSource, Timestamp};
pub use traits::{AdcReader, LinkQuality, RelayPin};

/// Crate version, as baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
