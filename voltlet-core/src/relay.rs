//! Relay state machine and output drive
//!
//! Owns the commanded on/off state of both channels and keeps the physical
//! output lines consistent with it. Relay modules differ in drive sense -
//! many common boards energize on a low level - so the logical state maps
//! through a configured polarity before touching the pin.
//!
//! Validation does not happen here: an unknown raw channel identity is
//! silently ignored, because rejecting bad input with a reply is the
//! command protocol's job and boot-restore goes through this same path.

use crate::channel::{ChannelId, CHANNEL_COUNT};
use crate::traits::RelayPin;

/// Electrical sense of the relay drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// A high level energizes the relay.
    ActiveHigh,
    /// A low level energizes the relay (common opto-isolated modules).
    ActiveLow,
}

impl Polarity {
    /// Pin level that realizes the given logical state.
    pub const fn level_for(self, on: bool) -> bool {
        match self {
            Polarity::ActiveHigh => on,
            Polarity::ActiveLow => !on,
        }
    }
}

/// Commanded state of all channels at one instant, in telemetry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySnapshot(pub [bool; CHANNEL_COUNT]);

impl RelaySnapshot {
    /// Wire representation: one 0/1 per channel.
    pub fn as_bits(&self) -> [u8; CHANNEL_COUNT] {
        self.0.map(u8::from)
    }

    /// State of one channel.
    pub fn get(&self, id: ChannelId) -> bool {
        self.0[id.index()]
    }
}

/// Drives the relay output lines and records the commanded states.
///
/// The only mutator of relay state in the system. `apply` is idempotent:
/// re-asserting the current state rewrites the same level and records the
/// same value.
#[derive(Debug)]
pub struct RelayController<P: RelayPin> {
    pins: [P; CHANNEL_COUNT],
    states: [bool; CHANNEL_COUNT],
    polarity: Polarity,
}

impl<P: RelayPin> RelayController<P> {
    /// Take ownership of the output lines and drive everything off.
    ///
    /// `pins` in channel order. Driving the de-energized level up front
    /// puts the hardware in a known state before boot-restore runs.
    pub fn new(mut pins: [P; CHANNEL_COUNT], polarity: Polarity) -> Self {
        for pin in &mut pins {
            pin.set_level(polarity.level_for(false));
        }
        Self {
            pins,
            states: [false; CHANNEL_COUNT],
            polarity,
        }
    }

    /// Apply a desired state addressed by raw wire identity.
    ///
    /// Unknown identities are ignored without effect.
    pub fn apply_raw(&mut self, raw_channel: u8, on: bool) {
        if let Some(id) = ChannelId::from_raw(raw_channel) {
            self.apply(id, on);
        }
    }

    /// Apply a desired state to a known channel.
    pub fn apply(&mut self, id: ChannelId, on: bool) {
        let idx = id.index();
        self.states[idx] = on;
        self.pins[idx].set_level(self.polarity.level_for(on));
    }

    /// Commanded state of one channel.
    pub fn is_on(&self, id: ChannelId) -> bool {
        self.states[id.index()]
    }

    /// Current state of every channel.
    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot(self.states)
    }
}
