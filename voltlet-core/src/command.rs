//! Command protocol: receive, validate, apply or discard
//!
//! Inbound messages run a two-transition machine: *validate* the decoded
//! record against the closed channel set and the 0/1 state encoding, then
//! *apply* through the relay controller or discard. Discards are silent on
//! the wire - no state change, no acknowledgment - which keeps the command
//! topic free of error chatter; the reason is logged at debug level only.
//!
//! An accepted command yields a [`CommandAck`] carrying the full
//! post-update relay snapshot. Consumers treat that snapshot as
//! authoritative state, never as a delta.

use crate::channel::ChannelId;
use crate::errors::CommandError;
use crate::relay::RelaySnapshot;

#[cfg(feature = "serde")]
use crate::payload::{decode_command, CommandMessage};
#[cfg(feature = "serde")]
use crate::relay::RelayController;
#[cfg(feature = "serde")]
use crate::traits::RelayPin;

/// Outcome of an accepted command: what changed and the full state after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandAck {
    /// Channel the command addressed.
    pub channel: ChannelId,
    /// State that was applied.
    pub on: bool,
    /// Authoritative post-update state of every channel.
    pub relay: RelaySnapshot,
}

/// Validate a decoded command against the channel set and state encoding.
pub fn validate(ch: u8, state: u8) -> Result<(ChannelId, bool), CommandError> {
    let id = ChannelId::from_raw(ch).ok_or(CommandError::UnknownChannel(ch))?;
    let on = match state {
        0 => false,
        1 => true,
        other => return Err(CommandError::InvalidState(other)),
    };
    Ok((id, on))
}

/// Apply a validated command message to the relays.
#[cfg(feature = "serde")]
pub fn apply<P: RelayPin>(
    message: CommandMessage,
    relays: &mut RelayController<P>,
) -> Result<CommandAck, CommandError> {
    let (channel, on) = validate(message.ch, message.state)?;
    relays.apply(channel, on);
    Ok(CommandAck {
        channel,
        on,
        relay: relays.snapshot(),
    })
}

/// Handle one raw inbound payload end to end.
///
/// `None` covers every discard: undecodable shapes, unknown channels,
/// non-boolean states. Per the wire contract none of these produce a
/// reply or a state change.
#[cfg(feature = "serde")]
pub fn handle<P: RelayPin>(
    payload: &[u8],
    relays: &mut RelayController<P>,
) -> Option<CommandAck> {
    let message = match decode_command(payload) {
        Some(message) => message,
        None => {
            #[cfg(feature = "log")]
            log::debug!("command dropped: {}", CommandError::Malformed);
            return None;
        }
    };

    match apply(message, relays) {
        Ok(ack) => {
            #[cfg(feature = "log")]
            log::info!(
                "relay updated: ch={} state={}",
                ack.channel.number(),
                u8::from(ack.on)
            );
            Some(ack)
        }
        Err(_err) => {
            #[cfg(feature = "log")]
            log::debug!("command dropped: {}", _err);
            None
        }
    }
}
