//! Network collaborators for the Voltlet node
//!
//! ## Overview
//!
//! Everything that leaves the device goes through one of two adapters:
//!
//! - [`mqtt`] - the pub/sub link carrying telemetry, commands,
//!   acknowledgments and retained status
//! - [`http`] - the one-shot boot-restore client that asks the backend
//!   for the last known relay state
//!
//! ## Blocking by design
//!
//! The node is single-threaded and cooperative: sampling already blocks
//! the loop for most of each cycle, so there is nothing for an async
//! runtime to overlap. Both adapters are synchronous; connectivity loss is
//! handled with blocking retry inside the adapters while the engine's
//! in-memory state (energy totals, relay states) stays untouched.
//!
//! ## Failure posture
//!
//! Neither adapter can take the node down. Publish failures are reported
//! to the caller for logging and skipped; the boot-restore client folds
//! every failure mode into the safe default (both channels off).

use thiserror::Error;

pub mod http;
pub mod mqtt;

pub use http::{BootRestoreClient, RestoreConfig};
pub use mqtt::{LinkEvent, MqttConfig, MqttLink};

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The link is not currently established.
    #[error("not connected")]
    NotConnected,

    /// The underlying transport rejected or dropped the operation.
    #[error("transport error: {0}")]
    Transport(String),

    /// A payload could not be encoded for the wire.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Trait for outbound record transports.
pub trait Connector {
    /// Transport-specific error type.
    type Error;

    /// Send an encoded record to a topic or path.
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Number of reconnections
    pub reconnections: u32,
}
