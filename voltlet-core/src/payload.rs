//! Wire payload records
//!
//! Every record crossing the pub/sub link is defined here once as a serde
//! struct and serialized in one explicit step; nothing else in the tree
//! assembles wire bytes. Field names are part of the deployed contract
//! (dashboards and the backend key on them), so they are spelled out with
//! renames rather than derived from Rust naming.
//!
//! Decoding tolerates unknown extra fields, mirroring how lenient the
//! original field extraction was; shape errors surface as `None` and the
//! caller decides whether that is worth a log line.

use serde::{Deserialize, Serialize};

use crate::channel::CHANNEL_COUNT;

/// Periodic telemetry record, one per publish cycle.
///
/// `voltage` carries channel 1's reading as the node's main voltage
/// reference; `current`/`power`/`energy_wh` are channel sums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryRecord<'a> {
    /// Node identity.
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    /// Cycle timestamp, seconds.
    pub ts: u64,

    /// Channel 1 RMS voltage (V, 2 dp).
    pub v1: f64,
    /// Channel 1 RMS current (A, 3 dp).
    pub i1: f64,
    /// Channel 1 power (W, 2 dp).
    pub p1: f64,
    /// Channel 1 cumulative energy (Wh, 3 dp).
    #[serde(rename = "e1Wh")]
    pub e1_wh: f64,

    /// Channel 3 RMS voltage (V, 2 dp).
    pub v3: f64,
    /// Channel 3 RMS current (A, 3 dp).
    pub i3: f64,
    /// Channel 3 power (W, 2 dp).
    pub p3: f64,
    /// Channel 3 cumulative energy (Wh, 3 dp).
    #[serde(rename = "e3Wh")]
    pub e3_wh: f64,

    /// Main voltage reference (channel 1).
    pub voltage: f64,
    /// Summed current across channels.
    pub current: f64,
    /// Summed power across channels.
    pub power: f64,
    /// Summed energy across channels.
    #[serde(rename = "energyWh")]
    pub energy_wh: f64,

    /// Link signal strength (dBm).
    pub rssi: i32,
    /// Relay states in channel order, 0/1.
    pub relay: [u8; CHANNEL_COUNT],
    /// Channel 1 current window clipped this cycle.
    #[serde(rename = "clipI1")]
    pub clip_i1: u8,
    /// Channel 3 current window clipped this cycle.
    #[serde(rename = "clipI3")]
    pub clip_i3: u8,
}

/// Inbound relay command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandMessage {
    /// Raw channel identity.
    pub ch: u8,
    /// Requested state, 0 or 1.
    pub state: u8,
}

/// Acknowledgment published after an accepted command, and once at boot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AckRecord<'a> {
    /// Node identity.
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    /// What this acknowledges, e.g. `cmd_applied`.
    pub info: &'a str,
    /// Full post-update relay state, not a delta.
    pub relay: [u8; CHANNEL_COUNT],
}

/// Retained status record published at boot and on any state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusRecord<'a> {
    /// Node identity.
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    /// Why this status was published, e.g. `boot_connected`.
    pub reason: &'a str,
    /// Network address of the node.
    pub ip: &'a str,
    /// Link signal strength (dBm).
    pub rssi: i32,
    /// Full relay state in channel order.
    pub relay: [u8; CHANNEL_COUNT],
}

/// Decode an inbound command payload.
///
/// Any shape that is not a command record yields `None`; extra fields are
/// tolerated. Field *values* are validated later by the command protocol.
pub fn decode_command(payload: &[u8]) -> Option<CommandMessage> {
    serde_json::from_slice(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_decodes_minimal_record() {
        let msg = decode_command(br#"{"ch":1,"state":1}"#).unwrap();
        assert_eq!(msg, CommandMessage { ch: 1, state: 1 });
    }

    #[test]
    fn command_tolerates_extra_fields() {
        let msg = decode_command(br#"{"ch":3,"state":0,"origin":"app"}"#).unwrap();
        assert_eq!(msg, CommandMessage { ch: 3, state: 0 });
    }

    #[test]
    fn non_command_shapes_are_none() {
        assert!(decode_command(b"").is_none());
        assert!(decode_command(b"hello").is_none());
        assert!(decode_command(br#"{"ch":1}"#).is_none());
        assert!(decode_command(br#"{"state":1}"#).is_none());
        assert!(decode_command(br#"{"ch":"one","state":1}"#).is_none());
        assert!(decode_command(br#"[1,1]"#).is_none());
    }

    #[test]
    fn telemetry_roundtrips_with_wire_names() {
        let record = TelemetryRecord {
            device_id: "esp32_001",
            ts: 1_712_000_000,
            v1: 229.73,
            i1: 0.321,
            p1: 73.74,
            e1_wh: 12.345,
            v3: 0.0,
            i3: 0.0,
            p3: 0.0,
            e3_wh: 0.0,
            voltage: 229.73,
            current: 0.321,
            power: 73.74,
            energy_wh: 12.345,
            rssi: -61,
            relay: [1, 0],
            clip_i1: 0,
            clip_i3: 1,
        };

        let json = serde_json::to_string(&record).unwrap();
        for field in [
            "\"deviceId\"", "\"ts\"", "\"e1Wh\"", "\"e3Wh\"", "\"energyWh\"",
            "\"clipI1\"", "\"clipI3\"", "\"relay\":[1,0]",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }

        let back: TelemetryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn ack_roundtrips() {
        let ack = AckRecord {
            device_id: "esp32_001",
            info: "cmd_applied",
            relay: [0, 1],
        };
        let json = serde_json::to_string(&ack).unwrap();
        let back: AckRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ack);
    }

    #[test]
    fn status_roundtrips() {
        let status = StatusRecord {
            device_id: "esp32_001",
            reason: "relay_changed",
            ip: "192.168.1.40",
            rssi: -58,
            relay: [1, 1],
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: StatusRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
