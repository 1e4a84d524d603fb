//! MQTT pub/sub link
//!
//! One inbound topic (commands) and three outbound (telemetry,
//! acknowledgments, retained status), all under `home/<deviceId>/`. The
//! link is blocking: the caller drives it by polling once per loop
//! iteration, which both drains inbound commands and flushes queued
//! publishes. Commands arriving while the engine samples simply wait in
//! the broker/session until the next poll - that is the documented
//! interleaving model, not a defect.
//!
//! Reconnection is blocking retry under the hood: a failed poll marks the
//! link down, the next polls keep redialing, and a successful session
//! handshake re-subscribes the command topic and surfaces
//! [`LinkEvent::Connected`] so the node can re-announce itself (boot
//! acknowledgment + retained status), exactly like a fresh boot.

use std::time::{Duration, Instant};

use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};

use voltlet_core::payload::{AckRecord, StatusRecord, TelemetryRecord};

use crate::{ConnectionStats, Connector, ConnectorError};

/// MQTT link configuration.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host name or address.
    pub host: String,
    /// Broker port (plain TCP).
    pub port: u16,
    /// Device identity; also the topic namespace.
    pub device_id: String,
    /// Per-board suffix keeping client ids unique across nodes that share
    /// a device id during bring-up.
    pub instance: String,
    /// Session keep-alive in seconds.
    pub keep_alive_secs: u64,
    /// Outgoing request queue capacity.
    pub queue_capacity: usize,
}

impl MqttConfig {
    /// Client identifier presented to the broker.
    pub fn client_id(&self) -> String {
        if self.instance.is_empty() {
            self.device_id.clone()
        } else {
            format!("{}_{}", self.device_id, self.instance)
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            device_id: "voltlet_001".into(),
            instance: String::new(),
            keep_alive_secs: 30,
            queue_capacity: 64,
        }
    }
}

/// The four topics of one device's namespace.
#[derive(Debug, Clone)]
pub struct Topics {
    /// Outbound periodic telemetry.
    pub telemetry: String,
    /// Inbound relay commands.
    pub cmd: String,
    /// Outbound acknowledgments.
    pub ack: String,
    /// Outbound retained status.
    pub status: String,
}

impl Topics {
    /// Topics for a device id.
    pub fn new(device_id: &str) -> Self {
        Self {
            telemetry: format!("home/{device_id}/telemetry"),
            cmd: format!("home/{device_id}/cmd"),
            ack: format!("home/{device_id}/ack"),
            status: format!("home/{device_id}/status"),
        }
    }
}

/// What a poll surfaced to the node loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A session was (re)established; the node should re-announce.
    Connected,
    /// Raw payload received on the command topic.
    Command(Vec<u8>),
}

/// Blocking MQTT link for one device.
pub struct MqttLink {
    client: Client,
    connection: Connection,
    topics: Topics,
    connected: bool,
    stats: ConnectionStats,
}

impl MqttLink {
    /// Build the link and queue the command-topic subscription.
    ///
    /// The network dial happens on the first [`MqttLink::poll`]; nothing
    /// blocks here.
    pub fn new(config: &MqttConfig) -> Result<Self, ConnectorError> {
        let mut options = MqttOptions::new(config.client_id(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, connection) = Client::new(options, config.queue_capacity);
        let topics = Topics::new(&config.device_id);

        client
            .subscribe(topics.cmd.as_str(), QoS::AtMostOnce)
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            connection,
            topics,
            connected: false,
            stats: ConnectionStats::default(),
        })
    }

    /// Topic names in use.
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Counters since construction.
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Drive the link for up to `budget`, collecting inbound events.
    ///
    /// Also the flush path for queued publishes and keep-alives, so the
    /// node must call this every loop iteration even when it expects no
    /// commands. Blocks at most `budget` plus one redial backoff.
    pub fn poll(&mut self, budget: Duration) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        let deadline = Instant::now() + budget;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match self.connection.recv_timeout(remaining) {
                Ok(Ok(event)) => self.absorb(event, &mut events),
                Ok(Err(err)) => {
                    if self.connected {
                        log::warn!("mqtt link lost: {err}");
                    }
                    self.connected = false;
                    // pace the blocking redial loop
                    std::thread::sleep(Duration::from_secs(1));
                }
                Err(_) => break, // budget exhausted
            }
        }

        events
    }

    fn absorb(&mut self, event: Event, events: &mut Vec<LinkEvent>) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                log::info!("mqtt connected");
                self.connected = true;
                self.stats.reconnections += 1;
                // clean sessions forget subscriptions across reconnects
                if let Err(err) = self
                    .client
                    .try_subscribe(self.topics.cmd.as_str(), QoS::AtMostOnce)
                {
                    log::warn!("resubscribe failed: {err}");
                }
                events.push(LinkEvent::Connected);
            }
            Event::Incoming(Packet::Publish(publish)) => {
                if publish.topic == self.topics.cmd {
                    events.push(LinkEvent::Command(publish.payload.to_vec()));
                }
            }
            _ => {}
        }
    }

    /// Publish the periodic telemetry record.
    pub fn publish_telemetry(&mut self, record: &TelemetryRecord) -> Result<(), ConnectorError> {
        let topic = self.topics.telemetry.clone();
        let data = serde_json::to_vec(record)?;
        self.publish(&topic, &data, false)
    }

    /// Publish an acknowledgment.
    pub fn publish_ack(&mut self, record: &AckRecord) -> Result<(), ConnectorError> {
        let topic = self.topics.ack.clone();
        let data = serde_json::to_vec(record)?;
        self.publish(&topic, &data, false)
    }

    /// Publish the retained status record.
    pub fn publish_status(&mut self, record: &StatusRecord) -> Result<(), ConnectorError> {
        let topic = self.topics.status.clone();
        let data = serde_json::to_vec(record)?;
        self.publish(&topic, &data, true)
    }

    fn publish(&mut self, topic: &str, data: &[u8], retain: bool) -> Result<(), ConnectorError> {
        // try_publish keeps a full outgoing queue (broker down, redial in
        // progress) from blocking the loop that drives the redial
        match self
            .client
            .try_publish(topic, QoS::AtMostOnce, retain, data.to_vec())
        {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += data.len() as u64;
                Ok(())
            }
            Err(err) => {
                self.stats.messages_failed += 1;
                Err(ConnectorError::Transport(err.to_string()))
            }
        }
    }
}

impl Connector for MqttLink {
    type Error = ConnectorError;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.publish(topic, data, false)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_follow_device_namespace() {
        let topics = Topics::new("esp32_001");
        assert_eq!(topics.telemetry, "home/esp32_001/telemetry");
        assert_eq!(topics.cmd, "home/esp32_001/cmd");
        assert_eq!(topics.ack, "home/esp32_001/ack");
        assert_eq!(topics.status, "home/esp32_001/status");
    }

    #[test]
    fn client_id_gets_instance_suffix() {
        let mut config = MqttConfig::default();
        config.device_id = "esp32_001".into();
        config.instance = "a1b2c3".into();
        assert_eq!(config.client_id(), "esp32_001_a1b2c3");

        config.instance.clear();
        assert_eq!(config.client_id(), "esp32_001");
    }

    #[test]
    fn link_builds_without_a_broker() {
        // construction only queues work; no dial, no panic
        let link = MqttLink::new(&MqttConfig::default()).unwrap();
        assert!(!link.is_connected());
    }
}
