//! Voltlet node binary
//!
//! Boot sequence mirrors the deployed firmware: restore relay state from
//! the backend, bring up the MQTT link, then run the single-threaded loop
//! alternating between command servicing and cadence-gated measurement.

use std::time::Duration;

use anyhow::Context;

use voltlet_connectors::http::{BootRestoreClient, RestoreConfig};
use voltlet_connectors::mqtt::{LinkEvent, MqttConfig, MqttLink};
use voltlet_core::channel::ChannelId;
use voltlet_core::payload::{AckRecord, StatusRecord};
use voltlet_core::relay::RelayController;
use voltlet_core::telemetry;
use voltlet_core::time::{SystemClock, TimeSource};
use voltlet_core::traits::LinkQuality;
use voltlet_core::{Device, SampleEngine};

mod config;
mod hal;

use config::NodeConfig;
use hal::{FixedRssi, LoggedRelayPin, SyntheticAdc, ThreadDelay};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VOLTLET_CONFIG").ok())
        .unwrap_or_else(|| "voltlet.yaml".into());

    let config = if std::path::Path::new(&path).exists() {
        NodeConfig::load(&path).with_context(|| format!("loading config {path}"))?
    } else {
        log::warn!("config {path} not found, using built-in defaults");
        NodeConfig::default()
    };

    run(config)
}

fn run(config: NodeConfig) -> anyhow::Result<()> {
    let polarity = config.polarity()?;
    let relay_pins = config.relays.pins.map(LoggedRelayPin::new);
    let engine = SampleEngine::new(
        config.telemetry.sample_count,
        config.telemetry.sample_interval_us,
    );
    let mut device = Device::new(
        config.channel_configs(),
        engine,
        RelayController::new(relay_pins, polarity),
    )
    .context("deriving channel calibrations")?;

    log::info!(
        "device {} up, cycle blocks {} ms",
        config.device.id,
        device.cycle_blocking_us() / 1_000
    );

    // One-shot boot restore; every failure folds into "both off".
    let restore = BootRestoreClient::new(
        RestoreConfig::new(config.backend.base_url.clone())
            .timeout_secs(config.backend.timeout_secs),
    )
    .context("backend configuration")?;
    let restored = restore.fetch_relay_state(&config.device.id);
    for (id, on) in ChannelId::ALL.into_iter().zip(restored) {
        device.apply_relay(id, on);
    }

    let mut link = MqttLink::new(&MqttConfig {
        host: config.mqtt.host.clone(),
        port: config.mqtt.port,
        device_id: config.device.id.clone(),
        instance: config.device.instance.clone(),
        keep_alive_secs: config.mqtt.keep_alive_secs,
        queue_capacity: config.mqtt.queue_capacity,
    })
    .context("mqtt configuration")?;

    let clock = SystemClock;
    let mut adc = SyntheticAdc::new();
    let mut delay = ThreadDelay;
    let rssi = FixedRssi(-55);
    let ip = hal::local_ip();

    let interval = config.telemetry.interval_ms;
    let mut next_cycle = clock.now();

    loop {
        let now = clock.now();
        if now >= next_cycle {
            let report = device.run_cycle(&mut adc, &mut delay, &clock);
            let record = telemetry::compose(
                &config.device.id,
                &report,
                device.relay_snapshot(),
                rssi.rssi_dbm(),
            );
            match link.publish_telemetry(&record) {
                Ok(()) => log::debug!(
                    "telemetry: v1={:.1} i1={:.3} | v3={:.1} i3={:.3}",
                    record.v1, record.i1, record.v3, record.i3
                ),
                Err(err) => log::warn!("telemetry publish failed: {err}"),
            }
            next_cycle = now + interval;
        }

        // service the link until the next cycle is due
        let budget = next_cycle
            .saturating_sub(clock.now())
            .clamp(10, 500);
        for event in link.poll(Duration::from_millis(budget)) {
            match event {
                LinkEvent::Connected => {
                    announce(&mut link, &device, &config, "boot_connected", "boot_connected", &ip, &rssi);
                }
                LinkEvent::Command(payload) => {
                    if device.handle_command(&payload).is_some() {
                        announce(&mut link, &device, &config, "relay_changed", "cmd_applied", &ip, &rssi);
                    }
                }
            }
        }
    }
}

/// Publish the acknowledgment and retained status pair that follows boot
/// and every accepted state change.
fn announce(
    link: &mut MqttLink,
    device: &Device<LoggedRelayPin>,
    config: &NodeConfig,
    reason: &str,
    info: &str,
    ip: &str,
    rssi: &FixedRssi,
) {
    let relay = device.relay_snapshot().as_bits();

    let ack = AckRecord {
        device_id: &config.device.id,
        info,
        relay,
    };
    if let Err(err) = link.publish_ack(&ack) {
        log::warn!("ack publish failed: {err}");
    }

    let status = StatusRecord {
        device_id: &config.device.id,
        reason,
        ip,
        rssi: rssi.rssi_dbm(),
        relay,
    };
    if let Err(err) = link.publish_status(&status) {
        log::warn!("status publish failed: {err}");
    }
}
