//! Node configuration
//!
//! YAML file with `$(VAR)`/`${VAR}` environment placeholders, so secrets
//! and per-site values (broker host, backend URL) stay out of the file.
//! Every field has a default matching the reference hardware, which keeps
//! a bare `device.id` override enough for bring-up.

use std::{fs, path::Path};

use serde::Deserialize;

use voltlet_core::channel::{CalPoint, ChannelConfig, ChannelId, CHANNEL_COUNT};
use voltlet_core::constants::time::{
    DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_INTERVAL_US, DEFAULT_TELEMETRY_INTERVAL_MS,
};
use voltlet_core::relay::Polarity;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub device: DeviceSection,
    pub mqtt: MqttSection,
    pub backend: BackendSection,
    pub telemetry: TelemetrySection,
    pub relays: RelaySection,
    pub channels: [ChannelSection; CHANNEL_COUNT],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Device identity; namespaces the MQTT topics and the backend record.
    pub id: String,
    /// Client-id suffix keeping concurrent bring-up boards apart.
    pub instance: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttSection {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Base URL of the boot-restore backend.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    pub interval_ms: u64,
    pub sample_count: u32,
    pub sample_interval_us: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    /// `active_low` (common opto-isolated boards) or `active_high`.
    pub polarity: String,
    /// Output pins in channel order.
    pub pins: [u8; CHANNEL_COUNT],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSection {
    pub channel: u8,
    pub voltage_pin: u8,
    pub current_pin: u8,
    pub voltage_scale: f32,
    /// Two `[amps, sensor_volts]` reference pairs.
    pub current_points: [[f32; 2]; 2],
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            id: "esp32_001".into(),
            instance: String::new(),
        }
    }
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: "broker.emqx.io".into(),
            port: 1883,
            keep_alive_secs: 30,
            queue_capacity: 64,
        }
    }
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: "https://backend.example.com".into(),
            timeout_secs: 12,
        }
    }
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_TELEMETRY_INTERVAL_MS,
            sample_count: DEFAULT_SAMPLE_COUNT,
            sample_interval_us: DEFAULT_SAMPLE_INTERVAL_US,
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            polarity: "active_low".into(),
            pins: [23, 21],
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device: DeviceSection::default(),
            mqtt: MqttSection::default(),
            backend: BackendSection::default(),
            telemetry: TelemetrySection::default(),
            relays: RelaySection::default(),
            channels: [
                // Reference hardware: ZMPT101B voltage / ZMCT103C current
                // sensors, bench-calibrated per channel.
                ChannelSection {
                    channel: 1,
                    voltage_pin: 33,
                    current_pin: 32,
                    voltage_scale: 840.0,
                    current_points: [[0.170, 0.149], [0.320, 0.212]],
                },
                ChannelSection {
                    channel: 3,
                    voltage_pin: 35,
                    current_pin: 34,
                    voltage_scale: 592.4,
                    current_points: [[0.170, 0.410], [0.330, 0.478]],
                },
            ],
        }
    }
}

impl NodeConfig {
    /// Load YAML from disk, substituting `$(VAR)`/`${VAR}` with
    /// environment variables before parsing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let raw = fs::read_to_string(&path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let config: Self = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(!self.device.id.is_empty(), "device.id must not be empty");
        anyhow::ensure!(
            self.telemetry.sample_count > 0,
            "telemetry.sample_count must be positive"
        );
        for (section, expected) in self.channels.iter().zip(ChannelId::ALL) {
            anyhow::ensure!(
                section.channel == expected.number(),
                "channels must be listed in order [{}, {}]",
                ChannelId::ALL[0].number(),
                ChannelId::ALL[1].number(),
            );
        }
        self.polarity()?;
        Ok(())
    }

    /// Relay drive polarity.
    pub fn polarity(&self) -> Result<Polarity, anyhow::Error> {
        match self.relays.polarity.as_str() {
            "active_low" => Ok(Polarity::ActiveLow),
            "active_high" => Ok(Polarity::ActiveHigh),
            other => anyhow::bail!("unknown relay polarity {other:?}"),
        }
    }

    /// Channel configurations for the engine, in channel order.
    pub fn channel_configs(&self) -> [ChannelConfig; CHANNEL_COUNT] {
        let build = |section: &ChannelSection, id: ChannelId| {
            let [p0, p1] = section.current_points;
            ChannelConfig::new(
                id,
                section.voltage_pin,
                section.current_pin,
                section.voltage_scale,
                [CalPoint::new(p0[0], p0[1]), CalPoint::new(p1[0], p1[1])],
            )
        };
        [
            build(&self.channels[0], ChannelId::ALL[0]),
            build(&self.channels[1], ChannelId::ALL[1]),
        ]
    }
}

/// Expand `$(VAR)` and `${VAR}` placeholders using environment variables.
/// `$$` escapes a literal `$`.
fn expand_env_placeholders(input: &str) -> Result<String, anyhow::Error> {
    use anyhow::Context;

    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match it.peek().copied() {
            Some('$') => {
                it.next();
                out.push('$');
            }
            Some(open @ ('(' | '{')) => {
                it.next();
                let close = if open == '(' { ')' } else { '}' };
                let var = read_until(&mut it, close)
                    .with_context(|| format!("unterminated env placeholder: missing {close:?}"))?;
                let val = std::env::var(&var)
                    .with_context(|| format!("missing environment variable: {var}"))?;
                out.push_str(&val);
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

/// Collect characters up to `end`, consuming the delimiter.
fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_reference_hardware() {
        let config = NodeConfig::default();
        assert_eq!(config.device.id, "esp32_001");
        assert_eq!(config.telemetry.interval_ms, 2_000);
        assert!(matches!(config.polarity(), Ok(Polarity::ActiveLow)));

        let [ch1, ch3] = config.channel_configs();
        assert_eq!(ch1.id, ChannelId::Ch1);
        assert_eq!(ch1.voltage_pin, 33);
        assert_eq!(ch3.id, ChannelId::Ch3);
        assert_eq!(ch3.voltage_scale, 592.4);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let yaml = "
device:
  id: lab_bench_7
mqtt:
  host: 192.168.31.108
";
        let config: NodeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.device.id, "lab_bench_7");
        assert_eq!(config.mqtt.host, "192.168.31.108");
        // untouched sections keep their defaults
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.backend.timeout_secs, 12);
    }

    #[test]
    fn env_placeholders_expand() {
        std::env::set_var("VOLTLET_TEST_HOST", "broker.lan");
        let out = expand_env_placeholders("host: $(VOLTLET_TEST_HOST)").unwrap();
        assert_eq!(out, "host: broker.lan");

        let out = expand_env_placeholders("host: ${VOLTLET_TEST_HOST}").unwrap();
        assert_eq!(out, "host: broker.lan");

        assert_eq!(expand_env_placeholders("cost: $$5").unwrap(), "cost: $5");
        assert_eq!(expand_env_placeholders("plain $ sign").unwrap(), "plain $ sign");
    }

    #[test]
    fn missing_env_var_is_an_error() {
        assert!(expand_env_placeholders("$(VOLTLET_TEST_UNSET_VAR)").is_err());
        assert!(expand_env_placeholders("$(UNTERMINATED").is_err());
    }

    #[test]
    fn bad_polarity_rejected() {
        let mut config = NodeConfig::default();
        config.relays.polarity = "inverted".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_order_channels_rejected() {
        let mut config = NodeConfig::default();
        config.channels.swap(0, 1);
        assert!(config.validate().is_err());
    }
}
