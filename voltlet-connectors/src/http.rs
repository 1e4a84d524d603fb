//! Boot-restore HTTP client
//!
//! One GET per boot against the backend's per-device resource, asking for
//! the relay state the device last reported before it lost power. Every
//! failure mode - refused connection, non-200 status, unparseable body,
//! missing fields - folds into the same safe answer: both channels off.
//! The node then proceeds normally; this call is never retried by the
//! core and never fatal.

use std::time::Duration;

use voltlet_core::channel::CHANNEL_COUNT;

use crate::ConnectorError;

/// Boot-restore configuration.
#[derive(Debug, Clone)]
pub struct RestoreConfig {
    /// Backend base URL, e.g. `https://backend.example.com`.
    pub base_url: String,
    /// Request timeout covering connect and body.
    pub timeout: Duration,
}

impl RestoreConfig {
    /// Configuration with the default 12 s timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(12),
        }
    }

    /// Override the request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// One-shot client for the boot-restore GET.
pub struct BootRestoreClient {
    config: RestoreConfig,
    agent: ureq::Agent,
}

impl BootRestoreClient {
    /// Create the client.
    ///
    /// Rejects base URLs without an HTTP scheme up front; a typo here
    /// should fail loudly at startup rather than masquerade as a backend
    /// outage on every boot.
    pub fn new(config: RestoreConfig) -> Result<Self, ConnectorError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ConnectorError::Transport(format!(
                "base URL must start with http:// or https://, got {}",
                config.base_url
            )));
        }

        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();

        Ok(Self { config, agent })
    }

    /// Fetch the last known relay state for `device_id`.
    ///
    /// Infallible by contract: any failure logs the reason and returns
    /// the safe default (all channels off).
    pub fn fetch_relay_state(&self, device_id: &str) -> [bool; CHANNEL_COUNT] {
        const OFF: [bool; CHANNEL_COUNT] = [false; CHANNEL_COUNT];

        let url = format!("{}/api/device/{}", self.config.base_url, device_id);

        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                log::warn!("boot restore: GET {url} -> {code}, default off");
                return OFF;
            }
            Err(err) => {
                log::warn!("boot restore: GET {url} failed ({err}), default off");
                return OFF;
            }
        };

        if response.status() != 200 {
            log::warn!(
                "boot restore: GET {url} -> {}, default off",
                response.status()
            );
            return OFF;
        }

        let body = match response.into_string() {
            Ok(body) => body,
            Err(err) => {
                log::warn!("boot restore: unreadable body ({err}), default off");
                return OFF;
            }
        };

        match parse_relay_states(&body) {
            Some(states) => {
                log::info!(
                    "boot restore: relay={:?}",
                    states.map(u8::from)
                );
                states
            }
            None => {
                log::warn!("boot restore: body did not carry relay states, default off");
                OFF
            }
        }
    }
}

/// Pull the first two `relay` entries out of a backend device record.
///
/// Entries beyond the channel count are ignored, missing entries default
/// to off. Accepts the backend's 0/1 integers and tolerates booleans.
fn parse_relay_states(body: &str) -> Option<[bool; CHANNEL_COUNT]> {
    let doc: serde_json::Value = serde_json::from_str(body).ok()?;
    let relay = doc.get("relay")?.as_array()?;

    let mut states = [false; CHANNEL_COUNT];
    for (slot, value) in states.iter_mut().zip(relay.iter()) {
        *slot = match value {
            serde_json::Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            serde_json::Value::Bool(b) => *b,
            _ => false,
        };
    }
    Some(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_record() {
        let body = r#"{"deviceId":"esp32_001","relay":[1,0],"updatedAt":"2024-04-01"}"#;
        assert_eq!(parse_relay_states(body), Some([true, false]));
    }

    #[test]
    fn missing_entries_default_off() {
        assert_eq!(parse_relay_states(r#"{"relay":[1]}"#), Some([true, false]));
        assert_eq!(parse_relay_states(r#"{"relay":[]}"#), Some([false, false]));
    }

    #[test]
    fn extra_entries_ignored() {
        assert_eq!(
            parse_relay_states(r#"{"relay":[0,1,1,1]}"#),
            Some([false, true])
        );
    }

    #[test]
    fn tolerates_booleans_and_nonzero() {
        assert_eq!(
            parse_relay_states(r#"{"relay":[true,false]}"#),
            Some([true, false])
        );
        assert_eq!(parse_relay_states(r#"{"relay":[2,0]}"#), Some([true, false]));
    }

    #[test]
    fn malformed_bodies_are_none() {
        assert_eq!(parse_relay_states(""), None);
        assert_eq!(parse_relay_states("not json"), None);
        assert_eq!(parse_relay_states("null"), None);
        assert_eq!(parse_relay_states(r#"{"other":1}"#), None);
        assert_eq!(parse_relay_states(r#"{"relay":"on"}"#), None);
    }

    #[test]
    fn scheme_is_validated_at_construction() {
        assert!(BootRestoreClient::new(RestoreConfig::new("not-a-url")).is_err());
        assert!(BootRestoreClient::new(RestoreConfig::new("https://backend.local")).is_ok());
        assert!(
            BootRestoreClient::new(RestoreConfig::new("http://192.168.1.106:5000")).is_ok()
        );
    }

    #[test]
    fn config_timeout_override() {
        let config = RestoreConfig::new("https://backend.local").timeout_secs(3);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
