//! Host-side hardware implementations
//!
//! Development and soak-test stand-ins for the peripherals a deployed
//! board wires in through its vendor HAL. The engine only sees the core
//! traits, so swapping these for real ADC/GPIO drivers is a link-time
//! concern, not a code change.

use std::net::UdpSocket;
use std::time::Duration;

use voltlet_core::traits::{AdcReader, LinkQuality, RelayPin};
use voltlet_core::time::DelaySource;

/// Synthetic converter producing a mid-rail alternating waveform per pin.
///
/// Amplitude is derived from the pin number so both channels of a bench
/// node read plausible, distinct, stable values. Deterministic: no RNG,
/// same counts every window.
pub struct SyntheticAdc {
    tick: u32,
}

impl SyntheticAdc {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl Default for SyntheticAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcReader for SyntheticAdc {
    fn read(&mut self, pin: u8) -> u16 {
        self.tick = self.tick.wrapping_add(1);
        let mid = 2048i32;
        // a few hundred counts of swing, varying by pin
        let amplitude = 150 + (pin as i32 % 8) * 60;
        let sign = if self.tick % 2 == 0 { 1 } else { -1 };
        (mid + sign * amplitude) as u16
    }
}

/// Inter-sample pacing via the OS sleep.
///
/// Sleep granularity on a host is far coarser than a hardware timer, so
/// short windows stretch; acceptable for bench runs where cadence, not
/// sampling bandwidth, is under test.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl DelaySource for ThreadDelay {
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Relay output that logs level transitions instead of driving a coil.
pub struct LoggedRelayPin {
    pin: u8,
    level: Option<bool>,
}

impl LoggedRelayPin {
    pub fn new(pin: u8) -> Self {
        Self { pin, level: None }
    }
}

impl RelayPin for LoggedRelayPin {
    fn set_level(&mut self, high: bool) {
        if self.level != Some(high) {
            log::info!(
                "relay pin {}: {}",
                self.pin,
                if high { "high" } else { "low" }
            );
        }
        self.level = Some(high);
    }
}

/// Fixed link-quality figure for wired/host runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedRssi(pub i32);

impl LinkQuality for FixedRssi {
    fn rssi_dbm(&self) -> i32 {
        self.0
    }
}

/// Best-effort local address for the status record.
///
/// Connecting a UDP socket performs no traffic; it just asks the kernel
/// which interface would route. Falls back to the unspecified address on
/// hosts with no route.
pub fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "0.0.0.0".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_adc_alternates_around_mid_rail() {
        let mut adc = SyntheticAdc::new();
        let first = adc.read(33);
        let second = adc.read(33);

        assert_ne!(first, second);
        assert_eq!((first as i32 + second as i32) / 2, 2048);
    }

    #[test]
    fn synthetic_adc_amplitude_depends_on_pin() {
        let mut adc = SyntheticAdc::new();
        let a = (adc.read(33) as i32 - 2048).unsigned_abs();
        let b = (adc.read(34) as i32 - 2048).unsigned_abs();
        assert_ne!(a, b);
    }

    #[test]
    fn logged_pin_records_level() {
        let mut pin = LoggedRelayPin::new(23);
        pin.set_level(true);
        pin.set_level(true);
        pin.set_level(false);
        assert_eq!(pin.level, Some(false));
    }

    #[test]
    fn local_ip_is_well_formed() {
        let ip = local_ip();
        assert!(ip.parse::<std::net::IpAddr>().is_ok(), "got {ip}");
    }
}
