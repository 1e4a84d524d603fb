//! Telemetry record composition
//!
//! Pulls one cycle's measurements, energy totals and relay snapshot into
//! the periodic wire record. Values are rounded here - volts and watts to
//! two decimals, amps and watt-hours to three - so the wire carries the
//! published precision and consumers never see float dust.
//!
//! The summed totals follow the deployed convention: channel 1 voltage is
//! the node's main voltage reference, current/power/energy are sums.

use libm::round;

use crate::time::Timestamp;

#[cfg(feature = "serde")]
use crate::device::CycleReport;
#[cfg(feature = "serde")]
use crate::payload::TelemetryRecord;
#[cfg(feature = "serde")]
use crate::relay::RelaySnapshot;

/// Round to two decimal places (volts, watts).
#[inline]
pub fn round2(value: f64) -> f64 {
    round(value * 100.0) / 100.0
}

/// Round to three decimal places (amps, watt-hours).
#[inline]
pub fn round3(value: f64) -> f64 {
    round(value * 1000.0) / 1000.0
}

/// Milliseconds to whole wire-format seconds.
#[inline]
pub fn to_wire_seconds(timestamp_ms: Timestamp) -> u64 {
    timestamp_ms / 1000
}

/// Compose the periodic telemetry record for one finished cycle.
#[cfg(feature = "serde")]
pub fn compose<'a>(
    device_id: &'a str,
    report: &CycleReport,
    relay: RelaySnapshot,
    rssi: i32,
) -> TelemetryRecord<'a> {
    let [ch1, ch3] = &report.readings;
    let (m1, m3) = (&ch1.measurement, &ch3.measurement);

    TelemetryRecord {
        device_id,
        ts: to_wire_seconds(report.timestamp_ms),

        v1: round2(m1.voltage as f64),
        i1: round3(m1.current as f64),
        p1: round2(m1.power as f64),
        e1_wh: round3(ch1.energy_wh),

        v3: round2(m3.voltage as f64),
        i3: round3(m3.current as f64),
        p3: round2(m3.power as f64),
        e3_wh: round3(ch3.energy_wh),

        voltage: round2(m1.voltage as f64),
        current: round3((m1.current + m3.current) as f64),
        power: round2((m1.power + m3.power) as f64),
        energy_wh: round3(ch1.energy_wh + ch3.energy_wh),

        rssi,
        relay: relay.as_bits(),
        clip_i1: u8::from(m1.clipped),
        clip_i3: u8::from(m3.clipped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Measurement;
    use crate::device::ChannelReading;

    fn reading(voltage: f32, current: f32, clipped: bool, energy_wh: f64) -> ChannelReading {
        ChannelReading {
            measurement: Measurement {
                voltage,
                current,
                power: voltage * current,
                clipped,
            },
            energy_wh,
        }
    }

    #[test]
    fn rounding_matches_published_precision() {
        assert_eq!(round2(229.7349), 229.73);
        assert_eq!(round2(229.736), 229.74);
        assert_eq!(round3(0.32149), 0.321);
        assert_eq!(round3(0.3216), 0.322);
    }

    #[test]
    fn wire_seconds_truncate() {
        assert_eq!(to_wire_seconds(1999), 1);
        assert_eq!(to_wire_seconds(2000), 2);
    }

    #[test]
    fn compose_fills_per_channel_and_totals() {
        let report = CycleReport {
            readings: [
                reading(230.004, 0.321, false, 1.23456),
                reading(229.5, 0.1, false, 0.5),
            ],
            timestamp_ms: 42_000,
        };
        let record = compose("esp32_001", &report, RelaySnapshot([true, false]), -61);

        assert_eq!(record.device_id, "esp32_001");
        assert_eq!(record.ts, 42);
        assert_eq!(record.v1, 230.0);
        assert_eq!(record.i1, 0.321);
        assert_eq!(record.e1_wh, 1.235);
        assert_eq!(record.v3, 229.5);

        // totals: v1 is the reference, the rest are sums
        assert_eq!(record.voltage, record.v1);
        assert_eq!(record.current, 0.421);
        assert_eq!(record.energy_wh, round3(1.23456 + 0.5));
        assert_eq!(record.relay, [1, 0]);
        assert_eq!((record.clip_i1, record.clip_i3), (0, 0));
    }

    #[test]
    fn clip_flags_follow_measurements() {
        let report = CycleReport {
            readings: [
                reading(230.0, 0.0, true, 0.0),
                reading(0.0, 0.0, false, 0.0),
            ],
            timestamp_ms: 0,
        };
        let record = compose("x", &report, RelaySnapshot([false, false]), -50);

        assert_eq!(record.clip_i1, 1);
        assert_eq!(record.clip_i3, 0);
        assert_eq!(record.p1, 0.0, "clipped channel reports zero power");
    }
}
