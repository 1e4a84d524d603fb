//! Device context: the single aggregate behind the main loop
//!
//! Owns everything mutable in the system - per-channel calibrations and
//! energy totals, the relay controller - and threads it through the serial
//! measurement cycle. There are no ambient globals; the loop holds exactly
//! one `Device` and passes hardware in by reference, which is also what
//! makes the whole cycle runnable against synthetic inputs in tests.
//!
//! A cycle is strictly serial per the execution model: channel 1's two
//! sampling windows, then channel 3's, then integration. The process
//! blocks for the summed window time and commands wait until the cycle
//! finishes.

use crate::calibration::{ChannelCalibration, Measurement};
use crate::channel::{ChannelConfig, ChannelId, CHANNEL_COUNT};
use crate::energy::EnergyAccumulator;
use crate::errors::CalibrationError;
use crate::relay::{RelayController, RelaySnapshot};
use crate::sampling::SampleEngine;
use crate::time::{DelaySource, TimeSource, Timestamp};
use crate::traits::{AdcReader, RelayPin};

#[cfg(feature = "serde")]
use crate::command::{self, CommandAck};

/// One channel's output of one measurement cycle.
#[derive(Debug, Clone, Copy)]
pub struct ChannelReading {
    /// Calibrated voltage/current/power with the clipping flag.
    pub measurement: Measurement,
    /// Cumulative energy after this cycle's integration (Wh).
    pub energy_wh: f64,
}

/// All channels' outputs of one measurement cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    /// Readings in channel order.
    pub readings: [ChannelReading; CHANNEL_COUNT],
    /// Timestamp the cycle integrated against (ms).
    pub timestamp_ms: Timestamp,
}

struct ChannelSlot {
    config: ChannelConfig,
    calibration: ChannelCalibration,
    energy: EnergyAccumulator,
}

/// The device aggregate: channels, calibrations, energy state, relays.
pub struct Device<P: RelayPin> {
    channels: [ChannelSlot; CHANNEL_COUNT],
    engine: SampleEngine,
    relays: RelayController<P>,
}

impl<P: RelayPin> Device<P> {
    /// Build the device context, deriving calibration coefficients once.
    ///
    /// `configs` in channel order ([`ChannelId::ALL`]).
    pub fn new(
        configs: [ChannelConfig; CHANNEL_COUNT],
        engine: SampleEngine,
        relays: RelayController<P>,
    ) -> Result<Self, CalibrationError> {
        let [a, b] = configs;
        let channels = [Self::slot(a)?, Self::slot(b)?];
        Ok(Self {
            channels,
            engine,
            relays,
        })
    }

    fn slot(config: ChannelConfig) -> Result<ChannelSlot, CalibrationError> {
        Ok(ChannelSlot {
            calibration: ChannelCalibration::new(&config)?,
            config,
            energy: EnergyAccumulator::new(),
        })
    }

    /// Run the full serial measurement cycle over every channel.
    ///
    /// Blocks for the summed sampling windows. The cycle timestamp is
    /// taken once, up front, and every channel integrates against it.
    pub fn run_cycle<A, D, T>(&mut self, adc: &mut A, delay: &mut D, clock: &T) -> CycleReport
    where
        A: AdcReader,
        D: DelaySource,
        T: TimeSource,
    {
        let now = clock.now();
        let readings = [
            self.measure_channel(0, adc, delay, now),
            self.measure_channel(1, adc, delay, now),
        ];
        CycleReport {
            readings,
            timestamp_ms: now,
        }
    }

    fn measure_channel<A, D>(
        &mut self,
        index: usize,
        adc: &mut A,
        delay: &mut D,
        now: Timestamp,
    ) -> ChannelReading
    where
        A: AdcReader,
        D: DelaySource,
    {
        let slot = &mut self.channels[index];
        let voltage_stats = self.engine.sample(adc, delay, slot.config.voltage_pin);
        let current_stats = self.engine.sample(adc, delay, slot.config.current_pin);
        let measurement = slot.calibration.measure(&voltage_stats, &current_stats);
        // Clipped cycles already carry a substituted zero power, so the
        // integrator books no energy for them.
        let energy_wh = slot.energy.integrate(measurement.power, now);

        ChannelReading {
            measurement,
            energy_wh,
        }
    }

    /// Handle one raw inbound command payload (see [`crate::command`]).
    #[cfg(feature = "serde")]
    pub fn handle_command(&mut self, payload: &[u8]) -> Option<CommandAck> {
        command::handle(payload, &mut self.relays)
    }

    /// Apply an externally restored state addressed by raw identity.
    /// Unknown identities are ignored.
    pub fn apply_relay_raw(&mut self, raw_channel: u8, on: bool) {
        self.relays.apply_raw(raw_channel, on);
    }

    /// Apply a state to a known channel.
    pub fn apply_relay(&mut self, id: ChannelId, on: bool) {
        self.relays.apply(id, on);
    }

    /// Current relay states.
    pub fn relay_snapshot(&self) -> RelaySnapshot {
        self.relays.snapshot()
    }

    /// Cumulative energy of one channel (Wh).
    pub fn energy_wh(&self, id: ChannelId) -> f64 {
        self.channels[id.index()].energy.total_wh()
    }

    /// Duration one full cycle blocks for, in microseconds.
    pub fn cycle_blocking_us(&self) -> u64 {
        // two windows per channel: voltage pin, then current pin
        self.engine.window_us() * 2 * CHANNEL_COUNT as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::CalPoint;
    use crate::relay::Polarity;
    use crate::time::{FixedClock, NoDelay};

    struct NullPin;
    impl RelayPin for NullPin {
        fn set_level(&mut self, _high: bool) {}
    }

    /// Per-pin synthetic waveforms: constant mid-rail everywhere except
    /// the pins given an alternating swing.
    struct WaveAdc {
        swings: [(u8, u16); 2],
        tick: u32,
    }

    impl AdcReader for WaveAdc {
        fn read(&mut self, pin: u8) -> u16 {
            self.tick = self.tick.wrapping_add(1);
            let mid = 2048u16;
            for (p, d) in self.swings {
                if p == pin {
                    return if self.tick % 2 == 0 { mid - d } else { mid + d };
                }
            }
            mid
        }
    }

    fn configs() -> [ChannelConfig; 2] {
        [
            ChannelConfig::new(
                ChannelId::Ch1,
                33,
                32,
                840.0,
                [CalPoint::new(0.170, 0.149), CalPoint::new(0.320, 0.212)],
            ),
            ChannelConfig::new(
                ChannelId::Ch3,
                35,
                34,
                592.4,
                [CalPoint::new(0.170, 0.410), CalPoint::new(0.330, 0.478)],
            ),
        ]
    }

    fn device() -> Device<NullPin> {
        Device::new(
            configs(),
            SampleEngine::new(200, 0),
            RelayController::new([NullPin, NullPin], Polarity::ActiveLow),
        )
        .unwrap()
    }

    #[test]
    fn first_cycle_reads_but_books_no_energy() {
        let mut device = device();
        let clock = FixedClock::new(1_000);
        let mut adc = WaveAdc {
            swings: [(33, 400), (32, 200)],
            tick: 0,
        };

        let report = device.run_cycle(&mut adc, &mut NoDelay, &clock);
        let ch1 = &report.readings[0];

        assert!(ch1.measurement.voltage > 0.0);
        assert!(ch1.measurement.current > 0.0);
        assert_eq!(ch1.energy_wh, 0.0, "no previous timestamp");
    }

    #[test]
    fn energy_accrues_across_cycles() {
        let mut device = device();
        let mut clock = FixedClock::new(0);
        let mut adc = WaveAdc {
            swings: [(33, 400), (32, 200)],
            tick: 0,
        };

        device.run_cycle(&mut adc, &mut NoDelay, &clock);
        clock.advance(3_600_000);
        let report = device.run_cycle(&mut adc, &mut NoDelay, &clock);

        let ch1 = &report.readings[0];
        let expected = ch1.measurement.power as f64; // one hour at this power
        assert!((ch1.energy_wh - expected).abs() / expected < 0.05);
        assert_eq!(device.energy_wh(ChannelId::Ch1), ch1.energy_wh);
    }

    #[test]
    fn quiet_channel_reads_all_zero() {
        let mut device = device();
        let clock = FixedClock::new(0);
        // channel 3 pins (35/34) get no swing: flat mid-rail
        let mut adc = WaveAdc {
            swings: [(33, 400), (32, 200)],
            tick: 0,
        };

        let report = device.run_cycle(&mut adc, &mut NoDelay, &clock);
        let ch3 = &report.readings[1];

        assert_eq!(ch3.measurement.voltage, 0.0);
        assert_eq!(ch3.measurement.current, 0.0);
        assert_eq!(ch3.measurement.power, 0.0);
        assert!(!ch3.measurement.clipped);
    }

    #[test]
    fn command_path_reaches_relays() {
        let mut device = device();
        let ack = device.handle_command(br#"{"ch":3,"state":1}"#).unwrap();

        assert_eq!(ack.relay.as_bits(), [0, 1]);
        assert_eq!(device.relay_snapshot().as_bits(), [0, 1]);
    }

    #[test]
    fn restored_state_applies_by_raw_identity() {
        let mut device = device();
        device.apply_relay_raw(1, true);
        device.apply_relay_raw(3, false);
        device.apply_relay_raw(9, true); // ignored

        assert_eq!(device.relay_snapshot().as_bits(), [1, 0]);
    }

    #[test]
    fn cycle_blocking_time_covers_all_windows() {
        let device = device();
        // 200 samples x 0 us x 2 pins x 2 channels
        assert_eq!(device.cycle_blocking_us(), 0);

        let real = Device::new(
            configs(),
            SampleEngine::new(2_000, 200),
            RelayController::new([NullPin, NullPin], Polarity::ActiveLow),
        )
        .unwrap();
        assert_eq!(real.cycle_blocking_us(), 1_600_000);
    }
}
