//! Calibration from raw window statistics to physical units
//!
//! ## Voltage path
//!
//! RMS counts are referred back to converter-input volts through the known
//! full scale and reference, then scaled by the channel's empirical factor
//! to line volts. Readings under the sensor noise floor are floored to
//! zero; readings past the sanity bound are clamped so a calibration fault
//! cannot feed a runaway number downstream.
//!
//! ## Current path
//!
//! Current uses a two-point linear model `I = A·v + B` solved once at
//! initialization from two bench reference pairs. Three guards apply, in
//! order:
//!
//! 1. **Saturation**: if the window's raw extremes touch the converter
//!    rails, the reading is *invalid* - clipped, distinct from zero. The
//!    true signal left the measurable range and the computed RMS is
//!    garbage.
//! 2. **Noise floor**: sensor output under the idle-noise threshold reads
//!    as exactly zero (a real "no load", not an invalid one).
//! 3. **Zero floor**: the affine model can resolve slightly negative near
//!    the origin; physical current cannot.

use crate::channel::{CalPoint, ChannelConfig};
use crate::constants::adc::{
    counts_to_volts, SATURATION_HIGH_COUNTS, SATURATION_LOW_COUNTS,
};
use crate::constants::limits::{
    CURRENT_NOISE_FLOOR_VRMS, VOLTAGE_CLAMP_MAX_VOLTS, VOLTAGE_NOISE_FLOOR_VOLTS,
};
use crate::errors::CalibrationError;
use crate::sampling::RawStats;

/// Two-point linear current model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentModel {
    slope: f32,
    intercept: f32,
}

impl CurrentModel {
    /// Solve `I = A·v + B` through two reference pairs.
    ///
    /// Rejects pairs whose sensor outputs coincide; the slope would be
    /// infinite and every later reading garbage.
    pub fn from_points(points: [CalPoint; 2]) -> Result<Self, CalibrationError> {
        let [p0, p1] = points;
        let dv = p1.volts - p0.volts;
        if dv == 0.0 {
            return Err(CalibrationError::DegeneratePoints { volts: p0.volts });
        }

        let slope = (p1.amps - p0.amps) / dv;
        Ok(Self {
            slope,
            intercept: p0.amps - slope * p0.volts,
        })
    }

    /// Model output for a sensor reading, before any gating.
    pub fn amps(&self, vout_rms: f32) -> f32 {
        self.slope * vout_rms + self.intercept
    }
}

/// One channel's calibrated measurement for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Line RMS voltage (V).
    pub voltage: f32,
    /// Load RMS current (A). Zero when the window clipped.
    pub current: f32,
    /// Instantaneous real power estimate (W). Zero when clipped.
    pub power: f32,
    /// True when the current window touched the converter rails; the
    /// current and power fields carry substituted zeros this cycle.
    pub clipped: bool,
}

/// Per-channel conversion from raw statistics to physical units.
///
/// Built once at initialization from [`ChannelConfig`]; the reference
/// pairs stay configuration data, only the solved coefficients live here.
#[derive(Debug, Clone, Copy)]
pub struct ChannelCalibration {
    voltage_scale: f32,
    current: CurrentModel,
}

impl ChannelCalibration {
    /// Derive the channel's coefficients from its configuration.
    pub fn new(config: &ChannelConfig) -> Result<Self, CalibrationError> {
        Ok(Self {
            voltage_scale: config.voltage_scale,
            current: CurrentModel::from_points(config.current_points)?,
        })
    }

    /// Line RMS voltage from a voltage-pin window.
    pub fn voltage(&self, stats: &RawStats) -> f32 {
        let line = counts_to_volts(stats.rms) * self.voltage_scale;
        if line < VOLTAGE_NOISE_FLOOR_VOLTS {
            0.0
        } else if line > VOLTAGE_CLAMP_MAX_VOLTS {
            VOLTAGE_CLAMP_MAX_VOLTS
        } else {
            line
        }
    }

    /// Load RMS current from a current-pin window.
    ///
    /// `None` means the window clipped and no reliable reading exists this
    /// cycle. A quiet input is `Some(0.0)`, which is a different statement.
    pub fn current(&self, stats: &RawStats) -> Option<f32> {
        if stats.min <= SATURATION_LOW_COUNTS || stats.max >= SATURATION_HIGH_COUNTS {
            return None;
        }

        let vout = counts_to_volts(stats.rms);
        if vout < CURRENT_NOISE_FLOOR_VRMS {
            return Some(0.0);
        }

        Some(self.current.amps(vout).max(0.0))
    }

    /// Full per-cycle measurement from both windows of a channel.
    ///
    /// A clipped current substitutes zero into current and power and sets
    /// the flag, so energy integration sees no contribution this cycle
    /// while telemetry still reports the condition.
    pub fn measure(&self, voltage_stats: &RawStats, current_stats: &RawStats) -> Measurement {
        let voltage = self.voltage(voltage_stats);
        let (current, clipped) = match self.current(current_stats) {
            Some(amps) => (amps, false),
            None => (0.0, true),
        };

        Measurement {
            voltage,
            current,
            power: voltage * current,
            clipped,
        }
    }
}
