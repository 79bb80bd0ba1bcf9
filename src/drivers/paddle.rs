// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Unit conversions for the paddle sensors.
//!
//! The register wrappers in `hw` return raw counts; everything here is plain arithmetic so it can
//! be checked on the host.

use crate::config::REDUCTION_RATIO;

/// Convert a motor shaft angle into the paddle angle seen by the user.
#[inline]
pub fn paddle_angle_deg(shaft_deg: f32) -> f32 {
    shaft_deg / REDUCTION_RATIO
}

/// Convert a raw ADC reading into volts.
#[inline]
pub fn adc_to_volts(raw: u16, vref: f32, bits: u8) -> f32 {
    let full_scale = ((1u32 << bits) - 1) as f32;
    raw as f32 * vref / full_scale
}

/// Quadrature encoder scaling.
///
/// Geometry parameters:
/// - `counts_per_rev` — encoder edges per motor shaft revolution (4x the line count in
///   quadrature mode).
#[derive(Copy, Clone, Debug)]
pub struct EncoderScale {
    counts_per_rev: u32,
}

impl EncoderScale {
    pub const fn new(counts_per_rev: u32) -> Self {
        Self { counts_per_rev }
    }

    /// Signed counter value to shaft degrees.
    #[inline]
    pub fn shaft_deg(&self, counts: i32) -> f32 {
        counts as f32 * 360.0 / self.counts_per_rev as f32
    }
}

/// Current sensor calibration: zero-current offset and gain.
///
/// The offset is measured once at start-up with the bridge idle; the current loop must not be
/// started before this has happened.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurrentSenseCal {
    /// Sensor output at zero current [V].
    pub offset_v: f32,
    /// Sensor gain [A/V].
    pub amps_per_volt: f32,
}

impl CurrentSenseCal {
    pub const fn uncalibrated(amps_per_volt: f32) -> Self {
        Self {
            offset_v: 0.0,
            amps_per_volt,
        }
    }

    /// Average idle readings into the zero-current offset. Keeps the old offset if `samples` is
    /// empty.
    pub fn calibrate<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = f32>,
    {
        let (sum, n) = samples
            .into_iter()
            .fold((0.0f32, 0u32), |(sum, n), v| (sum + v, n + 1));
        if n > 0 {
            self.offset_v = sum / n as f32;
        }
    }

    /// Sensor voltage to motor current.
    #[inline]
    pub fn amps(&self, volts: f32) -> f32 {
        (volts - self.offset_v) * self.amps_per_volt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paddle_angle_applies_reduction() {
        assert_eq!(paddle_angle_deg(150.0), 10.0);
        assert_eq!(paddle_angle_deg(-REDUCTION_RATIO), -1.0);
    }

    #[test]
    fn adc_full_scale_is_vref() {
        assert_eq!(adc_to_volts(4095, 3.3, 12), 3.3);
        assert_eq!(adc_to_volts(0, 3.3, 12), 0.0);
    }

    #[test]
    fn encoder_counts_to_degrees() {
        let scale = EncoderScale::new(2000);
        assert_eq!(scale.shaft_deg(500), 90.0);
        assert_eq!(scale.shaft_deg(-2000), -360.0);
    }

    #[test]
    fn calibration_removes_offset() {
        let mut cal = CurrentSenseCal::uncalibrated(2.0);
        cal.calibrate([1.6, 1.7, 1.65, 1.65]);
        assert!((cal.offset_v - 1.65).abs() < 1e-6);
        assert!(cal.amps(1.65).abs() < 1e-5);
        assert!((cal.amps(2.15) - 1.0).abs() < 1e-5);

        cal.calibrate(core::iter::empty());
        assert!((cal.offset_v - 1.65).abs() < 1e-6);
    }
}
