// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board constants, host-tunable parameters and published telemetry.
//!
//! [`Tunables`] is written by the host-facing side (lowest priority) and read once per field per
//! tick by the haptic loop. [`Telemetry`] goes the other way. Both are plain collections of atomics:
//! each field is consistent on its own, no multi-field transaction is offered.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use thiserror::Error;

use crate::control::state::ControlSnapshot;
use crate::sync::AtomicF32;

/// Motor shaft revolutions per paddle revolution.
pub const REDUCTION_RATIO: f32 = 15.0;

/// Continuous torque rating of the motor [N.m]; the setpoint never exceeds it.
pub const MOTOR_NOMINAL_TORQUE: f32 = 0.0385;

/// Motor torque constant [N.m/A].
pub const MOTOR_TORQUE_CONST: f32 = 0.0302;

/// H-bridge supply voltage [V].
pub const BRIDGE_SUPPLY_VOLTAGE: f32 = 24.0;

/// Default haptic loop period [us].
pub const DEFAULT_PERIOD_US: u32 = 350;

/// Shortest haptic loop period accepted from the host [us].
pub const MIN_PERIOD_US: u32 = 100;

/// Longest haptic loop period accepted from the host [us].
pub const MAX_PERIOD_US: u32 = 100_000;

/// Current loop period [us].
pub const CURRENT_LOOP_PERIOD_US: u32 = 50;

/// Paddle-to-paddle link baud rate.
pub const LINK_BAUD: u32 = 576_000;

/// Longest emulated delay, in samples (one sample = one exchanged `f32`).
pub const MAX_DELAY_SAMPLES: u16 = 1000;

/// Storage slots of the delay queue: four bytes per sample plus the ring's spare slot.
pub const DELAY_QUEUE_SLOTS: usize = 4 * MAX_DELAY_SAMPLES as usize + 1;

/// Low-pass cutoff applied to paddle angles [Hz].
pub const FILTER_CUTOFF_HZ: f32 = 50.0;

/// Errors raised when a tunable is written with an unacceptable value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("tick period out of range")]
    PeriodOutOfRange,
    #[error("delay longer than the delay queue")]
    DelayOutOfRange,
    #[error("value must be finite")]
    NonFinite,
}

/// Host-tunable parameters of the haptic loop.
#[derive(Debug)]
pub struct Tunables {
    kp: AtomicF32,
    ki: AtomicF32,
    kd: AtomicF32,
    mirror_enable: AtomicBool,
    pid_enable: AtomicBool,
    io_passthrough: AtomicBool,
    delay_samples: AtomicU16,
    period_us: AtomicU32,
}

/// Per-tick copy of the tunables, taken with one load per field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TunableValues {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub mirror_enable: bool,
    pub pid_enable: bool,
    pub io_passthrough: bool,
    pub delay_samples: u16,
    pub period_us: u32,
}

impl TunableValues {
    /// Configured tick period in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.period_us as f32 / 1_000_000.0
    }
}

impl Tunables {
    /// Gains as shipped on the paddle: position loop in degrees in, N.m out.
    pub const fn new() -> Self {
        Self {
            kp: AtomicF32::new(0.001),
            ki: AtomicF32::new(0.0),
            kd: AtomicF32::new(0.0001),
            mirror_enable: AtomicBool::new(false),
            pid_enable: AtomicBool::new(false),
            io_passthrough: AtomicBool::new(false),
            delay_samples: AtomicU16::new(0),
            period_us: AtomicU32::new(DEFAULT_PERIOD_US),
        }
    }

    pub fn load(&self) -> TunableValues {
        TunableValues {
            kp: self.kp.load(),
            ki: self.ki.load(),
            kd: self.kd.load(),
            mirror_enable: self.mirror_enable.load(Ordering::Relaxed),
            pid_enable: self.pid_enable.load(Ordering::Relaxed),
            io_passthrough: self.io_passthrough.load(Ordering::Relaxed),
            delay_samples: self.delay_samples.load(Ordering::Relaxed),
            period_us: self.period_us.load(Ordering::Relaxed),
        }
    }

    pub fn kp(&self) -> f32 {
        self.kp.load()
    }

    pub fn ki(&self) -> f32 {
        self.ki.load()
    }

    pub fn kd(&self) -> f32 {
        self.kd.load()
    }

    pub fn set_kp(&self, kp: f32) -> Result<(), ConfigError> {
        store_finite(&self.kp, kp)
    }

    pub fn set_ki(&self, ki: f32) -> Result<(), ConfigError> {
        store_finite(&self.ki, ki)
    }

    pub fn set_kd(&self, kd: f32) -> Result<(), ConfigError> {
        store_finite(&self.kd, kd)
    }

    pub fn mirror_enable(&self) -> bool {
        self.mirror_enable.load(Ordering::Relaxed)
    }

    pub fn set_mirror_enable(&self, on: bool) {
        self.mirror_enable.store(on, Ordering::Relaxed);
    }

    pub fn pid_enable(&self) -> bool {
        self.pid_enable.load(Ordering::Relaxed)
    }

    pub fn set_pid_enable(&self, on: bool) {
        self.pid_enable.store(on, Ordering::Relaxed);
    }

    pub fn io_passthrough(&self) -> bool {
        self.io_passthrough.load(Ordering::Relaxed)
    }

    pub fn set_io_passthrough(&self, on: bool) {
        self.io_passthrough.store(on, Ordering::Relaxed);
    }

    pub fn delay_samples(&self) -> u16 {
        self.delay_samples.load(Ordering::Relaxed)
    }

    pub fn set_delay_samples(&self, samples: u16) -> Result<(), ConfigError> {
        if samples > MAX_DELAY_SAMPLES {
            return Err(ConfigError::DelayOutOfRange);
        }
        self.delay_samples.store(samples, Ordering::Relaxed);
        Ok(())
    }

    pub fn period_us(&self) -> u32 {
        self.period_us.load(Ordering::Relaxed)
    }

    /// Change the haptic loop period.
    ///
    /// The board layer re-arms the haptic timer from this value, and the loop uses it as `dt`.
    pub fn set_period_us(&self, period_us: u32) -> Result<(), ConfigError> {
        if !(MIN_PERIOD_US..=MAX_PERIOD_US).contains(&period_us) {
            return Err(ConfigError::PeriodOutOfRange);
        }
        self.period_us.store(period_us, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn store_finite(cell: &AtomicF32, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite);
    }
    cell.store(value);
    Ok(())
}

/// Latest control state, published once per tick for the host monitor.
#[derive(Debug)]
pub struct Telemetry {
    pub timestamp_us: AtomicU32,
    pub hall_voltage: AtomicF32,
    pub paddle_angle: AtomicF32,
    pub filtered_angle: AtomicF32,
    pub peer_value: AtomicF32,
    pub motor_torque: AtomicF32,
    pub dio_input: AtomicBool,
    pub overruns: AtomicU32,
}

impl Telemetry {
    pub const fn new() -> Self {
        Self {
            timestamp_us: AtomicU32::new(0),
            hall_voltage: AtomicF32::new(0.0),
            paddle_angle: AtomicF32::new(0.0),
            filtered_angle: AtomicF32::new(0.0),
            peer_value: AtomicF32::new(0.0),
            motor_torque: AtomicF32::new(0.0),
            dio_input: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
        }
    }

    pub fn publish(&self, snap: &ControlSnapshot) {
        self.timestamp_us.store(snap.timestamp_us, Ordering::Relaxed);
        self.hall_voltage.store(snap.hall_voltage);
        self.paddle_angle.store(snap.paddle_angle);
        self.filtered_angle.store(snap.filtered_angle);
        self.peer_value.store(snap.peer_value);
        self.motor_torque.store(snap.motor_torque);
        self.dio_input.store(snap.dio_input, Ordering::Relaxed);
        self.overruns.store(snap.overruns, Ordering::Relaxed);
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_outside_range_is_rejected() {
        let t = Tunables::new();
        assert_eq!(t.set_period_us(MIN_PERIOD_US - 1), Err(ConfigError::PeriodOutOfRange));
        assert_eq!(t.set_period_us(MAX_PERIOD_US + 1), Err(ConfigError::PeriodOutOfRange));
        assert_eq!(t.period_us(), DEFAULT_PERIOD_US);

        t.set_period_us(500).unwrap();
        assert_eq!(t.load().period_us, 500);
        assert!((t.load().dt() - 0.0005).abs() < 1e-9);
    }

    #[test]
    fn delay_is_bounded_by_queue_size() {
        let t = Tunables::new();
        assert_eq!(t.set_delay_samples(MAX_DELAY_SAMPLES + 1), Err(ConfigError::DelayOutOfRange));
        t.set_delay_samples(MAX_DELAY_SAMPLES).unwrap();
        assert_eq!(t.delay_samples(), MAX_DELAY_SAMPLES);
    }

    #[test]
    fn non_finite_gain_keeps_previous_value() {
        let t = Tunables::new();
        t.set_kp(0.5).unwrap();
        assert_eq!(t.set_kp(f32::INFINITY), Err(ConfigError::NonFinite));
        assert_eq!(t.set_kd(f32::NAN), Err(ConfigError::NonFinite));
        assert_eq!(t.kp(), 0.5);
    }

    #[test]
    fn queue_slots_cover_max_delay() {
        assert_eq!(DELAY_QUEUE_SLOTS, 4001);
    }
}
