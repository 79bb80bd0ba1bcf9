// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Inner current (torque) regulation loop.
//!
//! The regulator is split in two halves:
//!
//! - [`RegulatorShared`] holds everything that crosses priority levels: the torque setpoint written
//!   by the haptic loop and the current-loop gains written by the host. Every field is a single
//!   atomic word, so no lock is needed.
//! - [`CurrentRegulator`] is owned by the current-loop interrupt. It reads the setpoint, runs a PID
//!   on the measured motor current and returns the bridge voltage.
//!
//! Lifecycle: `Uninitialized → Initialized → CurrentLoopRunning`, never backwards.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! static SHARED: RegulatorShared = RegulatorShared::new(MOTOR_NOMINAL_TORQUE);
//!
//! let mut reg = CurrentRegulator::new(&SHARED);
//! reg.init();
//! calibrate_current_sense();
//! reg.start_current_loop();
//!
//! // current-loop interrupt
//! reg.step_drive(&mut sense, &mut bridge, dt);
//! ```

use crate::config::{store_finite, ConfigError, BRIDGE_SUPPLY_VOLTAGE, MOTOR_TORQUE_CONST};
use crate::control::pid::{Pid, PidGains};
use crate::drivers::{CurrentSense, MotorDrive};
use crate::sync::AtomicF32;

/// Lifecycle of the current regulator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegulatorState {
    Uninitialized,
    Initialized,
    CurrentLoopRunning,
}

/// Cross-priority half of the regulator: torque setpoint and current-loop tuning.
#[derive(Debug)]
pub struct RegulatorShared {
    nominal_torque: f32,
    setpoint: AtomicF32,
    kp: AtomicF32,
    ki: AtomicF32,
    kd: AtomicF32,
    arw: AtomicF32,
}

impl RegulatorShared {
    /// Current-loop gains tuned on the paddle board (volts per amp).
    pub const fn new(nominal_torque: f32) -> Self {
        Self {
            nominal_torque,
            setpoint: AtomicF32::new(0.0),
            kp: AtomicF32::new(20.0),
            ki: AtomicF32::new(20_000.0),
            kd: AtomicF32::new(0.0),
            arw: AtomicF32::new(0.001),
        }
    }

    #[inline]
    pub fn nominal_torque(&self) -> f32 {
        self.nominal_torque
    }

    /// Request a motor torque [N.m].
    ///
    /// Out-of-range requests are silently saturated to `±nominal_torque`; a NaN request is stored
    /// as zero. Callable from any priority and in any regulator state. Returns the stored value.
    pub fn set_torque(&self, torque: f32) -> f32 {
        let torque = if torque.is_nan() {
            0.0
        } else {
            torque.clamp(-self.nominal_torque, self.nominal_torque)
        };
        self.setpoint.store(torque);
        torque
    }

    /// Current torque setpoint [N.m].
    #[inline]
    pub fn torque(&self) -> f32 {
        self.setpoint.load()
    }

    pub fn kp(&self) -> f32 {
        self.kp.load()
    }

    pub fn set_kp(&self, kp: f32) -> Result<(), ConfigError> {
        store_finite(&self.kp, kp)
    }

    pub fn ki(&self) -> f32 {
        self.ki.load()
    }

    pub fn set_ki(&self, ki: f32) -> Result<(), ConfigError> {
        store_finite(&self.ki, ki)
    }

    pub fn kd(&self) -> f32 {
        self.kd.load()
    }

    pub fn set_kd(&self, kd: f32) -> Result<(), ConfigError> {
        store_finite(&self.kd, kd)
    }

    /// Anti-reset windup: bound on the current integrator [A.s].
    pub fn arw(&self) -> f32 {
        self.arw.load()
    }

    pub fn set_arw(&self, arw: f32) -> Result<(), ConfigError> {
        store_finite(&self.arw, arw)
    }

    fn gains(&self) -> PidGains {
        PidGains::new(self.kp.load(), self.ki.load(), self.kd.load())
    }
}

/// Current-loop half of the regulator, owned by the fast interrupt.
pub struct CurrentRegulator<'a> {
    shared: &'a RegulatorShared,
    pid: Pid,
    state: RegulatorState,
    target_current: f32,
}

impl<'a> CurrentRegulator<'a> {
    pub fn new(shared: &'a RegulatorShared) -> Self {
        Self {
            shared,
            pid: Pid::new().with_output_limits(-BRIDGE_SUPPLY_VOLTAGE, BRIDGE_SUPPLY_VOLTAGE),
            state: RegulatorState::Uninitialized,
            target_current: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> RegulatorState {
        self.state
    }

    #[inline]
    pub fn shared(&self) -> &'a RegulatorShared {
        self.shared
    }

    /// Zero the setpoint and reset the loop. Does not start it.
    pub fn init(&mut self) {
        if self.state != RegulatorState::Uninitialized {
            return;
        }
        self.shared.set_torque(0.0);
        self.pid.reset();
        self.target_current = 0.0;
        self.state = RegulatorState::Initialized;
    }

    /// Start regulating the current.
    ///
    /// The current sensor offset must already be calibrated: the loop trusts every reading from
    /// here on and nothing checks this at runtime.
    pub fn start_current_loop(&mut self) {
        if self.state == RegulatorState::Uninitialized {
            self.init();
        }
        self.state = RegulatorState::CurrentLoopRunning;
    }

    /// Motor current the loop is currently steering toward [A].
    #[inline]
    pub fn target_current(&self) -> f32 {
        self.target_current
    }

    /// Run one current-loop iteration.
    ///
    /// `measured_current` — motor current [A]
    /// `dt` — current-loop period [s]
    ///
    /// Returns the bridge voltage to apply. Before the loop is started this is always `0.0`, and a
    /// non-finite result (e.g. from a NaN current reading) is replaced by `0.0` with the loop reset.
    pub fn step(&mut self, measured_current: f32, dt: f32) -> f32 {
        if self.state != RegulatorState::CurrentLoopRunning {
            return 0.0;
        }

        self.pid.set_integral_limit(self.shared.arw());
        self.target_current = self.shared.torque() / MOTOR_TORQUE_CONST;

        let error = self.target_current - measured_current;
        let voltage = self.pid.update(error, self.shared.gains(), dt);
        if voltage.is_finite() {
            voltage
        } else {
            self.pid.reset();
            0.0
        }
    }

    /// Read the current sensor, run [`step`](Self::step) and drive the bridge.
    pub fn step_drive<S, D>(&mut self, sense: &mut S, drive: &mut D, dt: f32) -> f32
    where
        S: CurrentSense,
        D: MotorDrive,
    {
        let voltage = self.step(sense.current_amps(), dt);
        drive.apply_voltage(voltage);
        voltage
    }
}
