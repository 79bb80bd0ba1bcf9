// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Level Interfaces
//!
//! Traits the control code consumes, implemented by the register wrappers in `hw` on the board
//! and by simple fakes in tests. The control loops never see a peripheral directly.
//!
//! ## Modules
//!
//! - [`paddle`] – unit conversions for the paddle sensors (encoder, Hall sensor, current sense).

pub mod paddle;

pub use paddle::{paddle_angle_deg, CurrentSenseCal, EncoderScale};

/// Sensors sampled by the haptic loop once per tick.
pub trait PaddleSensors {
    /// Hall sensor output [V].
    fn hall_voltage(&mut self) -> f32;

    /// Motor shaft angle [deg], before the reduction.
    fn shaft_angle_deg(&mut self) -> f32;
}

/// Motor current measurement, sampled by the current loop.
pub trait CurrentSense {
    /// Motor current [A].
    fn current_amps(&mut self) -> f32;
}

/// Voltage-driven motor bridge. Only the current regulator drives it.
pub trait MotorDrive {
    /// Apply `volts` across the motor; the sign selects the direction.
    fn apply_voltage(&mut self, volts: f32);
}

/// Two-line digital debug port.
pub trait DebugIo {
    /// Level of `line`; unknown lines read low.
    fn get(&mut self, line: usize) -> bool;

    /// Drive `line`; unknown lines are ignored.
    fn set(&mut self, line: usize, high: bool);
}

/// Output line mirrored from the `io_passthrough` tunable.
pub const DIO_OUT_LINE: usize = 0;

/// Input line sampled into the control state.
pub const DIO_IN_LINE: usize = 1;

/// [`DebugIo`] for builds without the debug header populated.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDebugIo;

impl DebugIo for NoDebugIo {
    fn get(&mut self, _line: usize) -> bool {
        false
    }

    fn set(&mut self, _line: usize, _high: bool) {}
}
