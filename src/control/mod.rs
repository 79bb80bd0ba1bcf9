// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! The two cascaded loops of the paddle and their building blocks.
//!
//! ## Modules
//!
//! - [`pid`] - Discrete PID controller shared by both loops.
//! - [`filter`] - First-order low-pass filter for paddle angles.
//! - [`current`] - Inner current regulator and the shared torque setpoint.
//! - [`law`] - Role-specific haptic control laws.
//! - [`state`] - Per-device control state and its snapshot.
//! - [`haptic`] - Fixed-period outer haptic loop.

pub mod current;
pub mod filter;
pub mod haptic;
pub mod law;
pub mod pid;
pub mod state;

pub use current::{CurrentRegulator, RegulatorShared, RegulatorState};
pub use filter::LowPass;
pub use haptic::{HapticLoop, LoopConfig, LoopIo, LoopShared, Role, TxQuantity};
pub use law::ControlLaw;
pub use pid::{Pid, PidGains};
pub use state::{ControlSnapshot, ControlState};
