// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Lock-free cells shared between interrupt priorities.
//!
//! Every value that crosses a priority boundary (torque setpoint, tunable gains, telemetry) is a
//! single machine word with a single writer, so a relaxed atomic load/store is enough to guarantee
//! that a reader never observes a torn value.

use core::sync::atomic::{AtomicU32, Ordering};

/// `f32` stored as its IEEE-754 bit pattern in an `AtomicU32`.
#[derive(Debug)]
#[repr(transparent)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}
