// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! First-order exponential low-pass filter.
//!
//! `alpha = dt / (dt + τ)` with `τ = 1 / (2π·fc)`, then `y = alpha·x + (1 - alpha)·y_prev`.
//!
//! `dt` is the configured tick period, not a measured interval, so the response of the filter is
//! tied to the period set from the host.

use core::f32::consts::PI;

#[derive(Copy, Clone, Debug)]
pub struct LowPass {
    tau: f32,
    prev: f32,
}

impl LowPass {
    /// New filter with cutoff `cutoff_hz`, starting from zero.
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            tau: 1.0 / (2.0 * PI * cutoff_hz),
            prev: 0.0,
        }
    }

    /// Time constant τ in seconds.
    #[inline]
    pub fn tau(&self) -> f32 {
        self.tau
    }

    /// Smoothing factor for a given `dt`.
    #[inline]
    pub fn alpha(&self, dt: f32) -> f32 {
        dt / (dt + self.tau)
    }

    /// Feed one sample and return the filtered value.
    pub fn update(&mut self, current: f32, dt: f32) -> f32 {
        let alpha = self.alpha(dt);
        self.prev = alpha * current + (1.0 - alpha) * self.prev;
        self.prev
    }

    /// Last filtered value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.prev
    }

    /// Restart the filter from `value`.
    pub fn reset(&mut self, value: f32) {
        self.prev = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_settles_within_one_percent_after_five_tau() {
        let mut lp = LowPass::new(50.0);
        let dt = 0.00035;
        let ticks = (5.0 * lp.tau() / dt).ceil() as usize;

        let mut y = 0.0;
        for _ in 0..ticks {
            y = lp.update(1.0, dt);
        }
        assert!((1.0 - y) < 0.01, "y = {y} after {ticks} ticks");
    }

    #[test]
    fn does_not_settle_early() {
        let mut lp = LowPass::new(50.0);
        let dt = 0.00035;
        let ticks = (lp.tau() / dt) as usize;

        let mut y = 0.0;
        for _ in 0..ticks {
            y = lp.update(1.0, dt);
        }
        // Roughly one time constant in: about 63 % of the step.
        assert!(y > 0.55 && y < 0.7, "y = {y}");
    }

    #[test]
    fn alpha_matches_closed_form() {
        let lp = LowPass::new(50.0);
        let dt = 0.001;
        let tau = 1.0 / (2.0 * core::f32::consts::PI * 50.0);
        assert!((lp.alpha(dt) - dt / (dt + tau)).abs() < 1e-7);
    }

    #[test]
    fn reset_sets_history() {
        let mut lp = LowPass::new(50.0);
        lp.reset(10.0);
        assert_eq!(lp.value(), 10.0);
        assert_eq!(lp.update(10.0, 0.001), 10.0);
    }
}
