// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Discrete PID controller for closed-loop control.
//!
//! Works in `no_std` and does not allocate memory.
//!
//! Gains are passed to every [`update`](Pid::update) so they can be retuned from the host between
//! ticks without touching the controller state. The controller keeps only:
//! - the integrator, `∑ error·dt`,
//! - the previous error, for a backward-difference derivative.

/// Proportional, integral and derivative gains.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// PID state with optional integrator and output clamps.
#[derive(Clone, Debug)]
pub struct Pid {
    /// Integrator state, `∑ error·dt`
    integral: f32,
    /// Error of the previous update (for the derivative term)
    prev_error: f32,

    /// Integral anti-windup clamp, symmetric
    int_limit: f32,

    /// Output clamp
    out_min: f32,
    out_max: f32,
}

impl Pid {
    /// Create a controller with no integrator or output clamp.
    pub const fn new() -> Self {
        Self {
            integral: 0.0,
            prev_error: 0.0,
            int_limit: f32::INFINITY,
            out_min: f32::NEG_INFINITY,
            out_max: f32::INFINITY,
        }
    }

    /// Set output limits.
    pub fn with_output_limits(mut self, min: f32, max: f32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    /// Clamp the integrator to `±limit` (anti-reset windup).
    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.set_integral_limit(limit);
        self
    }

    pub fn set_integral_limit(&mut self, limit: f32) {
        // A negative or NaN limit would make `clamp` panic.
        self.int_limit = if limit >= 0.0 { limit } else { 0.0 };
    }

    /// Reset integrator and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    /// Record `error` as the previous error without integrating it.
    #[inline]
    pub fn track(&mut self, error: f32) {
        self.prev_error = error;
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn prev_error(&self) -> f32 {
        self.prev_error
    }

    /// Update the controller.
    ///
    /// `error` — setpoint minus measurement
    /// `dt` — timestep in seconds (e.g. 0.00035 for the 350 us haptic tick)
    ///
    /// Returns `Kp·e + Kd·(e - e_prev)/dt + Ki·∑e·dt`, clamped to the output limits.
    pub fn update(&mut self, error: f32, gains: PidGains, dt: f32) -> f32 {
        // ----- P term -----
        let p = gains.kp * error;

        // ----- I term -----
        self.integral = (self.integral + error * dt).clamp(-self.int_limit, self.int_limit);
        let i = gains.ki * self.integral;

        // ----- D term (backward difference on the error) -----
        let d = if dt > 0.0 {
            gains.kd * (error - self.prev_error) / dt
        } else {
            0.0
        };
        self.prev_error = error;

        // ----- Output clamp -----
        (p + i + d).clamp(self.out_min, self.out_max)
    }
}

impl Default for Pid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = Pid::new();
        let dt = 0.00035;
        let n = 1000;
        for _ in 0..n {
            pid.update(1.0, PidGains::new(0.0, 0.0, 0.0), dt);
        }
        let expected = n as f32 * dt;
        assert!((pid.integral() - expected).abs() < expected * 1e-3);
    }

    #[test]
    fn output_combines_terms() {
        let mut pid = Pid::new();
        let gains = PidGains::new(2.0, 10.0, 0.5);
        let dt = 0.01;

        // First update: derivative against a zero previous error.
        let u = pid.update(1.0, gains, dt);
        let expected = 2.0 * 1.0 + 10.0 * 0.01 + 0.5 * (1.0 - 0.0) / dt;
        assert!((u - expected).abs() < 1e-4);

        // Constant error: derivative vanishes.
        let u = pid.update(1.0, gains, dt);
        let expected = 2.0 + 10.0 * 0.02;
        assert!((u - expected).abs() < 1e-4);
        assert_eq!(pid.prev_error(), 1.0);
    }

    #[test]
    fn integral_limit_bounds_windup() {
        let mut pid = Pid::new().with_integral_limit(0.05);
        for _ in 0..100 {
            pid.update(10.0, PidGains::new(0.0, 1.0, 0.0), 0.01);
        }
        assert_eq!(pid.integral(), 0.05);
    }

    #[test]
    fn output_limits_clamp() {
        let mut pid = Pid::new().with_output_limits(-1.0, 1.0);
        assert_eq!(pid.update(100.0, PidGains::new(1.0, 0.0, 0.0), 0.01), 1.0);
        assert_eq!(pid.update(-100.0, PidGains::new(1.0, 0.0, 0.0), 0.01), -1.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new();
        pid.update(3.0, PidGains::new(1.0, 1.0, 1.0), 0.1);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.prev_error(), 0.0);
    }
}
