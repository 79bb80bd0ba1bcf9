// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Role-specific haptic control laws.
//!
//! Exactly one law is active per device. All of them map the filtered local paddle angle, the
//! last-known peer scalar and the current tunables to a torque request [N.m].
//!
//! The PID-based laws share the discrete [`Pid`]; its only anti-windup is the output saturation
//! applied here, so a large sustained error can still wind the integrator up while the output sits
//! at its limit.

use crate::config::{TunableValues, MOTOR_NOMINAL_TORQUE};
use crate::control::pid::{Pid, PidGains};

/// Default half-width of the virtual wall band [deg].
pub const DEFAULT_WALL_ANGLE: f32 = 15.0;

/// Default torque limit between two synchronised neighbours [N.m].
pub const DEFAULT_SYNC_FORCE_LIMIT: f32 = 0.032;

/// Inputs of one control law evaluation.
#[derive(Copy, Clone, Debug)]
pub struct LawInputs<'a> {
    /// Low-pass filtered local paddle angle [deg].
    pub filtered_angle: f32,
    /// Peer scalar as seen by this role (torque or angle, possibly filtered and delayed).
    pub peer: f32,
    /// Configured tick period [s].
    pub dt: f32,
    pub tunables: &'a TunableValues,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ControlLaw {
    /// Render the negated peer torque: `torque = -peer` while mirroring is enabled.
    TorqueMirror,

    /// Track the peer position, but never beyond `±wall_angle`.
    VirtualWall { wall_angle: f32 },

    /// Pull toward the peer position, capped at `force_limit` so that two coupled paddles cannot
    /// fight each other with full actuator torque.
    NeighbourSync { force_limit: f32 },
}

impl ControlLaw {
    pub const fn virtual_wall() -> Self {
        ControlLaw::VirtualWall {
            wall_angle: DEFAULT_WALL_ANGLE,
        }
    }

    pub const fn neighbour_sync() -> Self {
        ControlLaw::NeighbourSync {
            force_limit: DEFAULT_SYNC_FORCE_LIMIT,
        }
    }

    /// Position error fed to the PID, or `None` for laws without one.
    pub fn error(&self, filtered_angle: f32, peer: f32) -> Option<f32> {
        match *self {
            ControlLaw::TorqueMirror => None,
            ControlLaw::VirtualWall { wall_angle } => {
                Some(wall_error(peer, filtered_angle, wall_angle))
            }
            ControlLaw::NeighbourSync { .. } => Some(peer - filtered_angle),
        }
    }

    /// Evaluate the law for one tick.
    ///
    /// While the PID is disabled the integrator is frozen but the previous error keeps tracking,
    /// so enabling the PID does not produce a derivative kick.
    pub fn compute(&self, pid: &mut Pid, inputs: LawInputs<'_>) -> f32 {
        let t = inputs.tunables;
        let gains = PidGains::new(t.kp, t.ki, t.kd);

        match *self {
            ControlLaw::TorqueMirror => {
                if t.mirror_enable {
                    (-inputs.peer).clamp(-MOTOR_NOMINAL_TORQUE, MOTOR_NOMINAL_TORQUE)
                } else {
                    0.0
                }
            }
            ControlLaw::VirtualWall { wall_angle } => {
                let error = wall_error(inputs.peer, inputs.filtered_angle, wall_angle);
                pid_or_track(pid, error, gains, t.pid_enable, inputs.dt)
            }
            ControlLaw::NeighbourSync { force_limit } => {
                let error = inputs.peer - inputs.filtered_angle;
                let u = pid_or_track(pid, error, gains, t.pid_enable, inputs.dt);
                u.clamp(-force_limit, force_limit)
            }
        }
    }
}

/// `target - angle`, with `target` first clamped into `[-wall_angle, wall_angle]`.
#[inline]
pub fn wall_error(target: f32, angle: f32, wall_angle: f32) -> f32 {
    let target = if target > wall_angle {
        wall_angle
    } else if target < -wall_angle {
        -wall_angle
    } else {
        target
    };
    target - angle
}

fn pid_or_track(pid: &mut Pid, error: f32, gains: PidGains, enabled: bool, dt: f32) -> f32 {
    if enabled {
        pid.update(error, gains, dt)
    } else {
        pid.track(error);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tunables;

    fn tunables(f: impl FnOnce(&Tunables)) -> TunableValues {
        let t = Tunables::new();
        f(&t);
        t.load()
    }

    fn inputs(filtered_angle: f32, peer: f32, t: &TunableValues) -> LawInputs<'_> {
        LawInputs {
            filtered_angle,
            peer,
            dt: 0.00035,
            tunables: t,
        }
    }

    #[test]
    fn mirror_negates_and_saturates() {
        let t = tunables(|t| t.set_mirror_enable(true));
        let mut pid = Pid::new();
        let law = ControlLaw::TorqueMirror;

        assert_eq!(law.compute(&mut pid, inputs(0.0, 0.01, &t)), -0.01);
        assert_eq!(law.compute(&mut pid, inputs(0.0, 1.0, &t)), -MOTOR_NOMINAL_TORQUE);
        assert_eq!(law.compute(&mut pid, inputs(0.0, -1.0, &t)), MOTOR_NOMINAL_TORQUE);
    }

    #[test]
    fn mirror_disabled_outputs_zero() {
        let t = tunables(|_| {});
        let mut pid = Pid::new();
        assert_eq!(ControlLaw::TorqueMirror.compute(&mut pid, inputs(0.0, 0.02, &t)), 0.0);
    }

    #[test]
    fn wall_error_inside_band_is_exact() {
        for (target, angle) in [(0.0, 0.0), (14.9, 3.2), (-15.0, -20.0), (7.5, -7.5)] {
            assert_eq!(wall_error(target, angle, 15.0), target - angle);
        }
    }

    #[test]
    fn wall_error_outside_band_uses_boundary() {
        assert_eq!(wall_error(40.0, 10.0, 15.0), 15.0 - 10.0);
        assert_eq!(wall_error(-40.0, 10.0, 15.0), -15.0 - 10.0);
        assert_eq!(ControlLaw::virtual_wall().error(2.0, 90.0), Some(13.0));
    }

    #[test]
    fn wall_with_pid_disabled_outputs_zero_and_keeps_integrator() {
        let t = tunables(|t| t.set_kp(1.0).unwrap());
        let mut pid = Pid::new();
        let law = ControlLaw::virtual_wall();

        assert_eq!(law.compute(&mut pid, inputs(0.0, 10.0, &t)), 0.0);
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.prev_error(), 10.0);
    }

    #[test]
    fn wall_pushes_toward_clamped_target() {
        let t = tunables(|t| {
            t.set_kp(0.001).unwrap();
            t.set_kd(0.0).unwrap();
            t.set_pid_enable(true);
        });
        let mut pid = Pid::new();
        let law = ControlLaw::virtual_wall();

        // Peer far beyond the wall: the error is measured against the wall itself.
        let u = law.compute(&mut pid, inputs(10.0, 60.0, &t));
        assert!((u - 0.001 * 5.0).abs() < 1e-7);
    }

    #[test]
    fn neighbour_sync_is_capped_by_soft_limit() {
        let t = tunables(|t| {
            t.set_kp(1.0).unwrap();
            t.set_pid_enable(true);
        });
        let mut pid = Pid::new();
        let law = ControlLaw::neighbour_sync();

        let u = law.compute(&mut pid, inputs(0.0, 30.0, &t));
        assert_eq!(u, DEFAULT_SYNC_FORCE_LIMIT);
        let u = law.compute(&mut pid, inputs(30.0, -30.0, &t));
        assert_eq!(u, -DEFAULT_SYNC_FORCE_LIMIT);
        assert!(DEFAULT_SYNC_FORCE_LIMIT < MOTOR_NOMINAL_TORQUE);
    }

    #[test]
    fn mirror_has_no_position_error() {
        assert_eq!(ControlLaw::TorqueMirror.error(1.0, 2.0), None);
        assert_eq!(ControlLaw::neighbour_sync().error(1.0, 2.0), Some(1.0));
    }
}
