// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Per-device control state.
//!
//! [`ControlState`] is owned by the haptic loop and only mutated inside a tick. Everything outside
//! the tick sees a [`ControlSnapshot`] copy.

use crate::config::FILTER_CUTOFF_HZ;
use crate::control::filter::LowPass;
use crate::control::pid::Pid;

/// Link health counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames decoded from the peer, accepted or not.
    pub frames_decoded: u32,
    /// Bytes dropped while resynchronising or trimming the backlog.
    pub bytes_discarded: u32,
    /// Decoded values rejected as non-finite or implausible.
    pub rejected: u32,
    /// Frames not sent because the TX queue was full.
    pub tx_dropped: u32,
    /// Receive faults reported by the transport.
    pub rx_faults: u32,
}

/// Tick timing counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks whose execution time reached the period.
    pub overruns: u32,
    /// Longest tick seen so far [us].
    pub longest_tick_us: u32,
}

#[derive(Clone, Debug)]
pub struct ControlState {
    /// Loop time, advanced by the configured period every tick [us].
    pub timestamp_us: u32,
    pub hall_voltage: f32,
    /// Paddle angle after the reduction [deg].
    pub paddle_angle: f32,
    pub filtered_angle: f32,
    /// Last accepted peer value, as decoded.
    pub peer_raw: f32,
    /// Peer value after the delay line; this is what the law sees unless filtered.
    pub peer_value: f32,
    pub peer_filtered: f32,
    /// Torque handed to the regulator [N.m].
    pub motor_torque: f32,
    pub dio_input: bool,

    pub pid: Pid,
    pub angle_filter: LowPass,
    pub peer_filter: LowPass,

    pub link: LinkStats,
    pub ticks: TickStats,
}

impl ControlState {
    pub fn new() -> Self {
        Self {
            timestamp_us: 0,
            hall_voltage: 0.0,
            paddle_angle: 0.0,
            filtered_angle: 0.0,
            peer_raw: 0.0,
            peer_value: 0.0,
            peer_filtered: 0.0,
            motor_torque: 0.0,
            dio_input: false,
            pid: Pid::new(),
            angle_filter: LowPass::new(FILTER_CUTOFF_HZ),
            peer_filter: LowPass::new(FILTER_CUTOFF_HZ),
            link: LinkStats::default(),
            ticks: TickStats::default(),
        }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            timestamp_us: self.timestamp_us,
            hall_voltage: self.hall_voltage,
            paddle_angle: self.paddle_angle,
            filtered_angle: self.filtered_angle,
            peer_raw: self.peer_raw,
            peer_value: self.peer_value,
            peer_filtered: self.peer_filtered,
            motor_torque: self.motor_torque,
            dio_input: self.dio_input,
            integral: self.pid.integral(),
            prev_error: self.pid.prev_error(),
            link: self.link,
            overruns: self.ticks.overruns,
            longest_tick_us: self.ticks.longest_tick_us,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only copy of [`ControlState`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlSnapshot {
    pub timestamp_us: u32,
    pub hall_voltage: f32,
    pub paddle_angle: f32,
    pub filtered_angle: f32,
    pub peer_raw: f32,
    pub peer_value: f32,
    pub peer_filtered: f32,
    pub motor_torque: f32,
    pub dio_input: bool,
    pub integral: f32,
    pub prev_error: f32,
    pub link: LinkStats,
    pub overruns: u32,
    pub longest_tick_us: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::pid::PidGains;

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let mut state = ControlState::new();
        state.paddle_angle = 3.0;
        state.pid.update(2.0, PidGains::new(1.0, 1.0, 0.0), 0.5);
        let snap = state.snapshot();

        state.paddle_angle = 4.0;
        assert_eq!(state.snapshot().paddle_angle, 4.0);
        assert_eq!(snap.paddle_angle, 3.0);
        assert_eq!(snap.integral, 1.0);
        assert_eq!(snap.prev_error, 2.0);
    }
}
