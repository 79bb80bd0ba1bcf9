// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-period outer haptic loop.
//!
//! One [`HapticLoop::tick`] per haptic timer interrupt. A tick never blocks and never allocates:
//! frames go out through a queue that the link UART drains, received bytes are polled, and
//! anything that does not fit is dropped and counted.
//!
//! Per tick, in order:
//! 1. debug IO passthrough,
//! 2. sensor acquisition,
//! 3. low-pass filtering,
//! 4. control law,
//! 5. torque setpoint,
//! 6. transmit the local scalar,
//! 7. receive and validate at most one peer frame,
//! 8. delay emulation on the received value,
//! 9. timestamp and telemetry.
//!
//! The law runs before the receive step, so it always works on the peer value of the previous
//! tick.

use crate::config::{Telemetry, TunableValues, Tunables, DELAY_QUEUE_SLOTS};
use crate::control::current::RegulatorShared;
use crate::control::law::{ControlLaw, LawInputs};
use crate::control::state::{ControlSnapshot, ControlState};
use crate::drivers::{paddle_angle_deg, DebugIo, PaddleSensors, DIO_IN_LINE, DIO_OUT_LINE};
use crate::protocol::codec::{self, PAYLOAD_LEN};
use crate::protocol::link::{send_frame, ByteLink};
use crate::protocol::{DelayQueue, FRAME_LEN};

use core::sync::atomic::Ordering;

/// Receive backlog kept between ticks: one full frame plus a partial one.
pub const RX_BACKLOG: usize = 2 * FRAME_LEN - 1;

/// Peer angles beyond this are treated as line noise by the wall follower [deg].
pub const WALL_PLAUSIBLE_ANGLE: f32 = 45.0;

/// Which local scalar is sent to the peer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxQuantity {
    PaddleAngle,
    Torque,
}

/// Device role. Paired devices run complementary roles: a mirror with a wall follower, or two
/// neighbours.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Sends its angle, renders the peer's torque.
    Mirror,
    /// Sends its torque, tracks the peer's angle inside a virtual wall.
    WallFollower,
    /// Sends its angle, pulls toward the peer's angle.
    Neighbour,
}

impl Role {
    /// Role selected by the `role-*` Cargo feature.
    pub const fn from_features() -> Self {
        if cfg!(feature = "role-mirror") {
            Role::Mirror
        } else if cfg!(feature = "role-wall") {
            Role::WallFollower
        } else {
            Role::Neighbour
        }
    }

    pub const fn config(self) -> LoopConfig {
        match self {
            Role::Mirror => LoopConfig {
                law: ControlLaw::TorqueMirror,
                tx: TxQuantity::PaddleAngle,
                filter_peer: false,
                delay_rx: false,
                plausible_band: None,
                debug_io: true,
            },
            Role::WallFollower => LoopConfig {
                law: ControlLaw::virtual_wall(),
                tx: TxQuantity::Torque,
                filter_peer: true,
                delay_rx: true,
                plausible_band: Some(WALL_PLAUSIBLE_ANGLE),
                debug_io: true,
            },
            Role::Neighbour => LoopConfig {
                law: ControlLaw::neighbour_sync(),
                tx: TxQuantity::PaddleAngle,
                filter_peer: false,
                delay_rx: true,
                plausible_band: None,
                debug_io: false,
            },
        }
    }
}

/// Per-role behaviour of the loop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LoopConfig {
    pub law: ControlLaw,
    pub tx: TxQuantity,
    /// Low-pass the peer value before the law sees it.
    pub filter_peer: bool,
    /// Route received values through the delay line.
    pub delay_rx: bool,
    /// Reject peer values with `|v| >= band`.
    pub plausible_band: Option<f32>,
    /// Drive DIO line 0 and sample DIO line 1.
    pub debug_io: bool,
}

impl LoopConfig {
    /// Whether a decoded peer value may replace the current one.
    pub fn accepts(&self, value: f32) -> bool {
        value.is_finite()
            && self
                .plausible_band
                .map_or(true, |band| -band < value && value < band)
    }
}

/// Hardware-facing resources the loop owns.
pub struct LoopIo<S, L, D> {
    pub sensors: S,
    pub link: L,
    pub dio: D,
}

/// Cross-priority cells shared with the regulator and the host side.
#[derive(Copy, Clone)]
pub struct LoopShared<'a> {
    pub tunables: &'a Tunables,
    pub regulator: &'a RegulatorShared,
    pub telemetry: &'a Telemetry,
}

pub struct HapticLoop<'a, S, L, D, const DQ: usize = DELAY_QUEUE_SLOTS> {
    config: LoopConfig,
    shared: LoopShared<'a>,
    io: LoopIo<S, L, D>,
    state: ControlState,
    rx_staging: DelayQueue<{ RX_BACKLOG + 1 }>,
    delay_line: DelayQueue<DQ>,
}

impl<'a, S, L, D, const DQ: usize> HapticLoop<'a, S, L, D, DQ>
where
    S: PaddleSensors,
    L: ByteLink,
    D: DebugIo,
{
    pub fn new(config: LoopConfig, shared: LoopShared<'a>, io: LoopIo<S, L, D>) -> Self {
        Self {
            config,
            shared,
            io,
            state: ControlState::new(),
            rx_staging: DelayQueue::new(),
            delay_line: DelayQueue::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        self.state.snapshot()
    }

    pub fn io(&self) -> &LoopIo<S, L, D> {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut LoopIo<S, L, D> {
        &mut self.io
    }

    /// Bytes currently held by the delay line.
    pub fn delay_occupancy(&self) -> usize {
        self.delay_line.occupancy()
    }

    /// Bytes currently held in receive staging.
    pub fn rx_backlog(&self) -> usize {
        self.rx_staging.occupancy()
    }

    /// Run one tick and publish the result.
    pub fn tick(&mut self) -> ControlSnapshot {
        let t = self.shared.tunables.load();
        let dt = t.dt();

        {
            let s = &mut self.state;

            // ----- Debug IO -----
            if self.config.debug_io {
                self.io.dio.set(DIO_OUT_LINE, t.io_passthrough);
                s.dio_input = self.io.dio.get(DIO_IN_LINE);
            }

            // ----- Sensors -----
            s.hall_voltage = self.io.sensors.hall_voltage();
            s.paddle_angle = paddle_angle_deg(self.io.sensors.shaft_angle_deg());

            // ----- Filtering -----
            s.filtered_angle = s.angle_filter.update(s.paddle_angle, dt);
            let peer = if self.config.filter_peer {
                s.peer_filtered = s.peer_filter.update(s.peer_value, dt);
                s.peer_filtered
            } else {
                s.peer_filtered = s.peer_value;
                s.peer_value
            };

            // ----- Control law and setpoint -----
            let torque = self.config.law.compute(
                &mut s.pid,
                LawInputs {
                    filtered_angle: s.filtered_angle,
                    peer,
                    dt,
                    tunables: &t,
                },
            );
            s.motor_torque = self.shared.regulator.set_torque(torque);

            // ----- Transmit -----
            let local = match self.config.tx {
                TxQuantity::PaddleAngle => s.paddle_angle,
                TxQuantity::Torque => s.motor_torque,
            };
            if !send_frame(&mut self.io.link, &codec::encode(local)) {
                s.link.tx_dropped = s.link.tx_dropped.saturating_add(1);
            }
        }

        self.receive(&t);

        self.state.timestamp_us = self.state.timestamp_us.wrapping_add(t.period_us);
        let snap = self.state.snapshot();
        self.shared.telemetry.publish(&snap);
        snap
    }

    /// Account for the execution time of the last tick, as measured by the board.
    ///
    /// Returns `true` if the tick used up its whole period.
    pub fn record_tick_duration(&mut self, elapsed_us: u32) -> bool {
        let ticks = &mut self.state.ticks;
        ticks.longest_tick_us = ticks.longest_tick_us.max(elapsed_us);

        let overrun = elapsed_us >= self.shared.tunables.period_us();
        if overrun {
            ticks.overruns = ticks.overruns.saturating_add(1);
            self.shared
                .telemetry
                .overruns
                .store(ticks.overruns, Ordering::Relaxed);
        }
        overrun
    }

    fn receive(&mut self, t: &TunableValues) {
        let stats = &mut self.state.link;

        // Keep only the newest bytes; anything older than one frame is stale anyway. A fault only
        // means bytes were lost upstream, so the queue is still drained to make room.
        loop {
            match self.io.link.recv() {
                Ok(byte) => {
                    if self.rx_staging.push(byte) {
                        stats.bytes_discarded = stats.bytes_discarded.saturating_add(1);
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    stats.rx_faults = stats.rx_faults.saturating_add(1);
                }
            }
        }

        if self.config.delay_rx {
            self.delay_line
                .retarget(PAYLOAD_LEN * usize::from(t.delay_samples));
        }

        let mut buf = [0u8; RX_BACKLOG];
        let n = self.rx_staging.peek_into(&mut buf);
        let decoded = codec::decode(&buf[..n]);
        self.rx_staging.discard(decoded.consumed);
        stats.bytes_discarded = stats.bytes_discarded.saturating_add(decoded.discarded as u32);

        let Some(value) = decoded.value else {
            return;
        };
        stats.frames_decoded = stats.frames_decoded.saturating_add(1);

        if !self.config.accepts(value) {
            stats.rejected = stats.rejected.saturating_add(1);
            return;
        }

        self.state.peer_raw = value;
        self.state.peer_value = if self.config.delay_rx && t.delay_samples > 0 {
            self.delay(value)
        } else {
            value
        };
    }

    /// Push `value` into the delay line and return the one `delay_samples` frames older.
    fn delay(&mut self, value: f32) -> f32 {
        let mut out = [0u8; PAYLOAD_LEN];
        for b in out.iter_mut() {
            *b = self.delay_line.pull();
        }
        for b in codec::payload_bytes(value) {
            self.delay_line.push(b);
        }
        codec::value_from_payload(out)
    }
}
