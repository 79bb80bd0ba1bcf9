// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Debug console on USART3 (ST-Link virtual COM port).
//!
//! Blocking output for bring-up banners and the low-rate status line printed from the idle loop.
//! Never used from inside the control interrupts.
//!
//! Note: When using `writeln!`, be sure to include `\r` (CR) in the format string to ensure correct
//! line endings on the terminal.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::fmt::{self, Write as _};
use core::sync::atomic::Ordering;
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

use crate::config::Telemetry;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }

    /// One-line summary of the published telemetry.
    pub fn print_status(&mut self, telemetry: &Telemetry) {
        let _ = write!(
            self,
            "t={}us angle={:.2} peer={:.2} ",
            telemetry.timestamp_us.load(Ordering::Relaxed),
            telemetry.paddle_angle.load(),
            telemetry.peer_value.load()
        );
        let _ = write!(
            self,
            "torque={:.4} overruns={}\r\n",
            telemetry.motor_torque.load(),
            telemetry.overruns.load(Ordering::Relaxed)
        );
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}
