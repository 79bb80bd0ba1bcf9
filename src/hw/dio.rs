// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Two-line debug header used to timestamp events on a logic analyser.

use stm32f7xx_hal::gpio::{gpiof, Floating, Input, Output, PushPull};

use crate::drivers::{DebugIo, DIO_IN_LINE, DIO_OUT_LINE};
use crate::hw::pins::DioPins;

pub struct DebugHeader {
    out0: gpiof::PF12<Output<PushPull>>,
    in1: gpiof::PF13<Input<Floating>>,
}

impl DebugHeader {
    pub fn new(pins: DioPins) -> Self {
        let mut header = Self {
            out0: pins.out0,
            in1: pins.in1,
        };
        header.out0.set_low();
        header
    }
}

impl DebugIo for DebugHeader {
    fn get(&mut self, line: usize) -> bool {
        match line {
            DIO_IN_LINE => self.in1.is_high(),
            DIO_OUT_LINE => self.out0.is_set_high(),
            _ => false,
        }
    }

    fn set(&mut self, line: usize, high: bool) {
        if line != DIO_OUT_LINE {
            return;
        }
        if high {
            self.out0.set_high();
        } else {
            self.out0.set_low();
        }
    }
}
