// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder on the motor shaft via TIM2 in encoder mode.
//!
//! TIM2 is 32 bits wide, so the counter never wraps within the paddle's travel and can be read as
//! a signed position directly. The paddle rests at 0 deg at power-up, which is where counting
//! starts.

use stm32f7xx_hal::pac;

use crate::drivers::EncoderScale;

/// Encoder edges per motor shaft revolution (500 lines, quadrature).
pub const COUNTS_PER_REV: u32 = 2000;

/// Input capture filter on both channels: f_DTS/2, N = 6.
const INPUT_FILTER: u8 = 0b0100;

pub struct Encoder<TIM> {
    tim: TIM,
    scale: EncoderScale,
}

impl Encoder<pac::TIM2> {
    pub fn tim2(tim: pac::TIM2) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.arr.write(|w| w.bits(u32::MAX));

        // Encoder mode 3: count every edge of TI1 and TI2
        tim.smcr.modify(|_, w| w.sms().bits(0b011));
        tim.ccmr1_input().modify(|_, w| unsafe {
            w.cc1s()
                .ti1()
                .cc2s()
                .ti2()
                .ic1f()
                .bits(INPUT_FILTER)
                .ic2f()
                .bits(INPUT_FILTER)
        });
        tim.ccer.write(|w| w.cc1e().set_bit().cc2e().set_bit());

        tim.cnt.write(|w| w.bits(0));
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self {
            tim,
            scale: EncoderScale::new(COUNTS_PER_REV),
        }
    }

    /// Signed count since power-up.
    #[inline]
    pub fn position(&self) -> i32 {
        self.tim.cnt.read().cnt().bits() as i32
    }

    /// Motor shaft angle [deg].
    #[inline]
    pub fn shaft_deg(&self) -> f32 {
        self.scale.shaft_deg(self.position())
    }
}
