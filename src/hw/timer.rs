// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Periodic update interrupts for the two control loops.
//!
//! Both timers count at 1 MHz, so the auto-reload value is the period in microseconds and the
//! counter read inside the handler is the time spent since the update event.
//!
//! - TIM5 (32-bit) paces the haptic loop. Its period follows the `period_us` tunable.
//! - TIM6 (16-bit) paces the current loop at a fixed period.

use stm32f7xx_hal::pac;

/// Counter clock of both timers.
const COUNTER_HZ: u32 = 1_000_000;

pub struct PeriodicTimer<TIM> {
    tim: TIM,
    period_us: u32,
}

impl<TIM> PeriodicTimer<TIM> {
    #[inline]
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    #[inline]
    pub fn free(self) -> TIM {
        self.tim
    }
}

fn prescaler(timclk_hz: u32) -> u16 {
    (timclk_hz / COUNTER_HZ).saturating_sub(1) as u16
}

impl PeriodicTimer<pac::TIM5> {
    /// Configure TIM5 for an update interrupt every `period_us`. Does not start it.
    ///
    /// `timclk_hz` is the APB1 timer clock.
    pub fn tim5(tim5: pac::TIM5, timclk_hz: u32, period_us: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim5en().set_bit());

        let tim = tim5;
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(u32::from(prescaler(timclk_hz))) });

        let mut timer = Self { tim, period_us: 0 };
        timer.set_period_us(period_us);
        timer.tim.dier.modify(|_, w| w.uie().set_bit());
        timer
    }

    /// Change the period. Takes effect at the next update event.
    pub fn set_period_us(&mut self, period_us: u32) {
        if period_us == self.period_us {
            return;
        }
        self.tim.cr1.modify(|_, w| w.arpe().set_bit());
        self.tim
            .arr
            .write(|w| unsafe { w.bits(period_us.saturating_sub(1)) });
        self.period_us = period_us;
    }

    pub fn start(&mut self) {
        // Load PSC/ARR without raising the interrupt
        self.tim.cr1.modify(|_, w| w.urs().set_bit());
        self.tim.egr.write(|w| w.ug().set_bit());
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    /// Acknowledge the update interrupt. Returns `false` on a spurious entry.
    #[inline]
    pub fn acknowledge(&mut self) -> bool {
        if self.tim.sr.read().uif().bit_is_clear() {
            return false;
        }
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        true
    }

    /// Microseconds since the last update event.
    ///
    /// If the next update is already pending the tick ran over, and the full period is reported.
    #[inline]
    pub fn elapsed_us(&self) -> u32 {
        if self.tim.sr.read().uif().bit_is_set() {
            return self.period_us;
        }
        self.tim.cnt.read().bits()
    }
}

impl PeriodicTimer<pac::TIM6> {
    /// Configure TIM6 for an update interrupt every `period_us` (at most 65 535). Does not start
    /// it.
    pub fn tim6(tim6: pac::TIM6, timclk_hz: u32, period_us: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim6en().set_bit());

        let tim = tim6;
        let period_us = period_us.clamp(1, u32::from(u16::MAX));
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| w.psc().bits(prescaler(timclk_hz)));
        tim.arr.write(|w| w.arr().bits((period_us - 1) as u16));
        tim.dier.modify(|_, w| w.uie().set_bit());

        Self { tim, period_us }
    }

    pub fn start(&mut self) {
        self.tim.cr1.modify(|_, w| w.urs().set_bit());
        self.tim.egr.write(|w| w.ug().set_bit());
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    #[inline]
    pub fn acknowledge(&mut self) -> bool {
        if self.tim.sr.read().uif().bit_is_clear() {
            return false;
        }
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        true
    }

    /// Loop period in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.period_us as f32 / COUNTER_HZ as f32
    }
}
