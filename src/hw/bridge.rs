// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! H-bridge motor drive on TIM4 CH1/CH2.
//!
//! One input is PWM'd while the other is held low; which one selects the direction. The duty cycle
//! is the requested voltage over the bridge supply.

use micromath::F32Ext;
use stm32f7xx_hal::{
    gpio::{gpiod, Output, PushPull},
    pac,
    prelude::*,
};

use crate::config::BRIDGE_SUPPLY_VOLTAGE;
use crate::drivers::MotorDrive;

/// PWM carrier frequency, above the audible range.
pub const PWM_FREQ_HZ: u32 = 20_000;

pub struct HBridge {
    tim: pac::TIM4,
    enable: gpiod::PD14<Output<PushPull>>,
    /// Auto-reload value, i.e. the compare value at 100 % duty.
    max_duty: u32,
}

impl HBridge {
    /// Configure TIM4 for edge-aligned PWM on CH1/CH2 with both outputs low. The bridge stays
    /// disabled until [`enable`](Self::enable).
    ///
    /// `timclk_hz` is the APB1 timer clock.
    pub fn tim4(tim4: pac::TIM4, enable: gpiod::PD14<Output<PushPull>>, timclk_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim4en().set_bit());

        let tim = tim4;
        let max_duty = (timclk_hz / PWM_FREQ_HZ).clamp(2, u32::from(u16::MAX)) - 1;

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(0) });
        tim.arr.write(|w| unsafe { w.bits(max_duty) });

        // PWM mode 1 with preload on CH1 and CH2
        tim.ccmr1_output().modify(|_, w| unsafe {
            w.oc1m()
                .bits(0b110)
                .oc1pe()
                .set_bit()
                .oc2m()
                .bits(0b110)
                .oc2pe()
                .set_bit()
        });
        tim.ccr1.write(|w| unsafe { w.bits(0) });
        tim.ccr2.write(|w| unsafe { w.bits(0) });
        tim.ccer.modify(|_, w| w.cc1e().set_bit().cc2e().set_bit());

        tim.cr1.modify(|_, w| w.arpe().set_bit());
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());

        let mut bridge = Self {
            tim,
            enable,
            max_duty,
        };
        bridge.disable();
        bridge
    }

    pub fn enable(&mut self) {
        self.enable.set_high();
    }

    pub fn disable(&mut self) {
        self.set_duties(0, 0);
        self.enable.set_low();
    }

    fn set_duties(&mut self, ch1: u32, ch2: u32) {
        self.tim.ccr1.write(|w| unsafe { w.bits(ch1) });
        self.tim.ccr2.write(|w| unsafe { w.bits(ch2) });
    }
}

impl MotorDrive for HBridge {
    fn apply_voltage(&mut self, volts: f32) {
        if !volts.is_finite() {
            self.set_duties(0, 0);
            return;
        }

        let duty = (volts.abs() / BRIDGE_SUPPLY_VOLTAGE).min(1.0);
        let compare = (duty * self.max_duty as f32) as u32;

        if volts >= 0.0 {
            self.set_duties(compare, 0);
        } else {
            self.set_duties(0, compare);
        }
    }
}
