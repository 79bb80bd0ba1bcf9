// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Blocking single-channel ADC reads using direct PAC register access.
//!
//! The Hall sensor sits on ADC1 (read by the haptic loop) and the current sensor on ADC2 (read by
//! the current loop), so the two loops never share a converter.
//!
//! Example:
//! ```ignore
//! let mut hall = Adc::adc1(dp.ADC1);
//! let volts = hall.read_volts(HALL_CHANNEL);
//! ```

use core::ops::Deref;

use stm32f7xx_hal::pac;

use crate::drivers::paddle::{adc_to_volts, CurrentSenseCal};
use crate::drivers::CurrentSense;

/// ADC reference voltage [V].
pub const VREF: f32 = 3.3;

/// Conversion resolution.
pub const RESOLUTION_BITS: u8 = 12;

/// ADC1 channel of the Hall sensor (PC0).
pub const HALL_CHANNEL: u8 = 10;

/// ADC2 channel of the current sense amplifier (PC4).
pub const CURRENT_CHANNEL: u8 = 14;

/// 56 cycles (0b011) in every SMPx field: short enough for the 50 us current loop.
const SMPR1_56_CYCLES: u32 = 0x036D_B6DB;
const SMPR2_56_CYCLES: u32 = 0x1B6D_B6DB;

type RegisterBlock = pac::adc1::RegisterBlock;

pub struct Adc<ADC> {
    adc: ADC,
}

impl<ADC: Deref<Target = RegisterBlock>> Adc<ADC> {
    fn init(adc: ADC) -> Self {
        let common = unsafe { &*pac::ADC_COMMON::ptr() };
        common.ccr.modify(|_, w| w.adcpre().div4());

        adc.cr2.modify(|_, w| w.adon().clear_bit());

        // 12-bit, right-aligned, single conversion on software trigger
        adc.cr1.modify(|_, w| w.res().bits(0b00));
        adc.cr2.modify(|_, w| {
            w.cont().clear_bit();
            w.align().right();
            w.exten().disabled();
            w
        });
        adc.smpr1.write(|w| unsafe { w.bits(SMPR1_56_CYCLES) });
        adc.smpr2.write(|w| unsafe { w.bits(SMPR2_56_CYCLES) });
        adc.sqr1.modify(|_, w| w.l().bits(0));

        adc.cr2.modify(|_, w| w.adon().set_bit());
        Self { adc }
    }

    /// Convert `channel` once and return the raw code.
    pub fn read(&self, channel: u8) -> u16 {
        self.adc
            .sqr3
            .modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });
        self.adc.cr2.modify(|_, w| w.swstart().set_bit());

        while self.adc.sr.read().eoc().bit_is_clear() {}

        self.adc.dr.read().data().bits() as u16
    }

    #[inline]
    pub fn read_volts(&self, channel: u8) -> f32 {
        adc_to_volts(self.read(channel), VREF, RESOLUTION_BITS)
    }
}

impl Adc<pac::ADC1> {
    pub fn adc1(adc1: pac::ADC1) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());
        Self::init(adc1)
    }
}

impl Adc<pac::ADC2> {
    pub fn adc2(adc2: pac::ADC2) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc2en().set_bit());
        Self::init(adc2)
    }
}

/// Motor current measured on ADC2.
pub struct CurrentSensor {
    adc: Adc<pac::ADC2>,
    cal: CurrentSenseCal,
}

impl CurrentSensor {
    /// Gain of the current sense amplifier [A/V].
    pub const AMPS_PER_VOLT: f32 = 2.0;

    pub fn new(adc: Adc<pac::ADC2>) -> Self {
        Self {
            adc,
            cal: CurrentSenseCal::uncalibrated(Self::AMPS_PER_VOLT),
        }
    }

    /// Measure the zero-current offset. The bridge must be idle.
    pub fn calibrate(&mut self, samples: u32) {
        let adc = &self.adc;
        self.cal
            .calibrate((0..samples).map(|_| adc.read_volts(CURRENT_CHANNEL)));
    }

    #[inline]
    pub fn calibration(&self) -> CurrentSenseCal {
        self.cal
    }
}

impl CurrentSense for CurrentSensor {
    fn current_amps(&mut self) -> f32 {
        self.cal.amps(self.adc.read_volts(CURRENT_CHANNEL))
    }
}
