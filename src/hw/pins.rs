// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F767ZI paddle board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpioc, gpiod, gpiof, Alternate, Analog, Floating, Input, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOC, dp.GPIOD, dp.GPIOF);
/// ```
pub struct BoardPins {
    pub debug: DebugUartPins,
    pub link: LinkUartPins,
    pub encoder: EncoderPins,
    pub bridge: BridgePins,
    pub analog: AnalogPins,
    pub dio: DioPins,
}

/// USART3 to the ST-Link virtual COM port
pub struct DebugUartPins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

/// USART2 to the paired paddle
pub struct LinkUartPins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// TIM2 quadrature encoder inputs
pub struct EncoderPins {
    pub ch1: gpioa::PA0<Alternate<1>>,
    pub ch2: gpioa::PA1<Alternate<1>>,
}

/// H-bridge control pins
pub struct BridgePins {
    pub in1: gpiod::PD12<Alternate<2>>, // TIM4_CH1 (PWM)
    pub in2: gpiod::PD13<Alternate<2>>, // TIM4_CH2 (PWM)
    pub enable: gpiod::PD14<Output<PushPull>>,
}

pub struct AnalogPins {
    pub hall: gpioc::PC0<Analog>,    // ADC1_IN10
    pub current: gpioc::PC4<Analog>, // ADC2_IN14
}

/// Two-line debug header
pub struct DioPins {
    pub out0: gpiof::PF12<Output<PushPull>>,
    pub in1: gpiof::PF13<Input<Floating>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpioc: pac::GPIOC, gpiod: pac::GPIOD, gpiof: pac::GPIOF) -> Self {
        let gpioa = gpioa.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpiof = gpiof.split();

        Self {
            debug: DebugUartPins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },

            link: LinkUartPins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            encoder: EncoderPins {
                ch1: gpioa.pa0.into_alternate::<1>(),
                ch2: gpioa.pa1.into_alternate::<1>(),
            },

            bridge: BridgePins {
                in1: gpiod.pd12.into_alternate::<2>(),
                in2: gpiod.pd13.into_alternate::<2>(),
                enable: gpiod.pd14.into_push_pull_output(),
            },

            analog: AnalogPins {
                hall: gpioc.pc0.into_analog(),
                current: gpioc.pc4.into_analog(),
            },

            dio: DioPins {
                out0: gpiof.pf12.into_push_pull_output(),
                in1: gpiof.pf13.into_floating_input(),
            },
        }
    }
}
