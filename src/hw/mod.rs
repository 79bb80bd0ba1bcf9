// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Board Layer
//!
//! MCU-level wrappers for the STM32F767 paddle board, implementing the traits in
//! [`drivers`](crate::drivers). Only built for the MCU target.

pub mod adc;
pub mod bridge;
pub mod dio;
pub mod encoder;
pub mod link_uart;
pub mod pins;
pub mod timer;
pub mod usart;

pub use adc::{Adc, CurrentSensor};
pub use bridge::HBridge;
pub use dio::DebugHeader;
pub use encoder::Encoder;
pub use link_uart::LinkUart;
pub use pins::BoardPins;
pub use timer::PeriodicTimer;
pub use usart::Usart;

use stm32f7xx_hal::pac;

use crate::drivers::PaddleSensors;

/// Sensors read by the haptic loop: Hall sensor on ADC1 and the shaft encoder on TIM2.
pub struct PaddleInputs {
    pub hall: Adc<pac::ADC1>,
    pub encoder: Encoder<pac::TIM2>,
}

impl PaddleSensors for PaddleInputs {
    fn hall_voltage(&mut self) -> f32 {
        self.hall.read_volts(adc::HALL_CHANNEL)
    }

    fn shaft_angle_deg(&mut self) -> f32 {
        self.encoder.shaft_deg()
    }
}
