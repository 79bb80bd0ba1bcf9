// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # HRI Paddle Firmware
//!
//! This crate contains the firmware for the haptic paddle used in the teleoperation and shared
//! control rigs, written in Rust, targeting an STM32F767 MCU.
//!
//! Two paddles are wired back to back over a UART. Every haptic tick each paddle sends one scalar
//! (its angle or its torque) and renders a force computed from the one it last received.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`control`] | Current regulator, haptic loop, control laws, PID and filters |
//! | [`protocol`] | Paddle-to-paddle frame codec, delay queue and byte transport |
//! | [`config`] | Board constants, host tunables and published telemetry |
//! | [`registry`] | Named variables exposed to the host monitor |
//! | [`drivers`] | Sensor and actuator traits, unit conversions |
//! | [`sync`] | Lock-free `f32` cell shared across interrupt priorities |
//! | `hw` | MCU-level wrappers around ADC, timers, PWM, GPIO and USART (MCU target only) |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash a board in a given role:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf --no-default-features --features role-wall
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod protocol;
pub mod registry;
pub mod sync;

#[cfg(target_os = "none")]
pub mod hw;
