// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Paddle-to-paddle link: frame codec, byte queues and transport.

pub mod codec;
pub mod link;
pub mod parser;
pub mod queue;

pub use codec::{decode, encode, Decoded, FRAME_LEN, SENTINEL};
pub use link::{ByteLink, LinkError, SerialLink};
pub use parser::FrameParser;
pub use queue::DelayQueue;
