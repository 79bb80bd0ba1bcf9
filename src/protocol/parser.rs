// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time frame parser for the paddle link.
//!
//! Same framing as [`decode`](crate::protocol::codec::decode), for consumers that see bytes one at
//! a time (e.g. straight out of a receive interrupt). A partial frame is kept across calls.

use crate::protocol::codec::{value_from_payload, PAYLOAD_LEN, SENTINEL};

enum State {
    WaitSentinel,
    Payload { len: usize },
}

pub struct FrameParser {
    state: State,
    payload: [u8; PAYLOAD_LEN],
    discarded: u32,
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: State::WaitSentinel,
            payload: [0; PAYLOAD_LEN],
            discarded: 0,
        }
    }

    /// Process a single incoming byte. Returns `Some(value)` once a complete frame is received.
    pub fn push(&mut self, byte: u8) -> Option<f32> {
        match self.state {
            State::WaitSentinel => {
                if byte == SENTINEL {
                    self.state = State::Payload { len: 0 };
                } else {
                    self.discarded = self.discarded.wrapping_add(1);
                }
                None
            }
            State::Payload { len } => {
                self.payload[len] = byte;
                let len = len + 1;
                if len < PAYLOAD_LEN {
                    self.state = State::Payload { len };
                    return None;
                }

                self.state = State::WaitSentinel;
                Some(value_from_payload(self.payload))
            }
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = State::WaitSentinel;
    }

    /// Bytes skipped while hunting for a sentinel since construction.
    #[inline]
    pub fn discarded(&self) -> u32 {
        self.discarded
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode;

    #[test]
    fn partial_frame_survives_between_pushes() {
        let mut p = FrameParser::new();
        let frame = encode(-4.5);

        for &b in &frame[..3] {
            assert_eq!(p.push(b), None);
        }
        assert_eq!(p.push(frame[3]), None);
        assert_eq!(p.push(frame[4]), Some(-4.5));
    }

    #[test]
    fn garbage_is_counted() {
        let mut p = FrameParser::new();
        for b in [0x00, 0x13, 0xEE] {
            assert_eq!(p.push(b), None);
        }
        assert_eq!(p.discarded(), 3);

        let values: Vec<f32> = encode(2.0).iter().filter_map(|&b| p.push(b)).collect();
        assert_eq!(values, [2.0]);
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut p = FrameParser::new();
        let frame = encode(9.0);
        p.push(frame[0]);
        p.push(frame[1]);
        p.reset();

        let values: Vec<f32> = encode(1.5).iter().filter_map(|&b| p.push(b)).collect();
        assert_eq!(values, [1.5]);
    }
}
