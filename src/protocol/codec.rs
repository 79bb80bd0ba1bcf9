// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Paddle-to-paddle link frame.
//!
//! One frame carries one `f32` per tick:
//!
//! ```text
//! +--------+--------+--------+--------+--------+
//! |  0x4D  | bits 0 | bits 8 | bits16 | bits24 |
//! +--------+--------+--------+--------+--------+
//! ```
//!
//! The payload is the IEEE-754 bit pattern, least significant byte first. There is no checksum:
//! a corrupted payload decodes to a wrong but plausible value, and the decoder resynchronises on
//! the next sentinel byte.

/// Sync byte opening every frame.
pub const SENTINEL: u8 = 0x4D;

/// Payload length in bytes.
pub const PAYLOAD_LEN: usize = 4;

/// Full frame length in bytes.
pub const FRAME_LEN: usize = 1 + PAYLOAD_LEN;

/// Encode `value` as a sentinel-prefixed frame.
pub fn encode(value: f32) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = SENTINEL;
    frame[1..].copy_from_slice(&payload_bytes(value));
    frame
}

/// Split the bit pattern of `value` into little-endian payload bytes.
#[inline]
pub fn payload_bytes(value: f32) -> [u8; PAYLOAD_LEN] {
    let bits = value.to_bits();
    let mut out = [0u8; PAYLOAD_LEN];
    for (i, b) in out.iter_mut().enumerate() {
        *b = ((bits >> (8 * i)) & 0xFF) as u8;
    }
    out
}

/// Reassemble a value from little-endian payload bytes.
#[inline]
pub fn value_from_payload(payload: [u8; PAYLOAD_LEN]) -> f32 {
    let bits = payload
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)));
    f32::from_bits(bits)
}

/// Outcome of one [`decode`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decoded {
    /// Payload of the first complete frame, if any.
    pub value: Option<f32>,
    /// Bytes the caller must drop from the front of its buffer.
    pub consumed: usize,
    /// Of `consumed`, how many were garbage preceding the sentinel.
    pub discarded: usize,
}

/// Look for the first frame in `bytes`.
///
/// - Sentinel with a full payload behind it: the frame and everything before it is consumed.
/// - Sentinel with a partial payload: only the bytes before the sentinel are consumed, so the
///   partial frame stays buffered for the next call.
/// - No sentinel: every byte is discarded.
pub fn decode(bytes: &[u8]) -> Decoded {
    let Some(start) = bytes.iter().position(|&b| b == SENTINEL) else {
        return Decoded {
            value: None,
            consumed: bytes.len(),
            discarded: bytes.len(),
        };
    };

    let end = start + FRAME_LEN;
    if end > bytes.len() {
        return Decoded {
            value: None,
            consumed: start,
            discarded: start,
        };
    }

    let mut payload = [0u8; PAYLOAD_LEN];
    payload.copy_from_slice(&bytes[start + 1..end]);

    Decoded {
        value: Some(value_from_payload(payload)),
        consumed: end,
        discarded: start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_little_endian_bit_pattern() {
        let frame = encode(1.0);
        // 1.0f32 == 0x3F80_0000
        assert_eq!(frame, [SENTINEL, 0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn garbage_prefix_is_reported_as_discarded() {
        let value = -12.375_f32;
        let mut stream = [0u8; 8];
        stream[..3].copy_from_slice(&[0x01, 0xFF, 0x20]);
        stream[3..].copy_from_slice(&encode(value));

        let d = decode(&stream);
        assert_eq!(d.value.map(f32::to_bits), Some(value.to_bits()));
        assert_eq!(d.discarded, 3);
        assert_eq!(d.consumed, 8);
    }

    #[test]
    fn partial_frame_is_left_in_place() {
        let frame = encode(3.5);
        let stream = [0x11, 0x22, frame[0], frame[1], frame[2]];

        let d = decode(&stream);
        assert_eq!(d.value, None);
        assert_eq!(d.consumed, 2);
        assert_eq!(d.discarded, 2);

        let d = decode(&stream[d.consumed..]);
        assert_eq!(d.value, None);
        assert_eq!(d.consumed, 0);
    }

    #[test]
    fn no_sentinel_discards_everything() {
        let d = decode(&[0x00, 0x01, 0x02]);
        assert_eq!(d.value, None);
        assert_eq!(d.consumed, 3);
        assert_eq!(d.discarded, 3);

        assert_eq!(decode(&[]).consumed, 0);
    }

    #[test]
    fn locks_on_genuine_frame_after_sentinel_inside_corrupted_payload() {
        let genuine = 7.25_f32;
        // Corrupted frame whose payload contains the sentinel value.
        let mut stream = [0u8; 2 * FRAME_LEN];
        stream[..FRAME_LEN].copy_from_slice(&[SENTINEL, 0x10, SENTINEL, 0x30, 0x40]);
        stream[FRAME_LEN..].copy_from_slice(&encode(genuine));

        let mut buf = &stream[..];
        let mut found = None;
        let mut scanned = 0;
        while !buf.is_empty() {
            let d = decode(buf);
            if d.consumed == 0 {
                break;
            }
            scanned += d.consumed;
            buf = &buf[d.consumed..];
            if d.value.map(f32::to_bits) == Some(genuine.to_bits()) {
                found = d.value;
                break;
            }
        }
        assert_eq!(found, Some(genuine));
        assert!(scanned <= 2 * FRAME_LEN);
    }

    #[test]
    fn truncated_frame_resyncs_within_two_frames() {
        let genuine = -0.015_f32;
        // A frame that lost its last two bytes, followed by two genuine frames.
        let mut stream = [0u8; 3 + 2 * FRAME_LEN];
        stream[..3].copy_from_slice(&encode(1.0)[..3]);
        stream[3..3 + FRAME_LEN].copy_from_slice(&encode(genuine));
        stream[3 + FRAME_LEN..].copy_from_slice(&encode(genuine));

        let mut buf = &stream[..];
        let mut last = None;
        let mut scanned = 0;
        while let Some(v) = {
            let d = decode(buf);
            buf = &buf[d.consumed..];
            scanned += d.consumed;
            d.value
        } {
            last = Some(v);
            if v == genuine {
                break;
            }
        }
        assert_eq!(last, Some(genuine));
        assert!(scanned <= 3 + 2 * FRAME_LEN);
    }
}
