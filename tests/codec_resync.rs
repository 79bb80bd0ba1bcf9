// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Frame recovery from a noisy byte stream, for both the slice decoder and the streaming parser.

use proptest::collection::vec;
use proptest::prelude::*;

use hri_paddle::protocol::codec::payload_bytes;
use hri_paddle::protocol::{decode, encode, FrameParser, FRAME_LEN, SENTINEL};

/// Values whose payload never contains the sentinel byte.
fn clean_value() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("payload contains the sentinel", |v| {
        !payload_bytes(*v).contains(&SENTINEL)
    })
}

fn noise_without_sentinel() -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>().prop_filter("sentinel", |b| *b != SENTINEL), 0..24)
}

proptest! {
    #[test]
    fn decoder_skips_noise_before_a_frame(noise in noise_without_sentinel(), value in any::<f32>()) {
        let mut bytes = noise.clone();
        bytes.extend_from_slice(&encode(value));

        let d = decode(&bytes);
        prop_assert_eq!(d.value.map(f32::to_bits), Some(value.to_bits()));
        prop_assert_eq!(d.discarded, noise.len());
        prop_assert_eq!(d.consumed, noise.len() + FRAME_LEN);
    }

    #[test]
    fn parser_locks_on_within_two_frames(
        noise in vec(any::<u8>(), 0..32),
        values in vec(clean_value(), 3),
    ) {
        let mut parser = FrameParser::new();
        let mut last = None;

        for &b in &noise {
            if let Some(v) = parser.push(b) {
                last = Some(v);
            }
        }
        for &v in &values {
            for &b in &encode(v) {
                if let Some(out) = parser.push(b) {
                    last = Some(out);
                }
            }
        }

        prop_assert_eq!(last.map(f32::to_bits), Some(values[2].to_bits()));
    }

    #[test]
    fn repeated_decoding_ends_on_the_last_frame(
        noise in vec(any::<u8>(), 0..32),
        values in vec(clean_value(), 3),
    ) {
        let mut bytes = noise;
        for &v in &values {
            bytes.extend_from_slice(&encode(v));
        }

        let mut rest = &bytes[..];
        let mut last = None;
        loop {
            let d = decode(rest);
            if d.value.is_some() {
                last = d.value;
            }
            if d.consumed == 0 {
                break;
            }
            rest = &rest[d.consumed..];
        }

        prop_assert_eq!(last.map(f32::to_bits), Some(values[2].to_bits()));
    }
}
