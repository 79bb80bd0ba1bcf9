// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-capacity byte ring used for delay emulation and receive staging.
//!
//! Storage is an inline `[u8; N]`; one slot stays free to tell "full" from "empty", so the usable
//! capacity is `N - 1`. Nothing allocates and every operation is O(1) except [`retarget`] and
//! [`discard`], which are O(distance).
//!
//! Full and empty are not errors:
//! - [`push`] on a full queue drops the oldest byte to make room.
//! - [`pull`] on an empty queue returns `0`.
//!
//! [`retarget`]: DelayQueue::retarget
//! [`discard`]: DelayQueue::discard
//! [`push`]: DelayQueue::push
//! [`pull`]: DelayQueue::pull

use crate::protocol::codec::PAYLOAD_LEN;

pub struct DelayQueue<const N: usize> {
    buf: [u8; N],
    /// Index of the oldest byte.
    head: usize,
    /// Index of the next free slot.
    tail: usize,
}

impl<const N: usize> DelayQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        assert!(N >= 2, "DelayQueue needs at least one usable slot");
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Usable capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Number of queued bytes.
    #[inline]
    pub fn occupancy(&self) -> usize {
        (self.tail + N - self.head) % N
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupancy() == self.capacity()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Append `byte`. Returns `true` if the oldest byte was dropped to make room.
    pub fn push(&mut self, byte: u8) -> bool {
        let dropped = self.is_full();
        if dropped {
            self.head = (self.head + 1) % N;
        }
        self.buf[self.tail] = byte;
        self.tail = (self.tail + 1) % N;
        dropped
    }

    /// Remove and return the oldest byte, or `0` when empty.
    pub fn pull(&mut self) -> u8 {
        if self.is_empty() {
            return 0;
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % N;
        byte
    }

    /// Drop up to `n` of the oldest bytes; returns how many were dropped.
    pub fn discard(&mut self, n: usize) -> usize {
        let n = n.min(self.occupancy());
        self.head = (self.head + n) % N;
        n
    }

    /// Copy the oldest bytes into `out` without removing them; returns how many were copied.
    pub fn peek_into(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.occupancy());
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = self.buf[(self.head + i) % N];
        }
        n
    }

    /// The most recently pushed 4-byte sample, or zeros when fewer than four bytes are queued.
    fn newest_sample(&self) -> [u8; PAYLOAD_LEN] {
        let mut sample = [0u8; PAYLOAD_LEN];
        if self.occupancy() >= PAYLOAD_LEN {
            for (i, b) in sample.iter_mut().enumerate() {
                *b = self.buf[(self.tail + N - PAYLOAD_LEN + i) % N];
            }
        }
        sample
    }

    /// Steer occupancy toward `target` bytes (clamped to capacity).
    ///
    /// Excess bytes are drained from the old end. A deficit is padded at the new end by repeating
    /// the newest sample, so the emulated delay line holds a plausible value instead of a jump to
    /// zero. Converges in exactly `|occupancy - target|` single-byte operations.
    ///
    /// Returns the number of pushes and pulls performed.
    pub fn retarget(&mut self, target: usize) -> usize {
        let target = target.min(self.capacity());
        let mut ops = 0;

        while self.occupancy() > target {
            self.pull();
            ops += 1;
        }

        let pad = self.newest_sample();
        while self.occupancy() < target {
            self.push(pad[ops % PAYLOAD_LEN]);
            ops += 1;
        }
        ops
    }
}

impl<const N: usize> Default for DelayQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fifo_order_and_occupancy() {
        let mut q = DelayQueue::<16>::new();
        for b in 1..=7u8 {
            assert!(!q.push(b));
        }
        assert_eq!(q.occupancy(), 7);

        let pulled: Vec<u8> = (0..7).map(|_| q.pull()).collect();
        assert_eq!(pulled, [1, 2, 3, 4, 5, 6, 7]);
        assert!(q.is_empty());
    }

    #[test]
    fn pull_on_empty_returns_zero() {
        let mut q = DelayQueue::<4>::new();
        assert_eq!(q.pull(), 0);
        assert_eq!(q.occupancy(), 0);
    }

    #[test]
    fn push_on_full_drops_oldest() {
        let mut q = DelayQueue::<4>::new();
        assert_eq!(q.capacity(), 3);
        q.push(1);
        q.push(2);
        q.push(3);
        assert!(q.is_full());

        assert!(q.push(4));
        assert_eq!(q.occupancy(), 3);
        assert_eq!([q.pull(), q.pull(), q.pull()], [2, 3, 4]);
    }

    #[test]
    fn wraps_around_storage() {
        let mut q = DelayQueue::<5>::new();
        for round in 0..10u8 {
            q.push(round);
            q.push(round.wrapping_add(100));
            assert_eq!(q.pull(), round);
            assert_eq!(q.pull(), round.wrapping_add(100));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn retarget_converges_in_distance_operations() {
        let mut q = DelayQueue::<41>::new();
        assert_eq!(q.retarget(12), 12);
        assert_eq!(q.occupancy(), 12);

        assert_eq!(q.retarget(32), 20);
        assert_eq!(q.occupancy(), 32);

        assert_eq!(q.retarget(4), 28);
        assert_eq!(q.occupancy(), 4);

        assert_eq!(q.retarget(4), 0);

        assert_eq!(q.retarget(1000), q.capacity() - 4);
        assert_eq!(q.occupancy(), q.capacity());
    }

    #[test]
    fn retarget_pads_with_newest_sample() {
        let mut q = DelayQueue::<41>::new();
        for b in [9, 9, 9, 9, 1, 2, 3, 4] {
            q.push(b);
        }
        q.retarget(16);

        let mut out = [0u8; 16];
        assert_eq!(q.peek_into(&mut out), 16);
        assert_eq!(out, [9, 9, 9, 9, 1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn retarget_drains_oldest_first() {
        let mut q = DelayQueue::<16>::new();
        for b in 1..=8u8 {
            q.push(b);
        }
        q.retarget(4);
        assert_eq!([q.pull(), q.pull(), q.pull(), q.pull()], [5, 6, 7, 8]);
    }

    #[test]
    fn retarget_from_empty_pads_zeros() {
        let mut q = DelayQueue::<16>::new();
        q.retarget(8);
        let mut out = [0xAAu8; 8];
        q.peek_into(&mut out);
        assert_eq!(out, [0; 8]);
    }

    #[test]
    fn discard_and_peek() {
        let mut q = DelayQueue::<8>::new();
        for b in 10..15u8 {
            q.push(b);
        }
        assert_eq!(q.discard(2), 2);

        let mut out = [0u8; 8];
        assert_eq!(q.peek_into(&mut out), 3);
        assert_eq!(&out[..3], &[12, 13, 14]);
        assert_eq!(q.occupancy(), 3);

        assert_eq!(q.discard(10), 3);
        assert!(q.is_empty());
    }

    proptest! {
        #[test]
        fn steady_delay_line_lags_by_target(
            delay in 1usize..20,
            samples in proptest::collection::vec(any::<[u8; 4]>(), 1..60),
        ) {
            let mut q = DelayQueue::<81>::new();
            for (i, sample) in samples.iter().enumerate() {
                q.retarget(4 * delay);
                let out = [q.pull(), q.pull(), q.pull(), q.pull()];
                for &b in sample {
                    q.push(b);
                }

                let expected = if i >= delay { samples[i - delay] } else { [0; 4] };
                prop_assert_eq!(out, expected);
            }
        }
    }
}
