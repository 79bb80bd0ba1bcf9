// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Non-blocking byte transport between the haptic loop and the link UART.
//!
//! The haptic loop never touches the UART registers. Outgoing bytes go into a TX queue that the
//! UART interrupt drains; incoming bytes are queued by the same interrupt and polled here. Both
//! directions return [`nb::Error::WouldBlock`] instead of waiting.

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::spsc::{Consumer, Producer};
use thiserror::Error;

/// Transport-level faults. None of them stop the control loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The TX queue had no room for the byte.
    #[error("transmit queue full")]
    TxFull,
    /// The receiver lost bytes before they were queued.
    #[error("receive overrun")]
    Overrun,
}

/// Byte transport seen by the haptic loop.
pub trait ByteLink {
    /// Queue one byte for transmission.
    fn send(&mut self, byte: u8) -> nb::Result<(), LinkError>;

    /// Take the oldest received byte, if any.
    fn recv(&mut self) -> nb::Result<u8, LinkError>;

    /// Free room in the transmit queue, in bytes.
    fn tx_room(&self) -> usize;
}

/// [`ByteLink`] over a pair of SPSC queues whose other ends belong to the UART interrupt.
pub struct SerialLink<'a, const TX: usize, const RX: usize> {
    tx: Producer<'a, u8, TX>,
    rx: Consumer<'a, u8, RX>,
    overrun: Option<&'a AtomicBool>,
}

impl<'a, const TX: usize, const RX: usize> SerialLink<'a, TX, RX> {
    pub fn new(tx: Producer<'a, u8, TX>, rx: Consumer<'a, u8, RX>) -> Self {
        Self {
            tx,
            rx,
            overrun: None,
        }
    }

    /// Report [`LinkError::Overrun`] once each time the interrupt side raises `flag`.
    pub fn with_overrun_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.overrun = Some(flag);
        self
    }

    /// Bytes waiting in the receive queue.
    #[inline]
    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }
}

impl<const TX: usize, const RX: usize> ByteLink for SerialLink<'_, TX, RX> {
    fn send(&mut self, byte: u8) -> nb::Result<(), LinkError> {
        self.tx
            .enqueue(byte)
            .map_err(|_| nb::Error::Other(LinkError::TxFull))
    }

    fn recv(&mut self) -> nb::Result<u8, LinkError> {
        if let Some(flag) = self.overrun {
            if flag.swap(false, Ordering::Relaxed) {
                return Err(nb::Error::Other(LinkError::Overrun));
            }
        }
        self.rx.dequeue().ok_or(nb::Error::WouldBlock)
    }

    fn tx_room(&self) -> usize {
        self.tx.capacity() - self.tx.len()
    }
}

/// Queue a whole frame, or nothing if it does not fit.
///
/// Returns `false` when the frame was dropped. A half-sent frame would desynchronise the peer for
/// one extra frame, so frames are all-or-nothing.
pub fn send_frame<L: ByteLink>(link: &mut L, frame: &[u8]) -> bool {
    if link.tx_room() < frame.len() {
        return false;
    }
    frame.iter().all(|&b| link.send(b).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{encode, FRAME_LEN};
    use heapless::spsc::Queue;

    #[test]
    fn frames_are_all_or_nothing() {
        let mut txq: Queue<u8, 8> = Queue::new();
        let mut rxq: Queue<u8, 8> = Queue::new();
        let (tx, mut uart_tx) = txq.split();
        let (_uart_rx, rx) = rxq.split();
        let mut link = SerialLink::new(tx, rx);

        assert_eq!(link.tx_room(), 7);
        assert!(send_frame(&mut link, &encode(1.0)));
        assert!(!send_frame(&mut link, &encode(2.0)));
        assert_eq!(uart_tx.len(), FRAME_LEN);

        let sent: Vec<u8> = core::iter::from_fn(|| uart_tx.dequeue()).collect();
        assert_eq!(sent, encode(1.0));
    }

    #[test]
    fn recv_would_block_when_empty() {
        let mut txq: Queue<u8, 4> = Queue::new();
        let mut rxq: Queue<u8, 4> = Queue::new();
        let (tx, _uart_tx) = txq.split();
        let (mut uart_rx, rx) = rxq.split();
        let mut link = SerialLink::new(tx, rx);

        assert_eq!(link.recv(), Err(nb::Error::WouldBlock));
        uart_rx.enqueue(0x4D).unwrap();
        assert_eq!(link.rx_pending(), 1);
        assert_eq!(link.recv(), Ok(0x4D));
    }

    #[test]
    fn overrun_is_reported_once() {
        let flag = AtomicBool::new(false);
        let mut txq: Queue<u8, 4> = Queue::new();
        let mut rxq: Queue<u8, 4> = Queue::new();
        let (tx, _uart_tx) = txq.split();
        let (mut uart_rx, rx) = rxq.split();
        let mut link = SerialLink::new(tx, rx).with_overrun_flag(&flag);

        uart_rx.enqueue(7).unwrap();
        flag.store(true, Ordering::Relaxed);
        assert_eq!(link.recv(), Err(nb::Error::Other(LinkError::Overrun)));
        assert_eq!(link.recv(), Ok(7));
        assert_eq!(link.recv(), Err(nb::Error::WouldBlock));
    }
}
