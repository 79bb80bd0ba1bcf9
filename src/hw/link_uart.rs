// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART2 interrupt pump between the paired-paddle UART and the link byte queues.
//!
//! The haptic loop only sees the other ends of the queues (through
//! [`SerialLink`](crate::protocol::SerialLink)). This side is driven from the `USART2` handler:
//! received bytes are queued, queued bytes are sent while the transmitter is free, and the TXE
//! interrupt is armed only while there is something to send.

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::spsc::{Consumer, Producer};
use stm32f7xx_hal::{
    pac,
    serial::{Pins, Serial},
};

/// Raised when a received byte was lost, either in the peripheral or because the RX queue was
/// full. Cleared by the reader.
pub static LINK_OVERRUN: AtomicBool = AtomicBool::new(false);

fn regs() -> &'static pac::usart1::RegisterBlock {
    unsafe { &*pac::USART2::ptr() }
}

/// Arm the TXE interrupt so the pump starts draining the TX queue.
///
/// Called by the haptic loop after queueing a frame.
pub fn kick_tx() {
    cortex_m::interrupt::free(|_| regs().cr1.modify(|_, w| w.txeie().set_bit()));
}

pub struct LinkUart<PINS, const TX: usize, const RX: usize> {
    _serial: Serial<pac::USART2, PINS>,
    rx: Producer<'static, u8, RX>,
    tx: Consumer<'static, u8, TX>,
}

impl<PINS, const TX: usize, const RX: usize> LinkUart<PINS, TX, RX>
where
    PINS: Pins<pac::USART2>,
{
    /// Take over a configured serial port and enable its RX interrupt.
    pub fn new(
        serial: Serial<pac::USART2, PINS>,
        rx: Producer<'static, u8, RX>,
        tx: Consumer<'static, u8, TX>,
    ) -> Self {
        cortex_m::interrupt::free(|_| regs().cr1.modify(|_, w| w.rxneie().set_bit()));
        Self {
            _serial: serial,
            rx,
            tx,
        }
    }

    /// Service the peripheral. Call from the `USART2` interrupt handler.
    pub fn on_interrupt(&mut self) {
        let usart = regs();
        let isr = usart.isr.read();

        if isr.ore().bit_is_set() {
            usart.icr.write(|w| w.orecf().set_bit());
            LINK_OVERRUN.store(true, Ordering::Relaxed);
        }

        if isr.rxne().bit_is_set() {
            let byte = usart.rdr.read().rdr().bits() as u8;
            if self.rx.enqueue(byte).is_err() {
                LINK_OVERRUN.store(true, Ordering::Relaxed);
            }
        }

        if isr.txe().bit_is_set() {
            match self.tx.dequeue() {
                Some(byte) => usart.tdr.write(|w| w.tdr().bits(u16::from(byte))),
                None => cortex_m::interrupt::free(|_| {
                    usart.cr1.modify(|_, w| w.txeie().clear_bit())
                }),
            }
        }
    }
}
