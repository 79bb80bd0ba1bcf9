// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Paddle firmware entry point: board bring-up and the three interrupt handlers.
//!
//! Priorities, highest first:
//! - `TIM6_DAC`: current loop, fixed 50 us period
//! - `USART2`: link byte pump
//! - `TIM5`: haptic loop, period from the `timestep [us]` tunable
//!
//! Each handler owns its task. `main` builds the tasks and hands each one over exactly once
//! through a `Mutex<RefCell<Option<_>>>`; the handler moves it into a handler-local static on its
//! first run. The only state shared between running handlers is atomics.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(not(target_os = "none"))]
fn main() {}

#[cfg(target_os = "none")]
mod firmware {
    use core::cell::RefCell;
    use core::fmt::Write;

    use cortex_m::interrupt::{self, Mutex};
    use cortex_m::peripheral::NVIC;
    use cortex_m_rt::entry;
    use heapless::spsc::Queue;
    use panic_halt as _;

    use hal::{
        gpio::{gpiod, Alternate},
        pac::{self, interrupt},
        prelude::*,
        serial::{Config, Serial},
    };
    use stm32f7xx_hal as hal;

    use hri_paddle::config::{
        Telemetry, Tunables, CURRENT_LOOP_PERIOD_US, LINK_BAUD, MOTOR_NOMINAL_TORQUE,
    };
    use hri_paddle::control::{
        CurrentRegulator, HapticLoop, LoopIo, LoopShared, RegulatorShared, Role,
    };
    use hri_paddle::hw::{
        link_uart, Adc, BoardPins, CurrentSensor, DebugHeader, Encoder, HBridge, LinkUart,
        PaddleInputs, PeriodicTimer, Usart,
    };
    use hri_paddle::protocol::SerialLink;
    use hri_paddle::registry::{register_paddle_vars, Registry};

    const TX_QUEUE: usize = 64;
    const RX_QUEUE: usize = 64;

    /// Idle samples averaged into the current sensor offset.
    const CALIBRATION_SAMPLES: u32 = 1000;

    static TUNABLES: Tunables = Tunables::new();
    static TELEMETRY: Telemetry = Telemetry::new();
    static REGULATOR: RegulatorShared = RegulatorShared::new(MOTOR_NOMINAL_TORQUE);

    type LinkPins = (gpiod::PD5<Alternate<7>>, gpiod::PD6<Alternate<7>>);
    type Link = SerialLink<'static, TX_QUEUE, RX_QUEUE>;

    struct HapticTask {
        haptic: HapticLoop<'static, PaddleInputs, Link, DebugHeader>,
        timer: PeriodicTimer<pac::TIM5>,
    }

    struct CurrentTask {
        regulator: CurrentRegulator<'static>,
        sense: CurrentSensor,
        bridge: HBridge,
        timer: PeriodicTimer<pac::TIM6>,
    }

    static HAPTIC_HANDOFF: Mutex<RefCell<Option<HapticTask>>> = Mutex::new(RefCell::new(None));
    static CURRENT_HANDOFF: Mutex<RefCell<Option<CurrentTask>>> = Mutex::new(RefCell::new(None));
    static LINK_HANDOFF: Mutex<RefCell<Option<LinkUart<LinkPins, TX_QUEUE, RX_QUEUE>>>> =
        Mutex::new(RefCell::new(None));

    #[entry]
    fn main() -> ! {
        // Peripherals
        let dp = pac::Peripherals::take().unwrap();
        let mut cp = cortex_m::Peripherals::take().unwrap();

        // Clocks
        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
        let timclk = clocks.timclk1().raw();

        let pins = BoardPins::new(dp.GPIOA, dp.GPIOC, dp.GPIOD, dp.GPIOF);

        // USART3 (DBG)
        let usart_cfg = Config {
            baud_rate: 115_200.bps(),
            ..Default::default()
        };
        let serial = Serial::new(
            dp.USART3,
            (pins.debug.tx, pins.debug.rx),
            &clocks,
            usart_cfg,
        );
        let mut usart = Usart::new(serial);

        let role = Role::from_features();
        let _ = writeln!(usart, "hri-paddle: role {:?}\r", role);

        // Current loop: bridge off while the sensor offset is measured
        let mut bridge = HBridge::tim4(dp.TIM4, pins.bridge.enable, timclk);
        let mut sense = CurrentSensor::new(Adc::adc2(dp.ADC2));
        sense.calibrate(CALIBRATION_SAMPLES);
        let _ = writeln!(
            usart,
            "current sense offset: {:.4} V\r",
            sense.calibration().offset_v
        );

        let mut regulator = CurrentRegulator::new(&REGULATOR);
        regulator.init();
        regulator.start_current_loop();
        bridge.enable();

        let current_timer = PeriodicTimer::tim6(dp.TIM6, timclk, CURRENT_LOOP_PERIOD_US);
        interrupt::free(|cs| {
            CURRENT_HANDOFF.borrow(cs).replace(Some(CurrentTask {
                regulator,
                sense,
                bridge,
                timer: current_timer,
            }))
        });

        // USART2 (paddle link)
        let link_cfg = Config {
            baud_rate: LINK_BAUD.bps(),
            ..Default::default()
        };
        let link_serial = Serial::new(dp.USART2, (pins.link.tx, pins.link.rx), &clocks, link_cfg);

        let tx_queue: &'static mut Queue<u8, TX_QUEUE> =
            cortex_m::singleton!(: Queue<u8, TX_QUEUE> = Queue::new()).unwrap();
        let rx_queue: &'static mut Queue<u8, RX_QUEUE> =
            cortex_m::singleton!(: Queue<u8, RX_QUEUE> = Queue::new()).unwrap();
        let (tx_prod, tx_cons) = tx_queue.split();
        let (rx_prod, rx_cons) = rx_queue.split();

        let pump = LinkUart::new(link_serial, rx_prod, tx_cons);
        interrupt::free(|cs| LINK_HANDOFF.borrow(cs).replace(Some(pump)));
        let link = SerialLink::new(tx_prod, rx_cons).with_overrun_flag(&link_uart::LINK_OVERRUN);

        // Haptic loop
        let inputs = PaddleInputs {
            hall: Adc::adc1(dp.ADC1),
            encoder: Encoder::tim2(dp.TIM2),
        };
        let haptic = HapticLoop::new(
            role.config(),
            LoopShared {
                tunables: &TUNABLES,
                regulator: &REGULATOR,
                telemetry: &TELEMETRY,
            },
            LoopIo {
                sensors: inputs,
                link,
                dio: DebugHeader::new(pins.dio),
            },
        );
        let haptic_timer = PeriodicTimer::tim5(dp.TIM5, timclk, TUNABLES.period_us());
        interrupt::free(|cs| {
            HAPTIC_HANDOFF.borrow(cs).replace(Some(HapticTask {
                haptic,
                timer: haptic_timer,
            }))
        });

        // Host-facing variables
        let mut registry: Registry<'static, 16> = Registry::new();
        match register_paddle_vars(&mut registry, &TUNABLES, &TELEMETRY) {
            Ok(()) => {
                for var in registry.iter() {
                    let _ = writeln!(usart, "  var: {} ({:?})\r", var.name, var.access);
                }
            }
            Err(e) => {
                let _ = writeln!(usart, "registry: {}\r", e);
            }
        }
        registry.lock();

        // Interrupt priorities (lower value = more urgent) and start
        unsafe {
            cp.NVIC.set_priority(pac::Interrupt::TIM6_DAC, 0x10);
            cp.NVIC.set_priority(pac::Interrupt::USART2, 0x20);
            cp.NVIC.set_priority(pac::Interrupt::TIM5, 0x30);
            NVIC::unmask(pac::Interrupt::TIM6_DAC);
            NVIC::unmask(pac::Interrupt::USART2);
            NVIC::unmask(pac::Interrupt::TIM5);
        }
        interrupt::free(|cs| {
            if let Some(task) = CURRENT_HANDOFF.borrow(cs).borrow_mut().as_mut() {
                task.timer.start();
            }
            if let Some(task) = HAPTIC_HANDOFF.borrow(cs).borrow_mut().as_mut() {
                task.timer.start();
            }
        });

        usart.println("running");

        loop {
            // One status line per second at 216 MHz
            cortex_m::asm::delay(216_000_000);
            usart.print_status(&TELEMETRY);
        }
    }

    #[interrupt]
    fn TIM6_DAC() {
        static mut TASK: Option<CurrentTask> = None;

        if TASK.is_none() {
            *TASK = interrupt::free(|cs| CURRENT_HANDOFF.borrow(cs).replace(None));
        }
        let Some(task) = TASK.as_mut() else {
            return;
        };
        if !task.timer.acknowledge() {
            return;
        }

        let dt = task.timer.dt();
        task.regulator
            .step_drive(&mut task.sense, &mut task.bridge, dt);
    }

    #[interrupt]
    fn USART2() {
        static mut LINK: Option<LinkUart<LinkPins, TX_QUEUE, RX_QUEUE>> = None;

        if LINK.is_none() {
            *LINK = interrupt::free(|cs| LINK_HANDOFF.borrow(cs).replace(None));
        }
        if let Some(link) = LINK.as_mut() {
            link.on_interrupt();
        }
    }

    #[interrupt]
    fn TIM5() {
        static mut TASK: Option<HapticTask> = None;

        if TASK.is_none() {
            *TASK = interrupt::free(|cs| HAPTIC_HANDOFF.borrow(cs).replace(None));
        }
        let Some(task) = TASK.as_mut() else {
            return;
        };
        if !task.timer.acknowledge() {
            return;
        }

        task.haptic.tick();
        link_uart::kick_tx();

        let elapsed = task.timer.elapsed_us();
        task.haptic.record_tick_duration(elapsed);
        task.timer.set_period_us(TUNABLES.period_us());
    }
}
