#![allow(dead_code)] // not every test exercises every capture handle

//! Shared rig for integration tests
//!
//! Wires the full handler set to mock peripherals the same way the firmware
//! entry point does, and drives scheduler passes with a simulated 1 ms tick
//! interrupt and a wall clock advancing once per thousand ticks.

use std::rc::Rc;

use hygrolog_core::handlers::{
    AlertConfig, ConsoleHandler, ConsolePort, LogPort, LoggerHandler, ModemHandler,
    RouterHandler, RouterRequest, SamplerHandler, ROUTER_SLOTS,
};
use hygrolog_core::mock::{MockIndicator, MockModem, MockSensor, MockStorage, MockTransport};
use hygrolog_core::{FixedClock, Mailbox, Scheduler, SensorSample, TimerService};

use hygrolog_core::handlers::modem::{ModemRequest, MODEM_SLOTS};
use hygrolog_core::text::bounded;

/// Ticks per wall-clock second
const TICKS_PER_SECOND: u32 = 1000;

pub struct FirmwareRig {
    pub scheduler: Scheduler,
    pub timers: Rc<TimerService>,
    pub clock: Rc<FixedClock>,
    pub sensor: MockSensor,
    pub storage: MockStorage,
    pub transport: MockTransport,
    pub modem: MockModem,
    pub indicator: MockIndicator,
    pub router_mail: Mailbox<RouterRequest, ROUTER_SLOTS>,
    pub console_port: ConsolePort,
    pub log_port: LogPort,
    tick_accum: u32,
}

impl FirmwareRig {
    /// Build the full handler set in the firmware's construction order
    pub fn new(config: AlertConfig) -> Self {
        let timers = Rc::new(TimerService::new());
        let clock = Rc::new(FixedClock::new(1451606400)); // 2016-01-01 00:00:00

        let sensor = MockSensor::new(SensorSample {
            temperature_c: 21.5,
            humidity_pct: 48.2,
        });
        let storage = MockStorage::new();
        let transport = MockTransport::new();
        let modem = MockModem::new();
        let indicator = MockIndicator::new();

        let router_mail: Mailbox<RouterRequest, ROUTER_SLOTS> = Mailbox::new();
        let modem_mail: Mailbox<ModemRequest, MODEM_SLOTS> = Mailbox::new();
        let console_port = ConsolePort::new(clock.clone());
        let log_port = LogPort::new(clock.clone());

        let scheduler = Scheduler::builder()
            .add_handler(SamplerHandler::new(
                sensor.clone(),
                router_mail.clone(),
                timers.clone(),
                clock.clone(),
            ))
            .add_handler(ConsoleHandler::new(transport.clone(), console_port.clone()))
            .add_handler(RouterHandler::new(
                router_mail.clone(),
                console_port.clone(),
                log_port.clone(),
                Some(modem_mail.clone()),
                indicator.clone(),
                timers.clone(),
                config,
            ))
            .add_handler(LoggerHandler::new(
                storage.clone(),
                log_port.clone(),
                timers.clone(),
                router_mail.clone(),
            ))
            .add_handler(ModemHandler::new(
                modem.clone(),
                modem_mail,
                console_port.clone(),
                router_mail.clone(),
                timers.clone(),
                bounded("+15550100"),
            ))
            .build();

        Self {
            scheduler,
            timers,
            clock,
            sensor,
            storage,
            transport,
            modem,
            indicator,
            router_mail,
            console_port,
            log_port,
            tick_accum: 0,
        }
    }

    /// Run `passes` scheduler passes with `ticks_per_pass` timer ticks each
    pub fn run(&mut self, passes: usize, ticks_per_pass: u32) {
        for _ in 0..passes {
            self.scheduler.run_pass();
            for _ in 0..ticks_per_pass {
                self.timers.tick();
                self.tick_accum += 1;
                if self.tick_accum == TICKS_PER_SECOND {
                    self.tick_accum = 0;
                    self.clock.advance(1);
                }
            }
        }
    }
}
