//! Host simulator for the HygroLog core
//!
//! Wires the full handler set to deterministic mock peripherals and runs the
//! cooperative loop for a stretch of simulated time: the humidity ramps up
//! until it crosses the alert threshold, storage and console capture
//! everything, and the captures are dumped at the end. This is the host
//! stand-in for the firmware entry point — same wiring, mock hardware.

use std::rc::Rc;

use hygrolog_core::handlers::modem::{ModemRequest, MODEM_SLOTS};
use hygrolog_core::handlers::{
    AlertConfig, ConsoleHandler, ConsolePort, LogPort, LoggerHandler, ModemHandler,
    RouterHandler, RouterRequest, SamplerHandler, ROUTER_SLOTS,
};
use hygrolog_core::mock::{MockIndicator, MockModem, MockSensor, MockStorage, MockTransport};
use hygrolog_core::text::bounded;
use hygrolog_core::{FixedClock, Mailbox, Scheduler, SensorSample, TimerService, VERSION};

const PROGRAM_TITLE: &str = "HygroLog Environmental Monitor";

/// Simulated seconds to run for
const RUN_SECONDS: u32 = 120;

/// Scheduler passes per simulated second (10 ticks elapse between passes)
const PASSES_PER_SECOND: u32 = 100;

fn main() {
    let timers = Rc::new(TimerService::new());
    let clock = Rc::new(FixedClock::new(1451606400)); // 2016-01-01 00:00:00

    let sensor = MockSensor::new(SensorSample {
        temperature_c: 21.5,
        humidity_pct: 60.0,
    });
    let storage = MockStorage::new();
    let transport = MockTransport::new();
    let modem = MockModem::new();

    let router_mail: Mailbox<RouterRequest, ROUTER_SLOTS> = Mailbox::new();
    let modem_mail: Mailbox<ModemRequest, MODEM_SLOTS> = Mailbox::new();
    let console_port = ConsolePort::new(clock.clone());
    let log_port = LogPort::new(clock.clone());

    let mut scheduler = Scheduler::builder()
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
            MockIndicator::new(),
            timers.clone(),
            AlertConfig {
                humidity_threshold_pct: 85.0,
                recipient: bounded("+15550100"),
                cooldown_ticks: 60_000, // one alert per simulated minute
            },
        ))
        .add_handler(LoggerHandler::new(
            storage.clone(),
            log_port,
            timers.clone(),
            router_mail.clone(),
        ))
        .add_handler(ModemHandler::new(
            modem.clone(),
            modem_mail,
            console_port.clone(),
            router_mail,
            timers.clone(),
            bounded("+15550100"),
        ))
        .build();

    console_port.print(PROGRAM_TITLE);
    console_port.print(&format!("v{VERSION}, host simulation"));
    console_port.print("******************");

    for second in 0..RUN_SECONDS {
        // Humidity climbs half a point per second, crossing the 85 %
        // threshold at t = 50 s
        sensor.set_reading(SensorSample {
            temperature_c: 21.5 + (second as f32) * 0.01,
            humidity_pct: 60.0 + (second as f32) * 0.5,
        });

        for _ in 0..PASSES_PER_SECOND {
            scheduler.run_pass();
            for _ in 0..(1000 / PASSES_PER_SECOND) {
                timers.tick();
            }
        }
        clock.advance(1);
    }

    println!("=== console ({} passes) ===", scheduler.passes());
    print!("{}", transport.tx_string());

    println!("=== data.csv ===");
    print!("{}", storage.data_string());

    println!("=== log.txt ===");
    print!("{}", storage.syslog_string());

    println!("=== alerts ===");
    for (recipient, message) in modem.sent() {
        println!("to {recipient}: {}", message.replace('\n', " / "));
    }
}
