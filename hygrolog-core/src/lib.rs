//! Cooperative scheduling and messaging core for HygroLog
//!
//! HygroLog is battery-powered environmental monitor firmware: it samples a
//! humidity/temperature sensor, logs readings to removable storage, mirrors
//! activity to a serial console and can relay alerts over a cellular modem.
//! There is no RTOS — every responsibility is a handler (an explicit finite
//! state machine) advanced one bounded step at a time by a round-robin
//! scheduler, and handlers coordinate only through asynchronous requests,
//! countdown timers and circular byte queues.
//!
//! Key constraints:
//! - No blocking anywhere inside a scheduler pass
//! - Bounded memory: fixed queues, fixed inboxes, fixed timer registry
//! - Peripherals live behind narrow driver traits and are injected at
//!   construction; the core never touches hardware
//!
//! ```no_run
//! use std::rc::Rc;
//! use hygrolog_core::{Scheduler, TimerService, FixedClock, AlertConfig, Mailbox};
//! use hygrolog_core::handlers::{
//!     ConsoleHandler, ConsolePort, LogPort, LoggerHandler, RouterHandler, SamplerHandler,
//! };
//! use hygrolog_core::mock::{MockIndicator, MockSensor, MockStorage, MockTransport};
//! # use hygrolog_core::SensorSample;
//!
//! let timers = Rc::new(TimerService::new());
//! let clock = Rc::new(FixedClock::new(0));
//! let router_mail = Mailbox::new();
//! let console_port = ConsolePort::new(clock.clone());
//! let log_port = LogPort::new(clock.clone());
//!
//! let sensor = MockSensor::new(SensorSample { temperature_c: 21.0, humidity_pct: 50.0 });
//! let mut scheduler = Scheduler::builder()
//!     .add_handler(SamplerHandler::new(sensor, router_mail.clone(), timers.clone(), clock.clone()))
//!     .add_handler(ConsoleHandler::new(MockTransport::new(), console_port.clone()))
//!     .add_handler(RouterHandler::new(
//!         router_mail.clone(), console_port, log_port.clone(), None,
//!         MockIndicator::new(), timers.clone(), AlertConfig::default(),
//!     ))
//!     .add_handler(LoggerHandler::new(MockStorage::new(), log_port, timers.clone(), router_mail))
//!     .build();
//!
//! loop {
//!     scheduler.run_pass();
//!     timers.tick(); // stands in for the periodic tick interrupt
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod handler;
pub mod handlers;
pub mod measurement;
pub mod mock;
pub mod queue;
pub mod request;
pub mod scheduler;
pub mod text;
pub mod time;
pub mod timer;
pub mod traits;

// Public API
pub use errors::{CapacityError, FaultKind};
pub use handler::Handler;
pub use handlers::{AlertConfig, RouterRequest};
pub use measurement::{dew_point, MeasurementRecord, SensorSample, CSV_HEADER};
pub use queue::ByteQueue;
pub use request::{Inbox, Mailbox, Request};
pub use scheduler::{Scheduler, SchedulerBuilder, MAX_HANDLERS};
pub use time::{FixedClock, Timestamp, WallClock};
#[cfg(feature = "std")]
pub use time::SystemClock;
pub use timer::{TimerService, TimerSlot, TICK_PERIOD_MS};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
