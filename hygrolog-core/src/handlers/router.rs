//! Routing handler: the link between data generation and data output
//!
//! The sampler knows nothing about storage, consoles or modems; it hands
//! every result and fault to this handler, which fans them out:
//!
//! ```text
//!             ┌──────────► console  (three mirror lines / fault code)
//! sampler ──► │ router
//!  modem  ──► │  inbox ──► logger   (CSV record / syslog line)
//! logger  ──► │
//!             └──────────► modem    (threshold alert, status report)
//! ```
//!
//! The inbox drains in fixed priority order — status report, then
//! measurement, then fault — one request per step. When idle the handler
//! keeps the heartbeat indicator breathing (1 s on, 2 s off) so an operator
//! can tell the loop is alive without a console attached.
//!
//! Alerting is gated twice: the humidity threshold must be crossed and the
//! cooldown timer must have elapsed, so a sensor hovering at the threshold
//! cannot flood the cellular path.

extern crate alloc;

use alloc::rc::Rc;
use core::fmt::Write as _;

use heapless::String;

use crate::errors::FaultKind;
use crate::handler::Handler;
use crate::measurement::MeasurementRecord;
use crate::request::{Mailbox, Request};
use crate::timer::{TimerService, TimerSlot};
use crate::traits::IndicatorDriver;

use super::console::{ConsolePort, CONSOLE_LINE_MAX};
use super::logger::LogPort;
use super::modem::{AlertMessage, AlertText, ModemRequest, Recipient, MODEM_SLOTS};

/// Number of request kinds the router accepts
pub const ROUTER_SLOTS: usize = 3;

/// Heartbeat on-phase duration, in ticks
pub const HEARTBEAT_ON: u32 = 1000;

/// Heartbeat off-phase duration, in ticks
pub const HEARTBEAT_OFF: u32 = 2000;

/// Requests understood by the router
#[derive(Debug, Clone)]
pub enum RouterRequest {
    /// Send the latest readings to `recipient` (highest priority)
    StatusReport(Recipient),
    /// A new measurement is available
    Measurement(MeasurementRecord),
    /// A fault was detected somewhere in the system
    Fault(FaultKind),
}

impl Request for RouterRequest {
    const SLOTS: usize = ROUTER_SLOTS;

    fn slot(&self) -> usize {
        match self {
            RouterRequest::StatusReport(_) => 0,
            RouterRequest::Measurement(_) => 1,
            RouterRequest::Fault(_) => 2,
        }
    }
}

/// Alerting policy, fixed at construction
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Relative humidity at or above which an alert fires
    pub humidity_threshold_pct: f32,
    /// Default alert destination
    pub recipient: Recipient,
    /// Minimum spacing between alerts, in timer ticks
    pub cooldown_ticks: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            humidity_threshold_pct: 85.0,
            recipient: Recipient::new(),
            cooldown_ticks: 600_000, // ten minutes
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterState {
    /// Service the highest-priority pending request
    CheckRequests,
    /// Advance the heartbeat indicator
    Heartbeat,
}

/// Aggregation and routing handler
pub struct RouterHandler<I: IndicatorDriver> {
    inbox: Mailbox<RouterRequest, ROUTER_SLOTS>,
    console: ConsolePort,
    log: LogPort,
    modem: Option<Mailbox<ModemRequest, MODEM_SLOTS>>,
    indicator: I,
    timers: Rc<TimerService>,
    config: AlertConfig,
    state: RouterState,
    indicator_on: bool,
    last_measurement: Option<MeasurementRecord>,
    faults_seen: u32,
}

impl<I: IndicatorDriver> RouterHandler<I> {
    /// Wire the router to its outputs; `modem` is `None` on builds without
    /// a cellular module
    pub fn new(
        inbox: Mailbox<RouterRequest, ROUTER_SLOTS>,
        console: ConsolePort,
        log: LogPort,
        modem: Option<Mailbox<ModemRequest, MODEM_SLOTS>>,
        indicator: I,
        timers: Rc<TimerService>,
        config: AlertConfig,
    ) -> Self {
        Self {
            inbox,
            console,
            log,
            modem,
            indicator,
            timers,
            config,
            state: RouterState::CheckRequests,
            indicator_on: false,
            last_measurement: None,
            faults_seen: 0,
        }
    }

    /// Faults routed since start-up
    pub fn faults_seen(&self) -> u32 {
        self.faults_seen
    }

    /// Render the status/alert body from the latest readings
    fn status_text(&self) -> AlertText {
        let mut text = AlertText::new();
        match &self.last_measurement {
            Some(m) => {
                let _ = write!(
                    text,
                    "Temperature is {:.2} degC\nHumidity is {:.2} pc\nDew point is {:.2}",
                    m.temperature_c, m.humidity_pct, m.dew_point_c
                );
            }
            None => {
                let _ = text.push_str("No measurement yet");
            }
        }
        text
    }

    fn post_measurement(&mut self, record: MeasurementRecord) {
        self.last_measurement = Some(record);

        // Mirror to the terminal, one line per field
        let mut line: String<CONSOLE_LINE_MAX> = String::new();
        let _ = write!(line, "Temperature is {:.2} degC", record.temperature_c);
        self.console.print_timestamped(&line);

        line.clear();
        let _ = write!(line, "Humidity is {:.2} pc", record.humidity_pct);
        self.console.print_timestamped(&line);

        line.clear();
        let _ = write!(line, "Dew point is {:.2}", record.dew_point_c);
        self.console.print_timestamped(&line);

        self.log.append_record(record);

        // Alert gate: threshold and cooldown must both agree
        if let Some(modem) = &self.modem {
            if record.humidity_pct >= self.config.humidity_threshold_pct
                && self.timers.is_elapsed(TimerSlot::AlertCooldown)
            {
                modem.submit(ModemRequest::SendAlert(AlertMessage {
                    text: self.status_text(),
                    recipient: self.config.recipient.clone(),
                }));
                self.timers.set(TimerSlot::AlertCooldown, self.config.cooldown_ticks);
            }
        }
    }

    fn post_fault(&mut self, kind: FaultKind) {
        self.faults_seen = self.faults_seen.wrapping_add(1);
        self.console.print_timestamped(kind.code());
        self.log.append_syslog(kind.code());
    }

    fn post_status(&mut self, recipient: Recipient) {
        let text = self.status_text();
        match &self.modem {
            Some(modem) => {
                modem.submit(ModemRequest::SendAlert(AlertMessage { text, recipient }));
            }
            // No modem fitted: answer on the console instead
            None => self.console.print_timestamped(&text),
        }
    }
}

impl<I: IndicatorDriver> Handler for RouterHandler<I> {
    fn step(&mut self) {
        match self.state {
            RouterState::CheckRequests => match self.inbox.take_next() {
                Some(RouterRequest::StatusReport(recipient)) => self.post_status(recipient),
                Some(RouterRequest::Measurement(record)) => self.post_measurement(record),
                Some(RouterRequest::Fault(kind)) => self.post_fault(kind),
                None => self.state = RouterState::Heartbeat,
            },
            RouterState::Heartbeat => {
                if self.timers.is_elapsed(TimerSlot::Heartbeat) {
                    self.indicator_on = !self.indicator_on;
                    self.indicator.set(self.indicator_on);
                    let phase = if self.indicator_on { HEARTBEAT_ON } else { HEARTBEAT_OFF };
                    self.timers.set(TimerSlot::Heartbeat, phase);
                }
                self.state = RouterState::CheckRequests;
            }
        }
    }

    fn name(&self) -> &'static str {
        "router"
    }
}
