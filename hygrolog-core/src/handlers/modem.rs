//! Modem handler: relays alerts over the cellular network
//!
//! The modem is the slowest peripheral in the system — power-up takes
//! seconds and a send can take many more — so everything here is expressed
//! as timer-gated states. The AT dialect itself lives behind
//! [`crate::traits::ModemDriver`]; this handler owns power sequencing, the
//! response timeout, bounded retries and fault escalation.
//!
//! Requests coalesce: a newer alert overwrites an unserviced older one.
//! Alerts carry the latest readings anyway, so sending the stale one would
//! be strictly worse.

extern crate alloc;

use alloc::rc::Rc;

use heapless::String;

use crate::errors::FaultKind;
use crate::handler::Handler;
use crate::request::{Mailbox, Request};
use crate::timer::{TimerService, TimerSlot};
use crate::traits::ModemDriver;

use super::console::ConsolePort;
use super::router::{RouterRequest, ROUTER_SLOTS};

/// Maximum recipient identifier length
pub const RECIPIENT_MAX: usize = 20;

/// Maximum alert body length
pub const ALERT_TEXT_MAX: usize = 160;

/// Settling time after dropping modem power, in ticks
pub const MODEM_POWER_OFF_SETTLE: u32 = 2000;

/// Settling time after applying modem power, in ticks
pub const MODEM_POWER_ON_SETTLE: u32 = 3000;

/// How long to wait for an in-flight send before calling it timed out
pub const MODEM_RESPONSE_TIMEOUT: u32 = 10_000;

/// Delay between send attempts
pub const MODEM_RETRY_BACKOFF: u32 = 5000;

/// Send attempts before the alert is abandoned and a fault escalated
pub const MODEM_SEND_ATTEMPTS: u8 = 3;

/// Number of request kinds the modem accepts
pub const MODEM_SLOTS: usize = 2;

/// An alert destination (phone number or equivalent)
pub type Recipient = String<RECIPIENT_MAX>;

/// An alert body
pub type AlertText = String<ALERT_TEXT_MAX>;

/// A message-and-recipient pair to deliver
#[derive(Debug, Clone)]
pub struct AlertMessage {
    /// Alert body
    pub text: AlertText,
    /// Destination; empty means "use the configured default recipient"
    pub recipient: Recipient,
}

/// Requests understood by the modem handler
#[derive(Debug, Clone)]
pub enum ModemRequest {
    /// Deliver an alert
    SendAlert(AlertMessage),
    /// Replace the default recipient used when an alert names none
    SetRecipient(Recipient),
}

impl Request for ModemRequest {
    const SLOTS: usize = MODEM_SLOTS;

    fn slot(&self) -> usize {
        match self {
            ModemRequest::SendAlert(_) => 0,
            ModemRequest::SetRecipient(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModemState {
    /// Drop power so the module starts from a known state
    PowerOff,
    PowerOffSettle,
    PowerOn,
    PowerOnSettle,
    /// Powered and waiting for requests
    Idle,
    /// A send is in flight; poll it and watch the timeout
    Sending,
    /// Waiting out the delay before the next attempt
    Backoff,
}

/// Cellular alert handler
pub struct ModemHandler<M: ModemDriver> {
    modem: M,
    inbox: Mailbox<ModemRequest, MODEM_SLOTS>,
    console: ConsolePort,
    router: Mailbox<RouterRequest, ROUTER_SLOTS>,
    timers: Rc<TimerService>,
    state: ModemState,
    attempts: u8,
    default_recipient: Recipient,
    in_flight: Option<AlertMessage>,
}

impl<M: ModemDriver> ModemHandler<M> {
    /// Take ownership of the modem driver; alerts with no recipient go to
    /// `default_recipient`
    pub fn new(
        modem: M,
        inbox: Mailbox<ModemRequest, MODEM_SLOTS>,
        console: ConsolePort,
        router: Mailbox<RouterRequest, ROUTER_SLOTS>,
        timers: Rc<TimerService>,
        default_recipient: Recipient,
    ) -> Self {
        Self {
            modem,
            inbox,
            console,
            router,
            timers,
            state: ModemState::PowerOff,
            attempts: 0,
            default_recipient,
            in_flight: None,
        }
    }

    fn begin_send(&mut self, alert: AlertMessage) {
        match self.modem.start_send(&alert.recipient, &alert.text) {
            Ok(()) => {
                self.timers.set(TimerSlot::ModemResponse, MODEM_RESPONSE_TIMEOUT);
                self.in_flight = Some(alert);
                self.state = ModemState::Sending;
            }
            Err(kind) => self.retry_or_escalate(kind, alert),
        }
    }

    fn retry_or_escalate(&mut self, kind: FaultKind, alert: AlertMessage) {
        log_warn!("modem send failed: {}", kind.code());
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= MODEM_SEND_ATTEMPTS {
            self.attempts = 0;
            self.in_flight = None;
            self.router.submit(RouterRequest::Fault(kind));
            self.state = ModemState::Idle;
        } else {
            self.in_flight = Some(alert);
            self.timers.set(TimerSlot::ModemResponse, MODEM_RETRY_BACKOFF);
            self.state = ModemState::Backoff;
        }
    }
}

impl<M: ModemDriver> Handler for ModemHandler<M> {
    fn step(&mut self) {
        match self.state {
            ModemState::PowerOff => {
                self.modem.set_power(false);
                self.timers.set(TimerSlot::ModemPower, MODEM_POWER_OFF_SETTLE);
                self.state = ModemState::PowerOffSettle;
            }
            ModemState::PowerOffSettle => {
                if self.timers.is_elapsed(TimerSlot::ModemPower) {
                    self.state = ModemState::PowerOn;
                }
            }
            ModemState::PowerOn => {
                self.modem.set_power(true);
                self.timers.set(TimerSlot::ModemPower, MODEM_POWER_ON_SETTLE);
                self.state = ModemState::PowerOnSettle;
            }
            ModemState::PowerOnSettle => {
                if self.timers.is_elapsed(TimerSlot::ModemPower) {
                    self.state = ModemState::Idle;
                }
            }
            ModemState::Idle => match self.inbox.take_next() {
                Some(ModemRequest::SendAlert(mut alert)) => {
                    if alert.recipient.is_empty() {
                        alert.recipient = self.default_recipient.clone();
                    }
                    self.begin_send(alert);
                }
                Some(ModemRequest::SetRecipient(recipient)) => {
                    self.default_recipient = recipient;
                }
                None => {}
            },
            ModemState::Sending => match self.modem.poll_send() {
                Ok(()) => {
                    self.attempts = 0;
                    self.in_flight = None;
                    self.console.print_timestamped("ALERT SENT");
                    self.state = ModemState::Idle;
                }
                Err(nb::Error::WouldBlock) => {
                    if self.timers.is_elapsed(TimerSlot::ModemResponse) {
                        match self.in_flight.take() {
                            Some(alert) => self.retry_or_escalate(FaultKind::ModemTimeout, alert),
                            None => self.state = ModemState::Idle,
                        }
                    }
                }
                Err(nb::Error::Other(kind)) => match self.in_flight.take() {
                    Some(alert) => self.retry_or_escalate(kind, alert),
                    None => self.state = ModemState::Idle,
                },
            },
            ModemState::Backoff => {
                if self.timers.is_elapsed(TimerSlot::ModemResponse) {
                    match self.in_flight.take() {
                        Some(alert) => self.begin_send(alert),
                        None => self.state = ModemState::Idle,
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "modem"
    }
}
