//! Deterministic stand-ins for the excluded peripherals
//!
//! Used by the unit tests, the integration rig and the host simulator. Each
//! mock is a cloneable handle over shared state, so a test can keep one
//! clone for scripting and inspection while the handler owns another.

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::errors::FaultKind;
use crate::measurement::SensorSample;
use crate::traits::{
    IndicatorDriver, LogStream, ModemDriver, SensorDriver, StorageDriver, TransportDriver,
};

struct SensorInner {
    reading: SensorSample,
    fail_remaining: usize,
    fail_kind: FaultKind,
    power_log: Vec<bool>,
}

/// Scripted humidity/temperature sensor
#[derive(Clone)]
pub struct MockSensor {
    inner: Rc<RefCell<SensorInner>>,
}

impl MockSensor {
    /// Create a sensor that answers every sample with `reading`
    pub fn new(reading: SensorSample) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SensorInner {
                reading,
                fail_remaining: 0,
                fail_kind: FaultKind::SensorChecksum,
                power_log: Vec::new(),
            })),
        }
    }

    /// Change the value subsequent samples return
    pub fn set_reading(&self, reading: SensorSample) {
        self.inner.borrow_mut().reading = reading;
    }

    /// Make the next `n` samples fail with `kind`
    pub fn fail_next_samples(&self, n: usize, kind: FaultKind) {
        let mut inner = self.inner.borrow_mut();
        inner.fail_remaining = n;
        inner.fail_kind = kind;
    }

    /// Power transitions observed so far
    pub fn power_log(&self) -> Vec<bool> {
        self.inner.borrow().power_log.clone()
    }
}

impl SensorDriver for MockSensor {
    fn set_power(&mut self, on: bool) {
        self.inner.borrow_mut().power_log.push(on);
    }

    fn sample(&mut self) -> Result<SensorSample, FaultKind> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_remaining > 0 {
            inner.fail_remaining = inner.fail_remaining.saturating_sub(1);
            Err(inner.fail_kind)
        } else {
            Ok(inner.reading)
        }
    }
}

struct StorageInner {
    open_count: usize,
    fail_opens: usize,
    fail_appends: usize,
    data: Vec<u8>,
    syslog: Vec<u8>,
}

/// Capturing storage medium
#[derive(Clone)]
pub struct MockStorage {
    inner: Rc<RefCell<StorageInner>>,
}

impl MockStorage {
    /// Create an empty, healthy medium
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StorageInner {
                open_count: 0,
                fail_opens: 0,
                fail_appends: 0,
                data: Vec::new(),
                syslog: Vec::new(),
            })),
        }
    }

    /// Make the next `n` opens fail
    pub fn fail_next_opens(&self, n: usize) {
        self.inner.borrow_mut().fail_opens = n;
    }

    /// Make the next `n` appends fail
    pub fn fail_next_appends(&self, n: usize) {
        self.inner.borrow_mut().fail_appends = n;
    }

    /// Times the medium was (re)opened
    pub fn open_count(&self) -> usize {
        self.inner.borrow().open_count
    }

    /// Contents of the data stream as text
    pub fn data_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow().data).into_owned()
    }

    /// Contents of the syslog stream as text
    pub fn syslog_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow().syslog).into_owned()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageDriver for MockStorage {
    fn open(&mut self) -> Result<(), FaultKind> {
        let mut inner = self.inner.borrow_mut();
        inner.open_count += 1;
        if inner.fail_opens > 0 {
            inner.fail_opens -= 1;
            Err(FaultKind::StorageUnavailable)
        } else {
            Ok(())
        }
    }

    fn append(&mut self, stream: LogStream, bytes: &[u8]) -> Result<usize, FaultKind> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_appends > 0 {
            inner.fail_appends = inner.fail_appends.saturating_sub(1);
            return Err(FaultKind::StorageWriteMismatch);
        }
        match stream {
            LogStream::Data => inner.data.extend_from_slice(bytes),
            LogStream::Syslog => inner.syslog.extend_from_slice(bytes),
        }
        Ok(bytes.len())
    }
}

struct TransportInner {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    writable: bool,
}

/// Capturing serial transport
#[derive(Clone)]
pub struct MockTransport {
    inner: Rc<RefCell<TransportInner>>,
}

impl MockTransport {
    /// Create an idle transport that accepts all output
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TransportInner {
                rx: VecDeque::new(),
                tx: Vec::new(),
                writable: true,
            })),
        }
    }

    /// Queue an input byte for the handler to read
    pub fn push_rx(&self, byte: u8) {
        self.inner.borrow_mut().rx.push_back(byte);
    }

    /// Toggle whether the transport accepts output
    pub fn set_writable(&self, writable: bool) {
        self.inner.borrow_mut().writable = writable;
    }

    /// Everything written so far
    pub fn tx_bytes(&self) -> Vec<u8> {
        self.inner.borrow().tx.clone()
    }

    /// Everything written so far, as text
    pub fn tx_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow().tx).into_owned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportDriver for MockTransport {
    fn readable(&self) -> bool {
        !self.inner.borrow().rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inner.borrow_mut().rx.pop_front()
    }

    fn writable(&self) -> bool {
        self.inner.borrow().writable
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.inner.borrow_mut().tx.extend_from_slice(bytes);
        bytes.len()
    }
}

struct ModemInner {
    power_log: Vec<bool>,
    in_flight: Option<(String, String)>,
    sent: Vec<(String, String)>,
    poll_delay: u32,
    polls_left: u32,
    fail_starts: usize,
}

/// Scripted cellular modem
#[derive(Clone)]
pub struct MockModem {
    inner: Rc<RefCell<ModemInner>>,
}

impl MockModem {
    /// Create a powered-down modem that completes sends immediately
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ModemInner {
                power_log: Vec::new(),
                in_flight: None,
                sent: Vec::new(),
                poll_delay: 0,
                polls_left: 0,
                fail_starts: 0,
            })),
        }
    }

    /// Number of `poll_send` calls a send stays in flight for
    pub fn set_poll_delay(&self, polls: u32) {
        self.inner.borrow_mut().poll_delay = polls;
    }

    /// Make the next `n` `start_send` calls fail
    pub fn fail_next_starts(&self, n: usize) {
        self.inner.borrow_mut().fail_starts = n;
    }

    /// Completed sends as (recipient, message) pairs
    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.borrow().sent.clone()
    }

    /// Power transitions observed so far
    pub fn power_log(&self) -> Vec<bool> {
        self.inner.borrow().power_log.clone()
    }
}

impl Default for MockModem {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemDriver for MockModem {
    fn set_power(&mut self, on: bool) {
        self.inner.borrow_mut().power_log.push(on);
    }

    fn start_send(&mut self, recipient: &str, message: &str) -> Result<(), FaultKind> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_starts > 0 {
            inner.fail_starts -= 1;
            return Err(FaultKind::ModemRejected);
        }
        inner.in_flight = Some((recipient.into(), message.into()));
        inner.polls_left = inner.poll_delay;
        Ok(())
    }

    fn poll_send(&mut self) -> nb::Result<(), FaultKind> {
        let mut inner = self.inner.borrow_mut();
        if inner.in_flight.is_none() {
            return Err(nb::Error::Other(FaultKind::ModemRejected));
        }
        if inner.polls_left > 0 {
            inner.polls_left = inner.polls_left.saturating_sub(1);
            return Err(nb::Error::WouldBlock);
        }
        if let Some(done) = inner.in_flight.take() {
            inner.sent.push(done);
        }
        Ok(())
    }
}

struct IndicatorInner {
    transitions: Vec<bool>,
}

/// Capturing status indicator
#[derive(Clone)]
pub struct MockIndicator {
    inner: Rc<RefCell<IndicatorInner>>,
}

impl MockIndicator {
    /// Create an indicator with no transitions recorded
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(IndicatorInner {
                transitions: Vec::new(),
            })),
        }
    }

    /// Every `set` call in order
    pub fn transitions(&self) -> Vec<bool> {
        self.inner.borrow().transitions.clone()
    }
}

impl Default for MockIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorDriver for MockIndicator {
    fn set(&mut self, on: bool) {
        self.inner.borrow_mut().transitions.push(on);
    }
}
