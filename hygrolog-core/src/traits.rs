//! Driver seams for the excluded peripherals
//!
//! The core never talks to hardware. Each physical device — sensor, storage
//! card, serial transport, cellular modem, status LED, RTC — sits behind
//! exactly one narrow trait, owned by exactly one handler and injected at
//! construction. Swapping a peripheral means swapping the trait impl; the
//! scheduling and messaging core is unchanged. (The RTC seam is
//! [`crate::time::WallClock`].)
//!
//! Every method here must be non-blocking: a driver that needs time reports
//! "not yet" (`None`, `nb::Error::WouldBlock`, a zero count) and the calling
//! handler waits through its state machine, never inside the driver call.

use crate::errors::FaultKind;
use crate::measurement::SensorSample;

/// Humidity/temperature sensor
///
/// The wire protocol (single-bus handshake, bit timing, checksums) is the
/// driver's problem; the sampling handler sees one bounded read attempt that
/// either yields a sample or names the fault.
pub trait SensorDriver {
    /// Drive the sensor's power rail
    fn set_power(&mut self, on: bool);

    /// One bounded read attempt
    fn sample(&mut self) -> Result<SensorSample, FaultKind>;
}

/// Destination streams on the storage medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    /// The measurement CSV file
    Data,
    /// The system event log
    Syslog,
}

/// Removable storage behind the logging handler
pub trait StorageDriver {
    /// Mount the medium and open both streams for appending
    fn open(&mut self) -> Result<(), FaultKind>;

    /// Append `bytes` to `stream`, returning the count actually written
    ///
    /// A short count is not an error at this level; the logger detects the
    /// mismatch and drives its own back-off.
    fn append(&mut self, stream: LogStream, bytes: &[u8]) -> Result<usize, FaultKind>;
}

/// Raw character transport for the console (serial/USB)
pub trait TransportDriver {
    /// True when at least one input byte is waiting
    fn readable(&self) -> bool;

    /// Take one input byte if available
    fn read_byte(&mut self) -> Option<u8>;

    /// True when the transport can accept output now
    fn writable(&self) -> bool;

    /// Write up to `bytes.len()` bytes, returning the accepted count
    fn write(&mut self, bytes: &[u8]) -> usize;
}

/// Cellular modem behind the alerting handler
///
/// The AT dialect, handshake sequence and delivery protocol all live behind
/// this trait. The core only starts a send and polls it to completion.
pub trait ModemDriver {
    /// Drive the modem's power rail / power key
    fn set_power(&mut self, on: bool);

    /// Begin transmitting `message` to `recipient`; returns immediately
    fn start_send(&mut self, recipient: &str, message: &str) -> Result<(), FaultKind>;

    /// Poll an in-flight send: `WouldBlock` until it resolves
    fn poll_send(&mut self) -> nb::Result<(), FaultKind>;
}

/// Status indicator (heartbeat LED)
pub trait IndicatorDriver {
    fn set(&mut self, on: bool);
}
