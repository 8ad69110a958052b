//! Fault taxonomy and resource errors
//!
//! ## Design Philosophy
//!
//! Faults travel through the same request protocol as measurements, so they
//! follow the same constraints:
//!
//! 1. **Small and `Copy`**: a fault is a single discriminant that fits in a
//!    request payload and can be stored in an inbox slot without allocation.
//!
//! 2. **Fixed vocabulary**: everything an operator can see on the console or
//!    in the syslog comes from the closed set of short codes below — raw
//!    internal state is never printed.
//!
//! 3. **Never fatal**: a fault is information. The handler that detected it
//!    keeps stepping; escalation means routing a `Fault` request, not
//!    unwinding.
//!
//! ## Categories
//!
//! - Sensor faults mirror the wire-level failures a single-bus
//!   humidity/temperature sensor can produce (busy bus, missing presence
//!   pulse, handshake/data timeouts, bad checksum).
//! - Storage faults cover the removable-card failure modes the logger must
//!   survive (short write, card gone).
//! - Modem faults cover the cellular path (no response in time, rejected
//!   submission).
//! - `QueueOverflow` reports a rejected byte-queue append; the producer
//!   counts it and drops the payload rather than blocking.

use thiserror_no_std::Error;

/// Fault codes raised by handlers and routed for logging/alerting
///
/// Each variant maps to a fixed short code via [`FaultKind::code`]; that code
/// is the only representation that leaves the device.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Sensor bus was held busy by another transaction
    #[error("sensor bus busy")]
    SensorBusBusy,

    /// Sensor did not answer the presence check
    #[error("sensor not present")]
    SensorNotPresent,

    /// Sensor acknowledge pulse exceeded its window
    #[error("sensor ack timeout")]
    SensorAckTimeout,

    /// Sensor never synchronized for data transfer
    #[error("sensor sync timeout")]
    SensorSyncTimeout,

    /// Sensor stopped clocking data mid-transfer
    #[error("sensor data timeout")]
    SensorDataTimeout,

    /// Sensor frame arrived with a bad checksum
    #[error("sensor checksum mismatch")]
    SensorChecksum,

    /// Storage accepted fewer bytes than were handed to it
    #[error("storage short write")]
    StorageWriteMismatch,

    /// Storage medium is missing or refused to open
    #[error("storage unavailable")]
    StorageUnavailable,

    /// Modem produced no response within the armed timeout
    #[error("modem response timeout")]
    ModemTimeout,

    /// Modem answered but refused the submission
    #[error("modem rejected send")]
    ModemRejected,

    /// A byte-queue append was rejected for lack of space
    #[error("byte queue overflow")]
    QueueOverflow,
}

impl FaultKind {
    /// Fixed short code surfaced on the console and in the syslog
    pub const fn code(&self) -> &'static str {
        match self {
            FaultKind::SensorBusBusy => "BUS BUSY",
            FaultKind::SensorNotPresent => "NOT PRESENT",
            FaultKind::SensorAckTimeout => "ACK TIMEOUT",
            FaultKind::SensorSyncTimeout => "SYNC TIMEOUT",
            FaultKind::SensorDataTimeout => "DATA TIMEOUT",
            FaultKind::SensorChecksum => "CHECKSUM",
            FaultKind::StorageWriteMismatch => "SHORT WRITE",
            FaultKind::StorageUnavailable => "SD OFFLINE",
            FaultKind::ModemTimeout => "MODEM TIMEOUT",
            FaultKind::ModemRejected => "MODEM REJECT",
            FaultKind::QueueOverflow => "QUEUE FULL",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FaultKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.code());
    }
}

/// A byte-queue append was rejected because it did not fit
///
/// Appends are all-or-nothing: when this error is returned the queue contents
/// are exactly what they were before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("append of {requested} bytes exceeds free space {free}")]
pub struct CapacityError {
    /// Bytes the caller tried to append
    pub requested: usize,
    /// Free space at the time of the call
    pub free: usize,
}

#[cfg(feature = "defmt")]
impl defmt::Format for CapacityError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "append {} > free {}", self.requested, self.free);
    }
}
