//! Measurement records and the persisted CSV contract
//!
//! A measurement is one successful sensor read: raw temperature and relative
//! humidity, the dew point derived from them, and the wall-clock second it
//! was taken. Records are small `Copy` values routed between handlers by
//! value — no references into anyone else's buffers.
//!
//! The storage layout is a flat append-only CSV, one line per record after a
//! single header line:
//!
//! ```text
//! Timestamp, Temperature (degC), Humidity (pc), Dewpoint
//! 20160101 000003,21.50,48.20,10.34
//! ```
//!
//! The logger owns the file I/O; this module owns the byte-exact shape of
//! header and lines so the contract lives in one place.

use core::fmt::Write;

use heapless::String;

use crate::time::{write_timestamp, Timestamp};

/// Raw sample as delivered by the sensor driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_pct: f32,
}

/// One timestamped measurement, ready for routing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementRecord {
    /// Wall-clock second the sample was taken
    pub timestamp: Timestamp,
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_pct: f32,
    /// Dew point in degrees Celsius, derived from the two readings
    pub dew_point_c: f32,
}

/// Header line written once when the data file is (re)opened
pub const CSV_HEADER: &str = "Timestamp, Temperature (degC), Humidity (pc), Dewpoint\n";

/// Maximum rendered CSV line length
pub const CSV_LINE_MAX: usize = 64;

impl MeasurementRecord {
    /// Build a record from a raw sample, deriving the dew point
    pub fn from_sample(timestamp: Timestamp, sample: SensorSample) -> Self {
        Self {
            timestamp,
            temperature_c: sample.temperature_c,
            humidity_pct: sample.humidity_pct,
            dew_point_c: dew_point(sample.temperature_c, sample.humidity_pct),
        }
    }

    /// Render the record as one CSV line, newline included
    ///
    /// Infallible in practice: the buffer is sized for the fixed timestamp
    /// field plus three two-decimal floats. A value bizarre enough to
    /// overflow it yields a truncated line rather than a panic.
    pub fn csv_line(&self) -> String<CSV_LINE_MAX> {
        let mut line = String::new();
        let _ = write_timestamp(&mut line, self.timestamp);
        let _ = write!(
            line,
            ",{:.2},{:.2},{:.2}\n",
            self.temperature_c, self.humidity_pct, self.dew_point_c
        );
        line
    }
}

/// Dew point from temperature and relative humidity
///
/// Magnus approximation with the constants commonly used for the
/// 0..60 degC range. Humidity is clamped away from zero so the logarithm
/// stays defined for degenerate sensor output.
pub fn dew_point(temperature_c: f32, humidity_pct: f32) -> f32 {
    const A: f32 = 17.62;
    const B: f32 = 243.12;

    let rh = (humidity_pct / 100.0).max(0.001);
    let gamma = libm::logf(rh) + (A * temperature_c) / (B + temperature_c);
    (B * gamma) / (A - gamma)
}
