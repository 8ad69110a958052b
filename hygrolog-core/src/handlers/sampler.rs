//! Sampling handler: drives the humidity/temperature sensor
//!
//! The sensor is power-cycled on start so it always begins from a known
//! state, then sampled on a fixed cadence. Every delay in the sequence is a
//! timer slot, never a wait:
//!
//! ```text
//! PowerDown ─1s─► PowerUp ─1s─► Sample ─3s─► Sample ─3s─► ...
//!                                  │
//!                                  │ fault × SAMPLE_RETRY_LIMIT
//!                                  ▼
//!                              PowerDown   (restart, counter reset)
//! ```
//!
//! A good read becomes a [`MeasurementRecord`] (dew point derived here) and
//! is routed as a `Measurement` request; a bad read is routed as a `Fault`
//! and retried on the normal cadence. Ten consecutive bad reads power-cycle
//! the sensor and reset the counter.

extern crate alloc;

use alloc::rc::Rc;

use crate::handler::Handler;
use crate::measurement::MeasurementRecord;
use crate::request::Mailbox;
use crate::time::WallClock;
use crate::timer::{TimerService, TimerSlot};
use crate::traits::SensorDriver;

use super::router::{RouterRequest, ROUTER_SLOTS};

/// Time the sensor is held off during a power cycle, in ticks
pub const SENSOR_POWER_OFF: u32 = 1000;

/// Settling time after power-up before the first read, in ticks
pub const SENSOR_SETTLE: u32 = 1000;

/// Spacing between read attempts, in ticks
pub const SAMPLE_PERIOD: u32 = 3000;

/// Consecutive failures before the sensor is power-cycled
pub const SAMPLE_RETRY_LIMIT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SamplerState {
    /// Cut sensor power
    PowerDown,
    /// Let it discharge fully
    PowerDownSettle,
    /// Restore power
    PowerUp,
    /// Let it stabilize before reading
    PowerUpSettle,
    /// One read attempt
    Sample,
    /// Wait out the inter-measurement cadence
    Cadence,
}

/// Sensor sampling handler
pub struct SamplerHandler<D: SensorDriver> {
    sensor: D,
    router: Mailbox<RouterRequest, ROUTER_SLOTS>,
    timers: Rc<TimerService>,
    clock: Rc<dyn WallClock>,
    state: SamplerState,
    retries: u8,
}

impl<D: SensorDriver> SamplerHandler<D> {
    /// Take ownership of the sensor driver
    pub fn new(
        sensor: D,
        router: Mailbox<RouterRequest, ROUTER_SLOTS>,
        timers: Rc<TimerService>,
        clock: Rc<dyn WallClock>,
    ) -> Self {
        Self {
            sensor,
            router,
            timers,
            clock,
            state: SamplerState::PowerDown,
            retries: 0,
        }
    }
}

impl<D: SensorDriver> Handler for SamplerHandler<D> {
    fn step(&mut self) {
        match self.state {
            SamplerState::PowerDown => {
                self.sensor.set_power(false);
                self.timers.set(TimerSlot::SampleCadence, SENSOR_POWER_OFF);
                self.state = SamplerState::PowerDownSettle;
            }
            SamplerState::PowerDownSettle => {
                if self.timers.is_elapsed(TimerSlot::SampleCadence) {
                    self.state = SamplerState::PowerUp;
                }
            }
            SamplerState::PowerUp => {
                self.sensor.set_power(true);
                self.timers.set(TimerSlot::SampleCadence, SENSOR_SETTLE);
                self.state = SamplerState::PowerUpSettle;
            }
            SamplerState::PowerUpSettle => {
                if self.timers.is_elapsed(TimerSlot::SampleCadence) {
                    self.state = SamplerState::Sample;
                }
            }
            SamplerState::Sample => {
                match self.sensor.sample() {
                    Ok(sample) => {
                        self.retries = 0;
                        let record = MeasurementRecord::from_sample(self.clock.now(), sample);
                        self.router.submit(RouterRequest::Measurement(record));
                        self.timers.set(TimerSlot::SampleCadence, SAMPLE_PERIOD);
                        self.state = SamplerState::Cadence;
                    }
                    Err(kind) => {
                        self.retries = self.retries.saturating_add(1);
                        log_warn!("sensor read failed: {}", kind.code());
                        self.router.submit(RouterRequest::Fault(kind));
                        if self.retries >= SAMPLE_RETRY_LIMIT {
                            self.retries = 0;
                            self.state = SamplerState::PowerDown;
                        } else {
                            self.timers.set(TimerSlot::SampleCadence, SAMPLE_PERIOD);
                            self.state = SamplerState::Cadence;
                        }
                    }
                }
            }
            SamplerState::Cadence => {
                if self.timers.is_elapsed(TimerSlot::SampleCadence) {
                    self.state = SamplerState::Sample;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "sampler"
    }
}
