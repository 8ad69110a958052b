//! Countdown Timer Service for Non-Blocking Delays
//!
//! ## Overview
//!
//! Every handler in the loop expresses waiting the same way: arm a named
//! countdown slot, move to a waiting state, and return. A periodic tick —
//! a hardware timer interrupt on a real target, the harness clock in tests
//! and the simulator — decrements every armed slot once per period. A
//! waiting state observes `get(slot) == 0` on a later pass and moves on.
//!
//! ```text
//! step():  set(SampleCadence, 3000) ──┐
//!                                     │   tick() × 3000 (ISR context)
//! step():  get(SampleCadence) > 0  ◄──┤      each: slot -= 1, floor 0
//! step():  get(SampleCadence) == 0 ◄──┘
//! ```
//!
//! ## Why countdown, not deadlines?
//!
//! A deadline scheme needs a monotonic "now" plus wrap-safe comparisons in
//! every waiting state. A countdown is one unsigned word per slot, one
//! saturating decrement per tick, and a zero test — nothing can overflow and
//! the tick handler stays O(slot count) with a small constant.
//!
//! ## Concurrency
//!
//! `tick` runs from interrupt context while `set`/`get` run from the
//! cooperative loop. Each slot is an `AtomicU32` and every mutation is a
//! single-word atomic update, so any interleaving observes an in-range
//! value: a decrement landing between a caller's `set` and `get` can only
//! make the value one smaller, never wrap it.
//!
//! There is no cancel primitive. Re-arming a slot overwrites the previous
//! value, which silently supersedes any wait in progress on it — each slot
//! has exactly one owning handler, so this is the intended coalescing of
//! "restart the delay".

use core::sync::atomic::{AtomicU32, Ordering};

/// Nominal tick period the service is driven at
pub const TICK_PERIOD_MS: u32 = 1;

/// Named countdown slots, one per waiting concern in the firmware
///
/// The set is fixed at compile time; a slot belongs to exactly one handler
/// (`AlertCooldown` to the router's alert gate, and so on). A fixed registry
/// keeps the tick handler constant-time and allocation-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum TimerSlot {
    /// Sampler power-cycle settling and inter-measurement cadence
    SampleCadence = 0,
    /// Modem power sequencing delays
    ModemPower = 1,
    /// Modem response timeout while a send is in flight
    ModemResponse = 2,
    /// Logger back-off after a storage fault
    StorageRetry = 3,
    /// Router heartbeat indicator phase
    Heartbeat = 4,
    /// Minimum spacing between outbound alerts
    AlertCooldown = 5,
}

impl TimerSlot {
    /// Number of slots in the registry
    pub const COUNT: usize = 6;

    /// Slot name for diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            TimerSlot::SampleCadence => "sample-cadence",
            TimerSlot::ModemPower => "modem-power",
            TimerSlot::ModemResponse => "modem-response",
            TimerSlot::StorageRetry => "storage-retry",
            TimerSlot::Heartbeat => "heartbeat",
            TimerSlot::AlertCooldown => "alert-cooldown",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerSlot {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name());
    }
}

/// Fixed registry of countdown timers
///
/// `new` is const so the service can live in a `static` on hardware and be
/// referenced directly from the tick ISR; host code shares it by `Rc`.
pub struct TimerService {
    slots: [AtomicU32; TimerSlot::COUNT],
}

impl TimerService {
    /// Create the registry with every slot un-armed (zero)
    pub const fn new() -> Self {
        const UNARMED: AtomicU32 = AtomicU32::new(0);
        Self {
            slots: [UNARMED; TimerSlot::COUNT],
        }
    }

    /// Arm `slot` to `ticks`, overwriting any previous value
    ///
    /// Always succeeds; arming to zero disarms.
    pub fn set(&self, slot: TimerSlot, ticks: u32) {
        self.slots[slot as usize].store(ticks, Ordering::Release);
    }

    /// Current value of `slot` without side effects
    ///
    /// Zero means "never armed" or "elapsed" — callers distinguish the two
    /// through their own state machines, not by querying history.
    pub fn get(&self, slot: TimerSlot) -> u32 {
        self.slots[slot as usize].load(Ordering::Acquire)
    }

    /// True once `slot` has counted down to zero (or was never armed)
    pub fn is_elapsed(&self, slot: TimerSlot) -> bool {
        self.get(slot) == 0
    }

    /// Decrement every armed slot by one, floored at zero
    ///
    /// Invoked once per [`TICK_PERIOD_MS`] from the tick source. Safe to
    /// interleave with `set`/`get` from cooperative code.
    pub fn tick(&self) {
        for slot in &self.slots {
            // checked_sub returns None at zero, which leaves the slot unstored
            let _ = slot.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1));
        }
    }
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_start_unarmed() {
        let timers = TimerService::new();
        assert!(timers.is_elapsed(TimerSlot::SampleCadence));
        assert_eq!(timers.get(TimerSlot::Heartbeat), 0);
    }

    #[test]
    fn three_ticks_elapse_a_three_tick_timer() {
        let timers = TimerService::new();
        timers.set(TimerSlot::SampleCadence, 3);

        timers.tick();
        assert_eq!(timers.get(TimerSlot::SampleCadence), 2);
        timers.tick();
        timers.tick();
        assert_eq!(timers.get(TimerSlot::SampleCadence), 0);
        assert!(timers.is_elapsed(TimerSlot::SampleCadence));
    }

    #[test]
    fn tick_floors_at_zero() {
        let timers = TimerService::new();
        timers.set(TimerSlot::StorageRetry, 1);

        for _ in 0..10 {
            timers.tick();
        }
        assert_eq!(timers.get(TimerSlot::StorageRetry), 0);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let timers = TimerService::new();
        timers.set(TimerSlot::ModemPower, 100);
        timers.tick();
        timers.set(TimerSlot::ModemPower, 5);
        assert_eq!(timers.get(TimerSlot::ModemPower), 5);
    }

    #[test]
    fn slots_decrement_independently() {
        let timers = TimerService::new();
        timers.set(TimerSlot::SampleCadence, 2);
        timers.set(TimerSlot::Heartbeat, 4);

        timers.tick();
        timers.tick();

        assert!(timers.is_elapsed(TimerSlot::SampleCadence));
        assert_eq!(timers.get(TimerSlot::Heartbeat), 2);
    }
}
