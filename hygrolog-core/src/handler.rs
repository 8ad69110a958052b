//! The Handler Contract
//!
//! A handler is one responsibility of the firmware (sensing, routing,
//! console I/O, storage logging, modem I/O) wrapped around a private finite
//! state machine. The scheduler knows nothing else about it: it holds a list
//! of `dyn Handler` and calls `step` on each, forever.
//!
//! ## The step rules
//!
//! `step` advances the state machine by at most one bounded unit of work,
//! then returns. Concretely:
//!
//! - **Never block.** No busy-waiting, no sleeping, no unbounded loops over
//!   external data. A handler that must wait arms a [`crate::timer`] slot,
//!   moves to a waiting state and returns; the waiting state re-checks the
//!   slot on later passes.
//! - **Never assume ordering.** A handler may run before or after any other
//!   handler within a pass and must be correct either way; coordination
//!   happens only through requests and timers.
//! - **Never die.** An unrecoverable condition is expressed by arming a
//!   back-off timer and re-entering the handler's start state once it
//!   elapses. The scheduler has no failure notion and never removes or
//!   restarts anything.
//!
//! Inbound work arrives between steps through the handler's submission
//! surface — a coalescing [`crate::request::Mailbox`] or a byte-queue port —
//! which copies the payload and returns immediately.

/// One cooperative state machine driven by the scheduler
pub trait Handler {
    /// Advance the state machine by at most one bounded unit of work
    fn step(&mut self);

    /// Handler name for diagnostics
    fn name(&self) -> &'static str;
}
