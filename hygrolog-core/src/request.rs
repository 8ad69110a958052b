//! Asynchronous Request Protocol Between Handlers
//!
//! ## Overview
//!
//! Handlers never call each other and never share state; the only way one
//! handler influences another is to submit a request into its inbox and move
//! on. Submission is fire-and-forget: it returns immediately, carries the
//! payload by value, and the receiver services it on one of its own future
//! `step` calls.
//!
//! ```text
//!  sampler step:  router_mailbox.submit(Measurement(record))   never blocks
//!                          │
//!                          ▼
//!  router inbox:   [ StatusReport | Measurement | Fault ]      one slot per kind
//!                          │
//!  router step:    take_next() → highest-priority pending kind
//! ```
//!
//! ## Coalescing
//!
//! Each request kind owns one inbox slot. Submitting a kind that is already
//! pending overwrites the stored payload (and counts the overwrite), so at
//! most one instance of each kind is ever queued: these are latest-value
//! requests — a newer measurement supersedes an unserviced older one.
//! Distinct kinds stay independently pending and are drained lowest slot
//! first, one per `step`, so the slot order IS the receiver's fixed
//! priority order.
//!
//! Handlers whose submissions form an event log rather than latest-value
//! telemetry (console lines, CSV records) do not use an inbox; they accept
//! submissions straight into a [`crate::queue::ByteQueue`] where every
//! accepted payload survives.

extern crate alloc;

use alloc::rc::Rc;
use core::array;
use core::cell::RefCell;

/// A request kind understood by some receiving handler
///
/// Implemented by each handler's closed request enum. `slot` maps every
/// variant to its inbox position; lower slots drain first, and a variant's
/// slot doubles as its coalescing key.
pub trait Request {
    /// Number of distinct kinds (inbox slots) for this receiver
    const SLOTS: usize;

    /// This request's slot; must be `< SLOTS`
    fn slot(&self) -> usize;
}

/// Pending-request storage for one handler
///
/// The explicit-array replacement for a pending-request bitmask plus
/// "last payload" fields: slot occupancy is the bitmask, the stored value is
/// the payload, and both are updated together.
pub struct Inbox<R: Request, const N: usize> {
    pending: [Option<R>; N],
    coalesced: u32,
}

impl<R: Request, const N: usize> Inbox<R, N> {
    /// Create an inbox with every slot vacant
    pub fn new() -> Self {
        debug_assert!(N == R::SLOTS);
        Self {
            pending: array::from_fn(|_| None),
            coalesced: 0,
        }
    }

    /// Record `req` as pending, overwriting any unserviced instance of the
    /// same kind
    pub fn submit(&mut self, req: R) {
        let slot = req.slot();
        if self.pending[slot].is_some() {
            self.coalesced = self.coalesced.wrapping_add(1);
        }
        self.pending[slot] = Some(req);
    }

    /// Remove and return the highest-priority pending request
    pub fn take_next(&mut self) -> Option<R> {
        self.pending.iter_mut().find_map(|slot| slot.take())
    }

    /// True if any kind is pending
    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|slot| slot.is_some())
    }

    /// Number of submissions that overwrote an unserviced predecessor
    pub fn coalesced(&self) -> u32 {
        self.coalesced
    }
}

impl<R: Request, const N: usize> Default for Inbox<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared submission handle to a handler's inbox
///
/// Cloned once per producer at construction time; the receiving handler
/// keeps a clone too and drains it from `step`. The loop is single-threaded
/// and submissions never re-enter the borrowing handler, so the interior
/// `RefCell` borrows are always short and never overlap.
pub struct Mailbox<R: Request, const N: usize> {
    inner: Rc<RefCell<Inbox<R, N>>>,
}

impl<R: Request, const N: usize> Mailbox<R, N> {
    /// Create a mailbox around a fresh inbox
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inbox::new())),
        }
    }

    /// Submit `req` to the owning handler; returns immediately
    pub fn submit(&self, req: R) {
        self.inner.borrow_mut().submit(req);
    }

    /// Owner side: remove the highest-priority pending request
    pub fn take_next(&self) -> Option<R> {
        self.inner.borrow_mut().take_next()
    }

    /// True if any kind is pending
    pub fn has_pending(&self) -> bool {
        self.inner.borrow().has_pending()
    }

    /// Coalesced-submission count, for observability
    pub fn coalesced(&self) -> u32 {
        self.inner.borrow().coalesced()
    }
}

impl<R: Request, const N: usize> Clone for Mailbox<R, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: Request, const N: usize> Default for Mailbox<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestRequest {
        Urgent(u8),
        Routine(u8),
    }

    impl Request for TestRequest {
        const SLOTS: usize = 2;

        fn slot(&self) -> usize {
            match self {
                TestRequest::Urgent(_) => 0,
                TestRequest::Routine(_) => 1,
            }
        }
    }

    #[test]
    fn same_kind_coalesces_to_latest_payload() {
        let mut inbox: Inbox<TestRequest, 2> = Inbox::new();
        inbox.submit(TestRequest::Routine(1));
        inbox.submit(TestRequest::Routine(2));

        assert_eq!(inbox.take_next(), Some(TestRequest::Routine(2)));
        assert_eq!(inbox.take_next(), None);
        assert_eq!(inbox.coalesced(), 1);
    }

    #[test]
    fn distinct_kinds_stay_independent() {
        let mut inbox: Inbox<TestRequest, 2> = Inbox::new();
        inbox.submit(TestRequest::Routine(7));
        inbox.submit(TestRequest::Urgent(9));

        // Drained in slot order regardless of submission order
        assert_eq!(inbox.take_next(), Some(TestRequest::Urgent(9)));
        assert_eq!(inbox.take_next(), Some(TestRequest::Routine(7)));
        assert_eq!(inbox.take_next(), None);
        assert_eq!(inbox.coalesced(), 0);
    }

    #[test]
    fn mailbox_clones_share_the_inbox() {
        let owner: Mailbox<TestRequest, 2> = Mailbox::new();
        let producer = owner.clone();

        producer.submit(TestRequest::Urgent(3));
        assert!(owner.has_pending());
        assert_eq!(owner.take_next(), Some(TestRequest::Urgent(3)));
        assert!(!owner.has_pending());
    }
}
