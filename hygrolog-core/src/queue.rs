//! Fixed-Capacity Circular Byte Queue
//!
//! ## Overview
//!
//! `ByteQueue` is the rate-matching device of the firmware: a producer that
//! bursts (three console lines per measurement, a whole CSV record at once)
//! feeds a consumer that drains a bounded chunk per scheduler pass (64 bytes
//! to the serial transport, one storage write). Neither side ever blocks;
//! the queue either takes the whole payload or none of it.
//!
//! ```text
//! ByteQueue<8> after enqueue(b"abcd"), enqueue(b"ef"):
//! ┌───┬───┬───┬───┬───┬───┬───┬───┐
//! │ a │ b │ c │ d │ e │ f │   │   │
//! └───┴───┴───┴───┴───┴───┴───┴───┘
//!   ↑                       ↑
//!  head (next read)        tail (next write)      len = 6
//! ```
//!
//! ## Contract
//!
//! - `enqueue` appends the whole slice or rejects it (`CapacityError`) and
//!   leaves the contents untouched. Partial writes never happen, so a
//!   consumer can assume line boundaries survive.
//! - `drain` copies out up to the caller's buffer length, FIFO order.
//! - The queue never reports a drop anywhere; detecting and accounting for
//!   a rejected append is the producer's job.
//!
//! ## Full versus empty
//!
//! Head and tail indices alone cannot distinguish a full queue from an empty
//! one — both look like `head == tail`. The stored-byte count is therefore
//! tracked explicitly in `len`, and all capacity checks go through it;
//! index equality is never used as a state signal.

use crate::errors::CapacityError;

/// Circular FIFO queue of raw bytes with capacity fixed at compile time
///
/// ## Invariants
///
/// - `len <= N` at all times; at most `N` bytes are resident.
/// - `head < N` and `tail < N` (indices wrap, modulo `N`).
/// - Drained bytes come out in exactly the order their appends were
///   accepted.
pub struct ByteQueue<const N: usize> {
    buf: [u8; N],
    /// Next read position
    head: usize,
    /// Next write position
    tail: usize,
    /// Bytes currently stored; the full/empty disambiguator
    len: usize,
}

impl<const N: usize> ByteQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Total capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes currently stored
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space in bytes
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Append `bytes` if and only if all of them fit
    ///
    /// On rejection the queue is untouched and the caller decides what the
    /// drop means (count it, raise a fault, or both).
    pub fn enqueue(&mut self, bytes: &[u8]) -> Result<(), CapacityError> {
        if bytes.len() > self.free() {
            return Err(CapacityError {
                requested: bytes.len(),
                free: self.free(),
            });
        }

        for &b in bytes {
            self.buf[self.tail] = b;
            self.tail = (self.tail + 1) % N;
        }
        self.len += bytes.len();
        Ok(())
    }

    /// Copy out up to `out.len()` stored bytes, oldest first
    ///
    /// Returns the number of bytes copied, which is bounded by both the
    /// caller's buffer and the stored count. The read position advances past
    /// exactly the returned bytes.
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);

        for slot in out.iter_mut().take(count) {
            *slot = self.buf[self.head];
            self.head = (self.head + 1) % N;
        }
        self.len -= count;
        count
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let q: ByteQueue<8> = ByteQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert_eq!(q.free(), 8);
        assert_eq!(q.capacity(), 8);
    }

    #[test]
    fn fifo_across_two_appends() {
        let mut q: ByteQueue<8> = ByteQueue::new();
        q.enqueue(b"abcd").unwrap();
        q.enqueue(b"ef").unwrap();

        let mut out = [0u8; 10];
        let n = q.drain(&mut out);
        assert_eq!(n, 6);
        assert_eq!(&out[..n], b"abcdef");
        assert!(q.is_empty());
    }

    #[test]
    fn oversize_append_is_rejected_whole() {
        let mut q: ByteQueue<4> = ByteQueue::new();
        let err = q.enqueue(b"abcde").unwrap_err();
        assert_eq!(err.requested, 5);
        assert_eq!(err.free, 4);

        // Rejection left nothing behind
        let mut out = [0u8; 8];
        assert_eq!(q.drain(&mut out), 0);
    }

    #[test]
    fn rejection_preserves_prior_contents() {
        let mut q: ByteQueue<4> = ByteQueue::new();
        q.enqueue(b"ab").unwrap();
        assert!(q.enqueue(b"cde").is_err());

        let mut out = [0u8; 4];
        let n = q.drain(&mut out);
        assert_eq!(&out[..n], b"ab");
    }

    #[test]
    fn fill_to_exact_capacity_is_not_empty() {
        // The failure mode the explicit len exists to prevent: an
        // exact-capacity fill wraps tail onto head
        let mut q: ByteQueue<4> = ByteQueue::new();
        q.enqueue(b"wxyz").unwrap();
        assert!(!q.is_empty());
        assert_eq!(q.len(), 4);
        assert_eq!(q.free(), 0);
        assert!(q.enqueue(b"!").is_err());

        let mut out = [0u8; 4];
        assert_eq!(q.drain(&mut out), 4);
        assert_eq!(&out, b"wxyz");
    }

    #[test]
    fn wraparound_preserves_order() {
        let mut q: ByteQueue<4> = ByteQueue::new();
        q.enqueue(b"abc").unwrap();

        let mut out = [0u8; 2];
        assert_eq!(q.drain(&mut out), 2);

        // head is now mid-buffer; this append wraps
        q.enqueue(b"def").unwrap();

        let mut all = [0u8; 8];
        let n = q.drain(&mut all);
        assert_eq!(&all[..n], b"cdef");
    }

    #[test]
    fn drain_respects_caller_buffer() {
        let mut q: ByteQueue<8> = ByteQueue::new();
        q.enqueue(b"abcdef").unwrap();

        let mut small = [0u8; 4];
        assert_eq!(q.drain(&mut small), 4);
        assert_eq!(&small, b"abcd");
        assert_eq!(q.len(), 2);
    }
}
