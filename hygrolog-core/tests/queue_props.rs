//! Property tests for the queue and timer laws
//!
//! The two shared utilities carry the loop's correctness guarantees, so
//! their contracts get randomized coverage on top of the unit scenarios.

use proptest::prelude::*;

use hygrolog_core::{ByteQueue, TimerService, TimerSlot};

proptest! {
    /// Draining everything reproduces the concatenation of all accepted
    /// appends, in order (FIFO law)
    #[test]
    fn drained_bytes_equal_accepted_appends(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..10)
    ) {
        let mut queue: ByteQueue<64> = ByteQueue::new();
        let mut accepted: Vec<u8> = Vec::new();

        for chunk in &chunks {
            if queue.enqueue(chunk).is_ok() {
                accepted.extend_from_slice(chunk);
            }
        }

        let mut out = vec![0u8; 64];
        let n = queue.drain(&mut out);
        prop_assert_eq!(&out[..n], accepted.as_slice());
        prop_assert!(queue.is_empty());
    }

    /// A rejected append leaves the stored bytes exactly as they were
    #[test]
    fn rejection_is_atomic(
        keep in prop::collection::vec(any::<u8>(), 0..16),
        extra in prop::collection::vec(any::<u8>(), 17..64),
    ) {
        let mut queue: ByteQueue<16> = ByteQueue::new();
        queue.enqueue(&keep).unwrap();

        // Can never fit: keep + extra > capacity
        prop_assert!(queue.enqueue(&extra).is_err());
        prop_assert_eq!(queue.len(), keep.len());

        let mut out = [0u8; 16];
        let n = queue.drain(&mut out);
        prop_assert_eq!(&out[..n], keep.as_slice());
    }

    /// Interleaved drains preserve FIFO order across wraparound
    #[test]
    fn interleaved_drains_stay_fifo(
        ops in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..12), 0usize..12), 1..30)
    ) {
        let mut queue: ByteQueue<32> = ByteQueue::new();
        let mut model: Vec<u8> = Vec::new();

        for (chunk, drain_len) in &ops {
            if queue.enqueue(chunk).is_ok() {
                model.extend_from_slice(chunk);
            }
            let mut out = vec![0u8; *drain_len];
            let n = queue.drain(&mut out);
            let expected: Vec<u8> = model.drain(..n).collect();
            prop_assert_eq!(&out[..n], expected.as_slice());
        }
        prop_assert_eq!(queue.len(), model.len());
    }

    /// A timer never exceeds its most recent duration minus elapsed ticks,
    /// and never underflows
    #[test]
    fn timer_counts_down_exactly(duration in 0u32..5000, ticks in 0u32..6000) {
        let timers = TimerService::new();
        timers.set(TimerSlot::SampleCadence, duration);

        for _ in 0..ticks {
            timers.tick();
        }

        prop_assert_eq!(timers.get(TimerSlot::SampleCadence), duration.saturating_sub(ticks));
    }

    /// Re-arming mid-countdown supersedes the previous duration
    #[test]
    fn rearm_overwrites(first in 1u32..100, second in 0u32..100, ticks in 0u32..50) {
        let timers = TimerService::new();
        timers.set(TimerSlot::Heartbeat, first);
        for _ in 0..ticks.min(first) {
            timers.tick();
        }
        timers.set(TimerSlot::Heartbeat, second);
        prop_assert_eq!(timers.get(TimerSlot::Heartbeat), second);
    }
}
