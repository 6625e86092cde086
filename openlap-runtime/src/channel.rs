//! Latest-value snapshot transport
//!
//! A single-producer/single-consumer slot, not a queue: the consumer can
//! always obtain the most recently published snapshot, but intermediate
//! values are silently replaced if it polls slower than the producer
//! publishes. Consumption is cursor-based, so a consumer that has already
//! seen the current value gets "nothing new" without copying.

use openlap_core::Snapshot;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lossy-latest SPSC transport for snapshots.
///
/// The sequence counter is advanced while the slot lock is held, so a
/// waiter re-checking the sequence under the mutex can never miss a
/// publish, and a consumer never observes a torn value.
#[derive(Debug, Default)]
pub struct SnapshotChannel {
    slot: Mutex<Snapshot>,
    seq: AtomicU64,
    new_data: Condvar,
}

impl SnapshotChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` as the latest value and wake any waiting consumer.
    pub fn publish(&self, snapshot: Snapshot) {
        {
            let mut slot = self.slot.lock();
            *slot = snapshot;
            self.seq.fetch_add(1, Ordering::Release);
        }
        self.new_data.notify_all();
    }

    /// Sequence number of the most recent publish; 0 before the first one.
    pub fn sequence(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    /// Non-blocking poll: returns the latest snapshot if it is newer than
    /// the caller's cursor, advancing the cursor; `None` when nothing new.
    pub fn try_consume_latest(&self, cursor: &mut u64) -> Option<Snapshot> {
        if self.seq.load(Ordering::Acquire) == *cursor {
            return None;
        }
        let slot = self.slot.lock();
        *cursor = self.seq.load(Ordering::Relaxed);
        Some(slot.clone())
    }

    /// Blocking variant: wait up to `timeout` for the sequence to move past
    /// the cursor, then behave like `try_consume_latest`.
    pub fn wait_for_new(&self, cursor: &mut u64, timeout: Duration) -> Option<Snapshot> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        while self.seq.load(Ordering::Relaxed) == *cursor {
            if self.new_data.wait_until(&mut slot, deadline).timed_out() {
                if self.seq.load(Ordering::Relaxed) == *cursor {
                    return None;
                }
                break;
            }
        }
        *cursor = self.seq.load(Ordering::Relaxed);
        Some(slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn snap(tick: u64) -> Snapshot {
        Snapshot {
            tick,
            sim_time: tick as f64,
            ..Default::default()
        }
    }

    #[test]
    fn test_publish_then_consume_once() {
        let ch = SnapshotChannel::new();
        ch.publish(snap(1));

        let mut cursor = 0;
        let out = ch.try_consume_latest(&mut cursor).expect("new data");
        assert_eq!(out.tick, 1);
        // Same cursor again: nothing new
        assert!(ch.try_consume_latest(&mut cursor).is_none());
    }

    #[test]
    fn test_underrun_before_first_publish() {
        let ch = SnapshotChannel::new();
        let mut cursor = 0;
        assert!(ch.try_consume_latest(&mut cursor).is_none());
        assert!(ch.wait_for_new(&mut cursor, Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_lossy_latest_keeps_only_newest() {
        let ch = SnapshotChannel::new();
        for tick in 1..=50 {
            ch.publish(snap(tick));
        }

        let mut cursor = 0;
        let out = ch.try_consume_latest(&mut cursor).expect("new data");
        assert_eq!(out.tick, 50);
        assert!(ch.try_consume_latest(&mut cursor).is_none());
    }

    #[test]
    fn test_wait_for_new_wakes_on_publish() {
        let ch = Arc::new(SnapshotChannel::new());
        let producer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                ch.publish(snap(7));
            })
        };

        let mut cursor = 0;
        let out = ch.wait_for_new(&mut cursor, Duration::from_secs(2));
        producer.join().unwrap();
        assert_eq!(out.expect("publish should wake the waiter").tick, 7);
    }

    #[test]
    fn test_wait_for_new_times_out_without_publish() {
        let ch = SnapshotChannel::new();
        ch.publish(snap(1));
        let mut cursor = 0;
        assert!(ch.try_consume_latest(&mut cursor).is_some());

        let start = Instant::now();
        assert!(ch.wait_for_new(&mut cursor, Duration::from_millis(30)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_concurrent_producer_consumer_sees_monotonic_ticks() {
        let ch = Arc::new(SnapshotChannel::new());
        let producer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                for tick in 1..=1000 {
                    ch.publish(snap(tick));
                }
            })
        };

        let mut cursor = 0;
        let mut last_tick = 0;
        while last_tick < 1000 {
            if let Some(s) = ch.wait_for_new(&mut cursor, Duration::from_secs(2)) {
                assert!(s.tick > last_tick, "ticks must only move forward");
                last_tick = s.tick;
            } else {
                panic!("producer stalled before tick 1000");
            }
        }
        producer.join().unwrap();
    }
}
