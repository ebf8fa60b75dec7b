//! Virtual time clock for deterministic transitions.
//!
//! `VirtualClock` holds pending entries ordered by fire time. Time only moves
//! when a driver asks for it (`next_due` + `advance_to`), so a
//! whole transition can be stepped through instantly in tests and replayed
//! against wall-clock time elsewhere.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Entry for a pending payload.
#[derive(Debug, Clone)]
struct Pending<T> {
    /// When the entry should fire (virtual time in ms)
    fire_at_ms: u64,
    /// Scheduling order, breaks ties between equal fire times
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at_ms == other.fire_at_ms && self.seq == other.seq
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earlier fire time first, then earlier scheduling
        other
            .fire_at_ms
            .cmp(&self.fire_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Virtual time clock.
///
/// Entries due at the same instant fire in the order they were scheduled.
#[derive(Debug)]
pub struct VirtualClock<T> {
    /// Current virtual time in milliseconds
    current_time_ms: u64,
    next_seq: u64,
    pending: BinaryHeap<Pending<T>>,
}

impl<T> VirtualClock<T> {
    pub fn new() -> Self {
        Self {
            current_time_ms: 0,
            next_seq: 0,
            pending: BinaryHeap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.current_time_ms
    }

    /// Schedule at an absolute virtual time. Times in the past fire on the
    /// next advance.
    pub fn schedule_at(&mut self, fire_at_ms: u64, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            fire_at_ms,
            seq,
            payload,
        });
    }

    /// Pop the next entry due at or before `until_ms`, moving the clock to
    /// its fire time.
    ///
    /// Entries scheduled while draining are picked up by later calls, so a
    /// payload may schedule follow-ups at the current instant.
    pub fn next_due(&mut self, until_ms: u64) -> Option<(u64, T)> {
        if self.pending.peek()?.fire_at_ms > until_ms {
            return None;
        }
        let entry = self.pending.pop()?;
        self.current_time_ms = self.current_time_ms.max(entry.fire_at_ms);
        Some((entry.fire_at_ms, entry.payload))
    }

    /// Move the clock forward to `target_ms` without firing anything.
    pub fn advance_to(&mut self, target_ms: u64) {
        self.current_time_ms = self.current_time_ms.max(target_ms);
    }

    /// Get the time until the next entry fires (if any).
    pub fn time_to_next(&self) -> Option<u64> {
        self.pending
            .peek()
            .map(|entry| entry.fire_at_ms.saturating_sub(self.current_time_ms))
    }

    /// Remove every pending entry, in firing order, without moving time.
    pub fn drain(&mut self) -> Vec<(u64, T)> {
        let mut drained = Vec::with_capacity(self.pending.len());
        while let Some(entry) = self.pending.pop() {
            drained.push((entry.fire_at_ms, entry.payload));
        }
        drained
    }
}

impl<T> Default for VirtualClock<T> {
    fn default() -> Self {
        Self::new()
    }
}
