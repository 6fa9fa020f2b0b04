//! Virtual-Time Timer Queue
//!
//! Fire-once timers keyed by due time. The queue never reads a wall
//! clock: callers pass `now` in milliseconds, so tests advance time
//! explicitly and replays fire timers in the same order.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Milliseconds of virtual time.
pub type Millis = u64;

/// Handle for a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Ordered queue of fire-once timers.
///
/// Timers due at the same instant fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    /// (due, seq) -> payload. BTreeMap for deterministic firing order.
    entries: BTreeMap<(Millis, u64), T>,
    /// seq -> due, for cancellation by id
    index: BTreeMap<u64, Millis>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            index: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `payload` to fire `delay` ms after `now`.
    pub fn schedule(&mut self, now: Millis, delay: Millis, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = now.saturating_add(delay);
        self.entries.insert((due, seq), payload);
        self.index.insert(seq, due);
        TimerId(seq)
    }

    /// Cancel a pending timer. Returns the payload if it had not fired.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let due = self.index.remove(&id.0)?;
        self.entries.remove(&(due, id.0))
    }

    /// Drop every pending timer.
    ///
    /// Ids stay unique across a clear, so a stale handle can never
    /// cancel a timer scheduled afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Remove and return all timers due at or before `now`, in firing order.
    pub fn pop_due(&mut self, now: Millis) -> Vec<(TimerId, T)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            let (due, seq) = *entry.key();
            if due > now {
                break;
            }
            let payload = entry.remove();
            self.index.remove(&seq);
            fired.push((TimerId(seq), payload));
        }
        fired
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Is the timer still pending?
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id.0)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no pending timers?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
