// Kbfn Timer Queue
// Delayed re-entries requested by layers, ordered by deadline

use super::LayerId;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::SystemTime;

/// Address of a scheduled re-entry.
///
/// `token` is opaque to the queue; the owning layer uses it to tell a live
/// timer from one left over by an earlier activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    pub layer: LayerId,
    pub token: u64,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Scheduled {
    deadline: SystemTime,
    seq: u64,
    id: TimerId,
}

/// One-shot timers on the event timestamp clock.
///
/// Timers are never cancelled; the owner revalidates on expiry.
#[derive(Debug, Default)]
pub struct Timers {
    queue: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` to fire once `deadline` is reached
    pub fn schedule(&mut self, deadline: SystemTime, id: TimerId) {
        self.seq += 1;
        self.queue.push(Reverse(Scheduled {
            deadline,
            seq: self.seq,
            id,
        }));
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<SystemTime> {
        self.queue.peek().map(|Reverse(s)| s.deadline)
    }

    /// Remove and return the earliest timer whose deadline is `<= now`.
    ///
    /// Timers with equal deadlines come out in scheduling order.
    pub fn pop_due(&mut self, now: SystemTime) -> Option<TimerId> {
        match self.queue.peek() {
            Some(Reverse(s)) if s.deadline <= now => self.queue.pop().map(|Reverse(s)| s.id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
