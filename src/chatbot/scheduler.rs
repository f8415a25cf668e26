//! Virtual-time delayed task queue.
//!
//! Stands in for UI timers so dialog pacing can be driven deterministically.
//! Tasks fire in deadline order; ties fire in scheduling order.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `task` to fire `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let at = self.now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((at, seq), task);
        self.deadlines.insert(seq, at);
        TaskId(seq)
    }

    /// Cancel a pending task. Returns it if it had not fired yet.
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let at = self.deadlines.remove(&id.0)?;
        self.queue.remove(&(at, id.0))
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its deadline. Returns `None` when nothing is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let (&(at, seq), _) = self.queue.first_key_value()?;
        if at > until {
            return None;
        }
        let task = self.queue.remove(&(at, seq))?;
        self.deadlines.remove(&seq);
        self.now = self.now.max(at);
        Some(task)
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deadline of the next pending task.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(at, _)| *at)
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
