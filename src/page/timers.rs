//! Virtual-clock timer queue.

use std::time::Duration;

/// Handle for a pending timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
struct Timer {
    id: TimerId,
    deadline: Duration,
}

/// Timeouts ordered by deadline, then by creation order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    /// Time elapsed since the page was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(Timer {
            id,
            deadline: self.now + delay,
        });
        id
    }

    /// Returns `false` when the timer already fired or was cancelled.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    /// Remove the earliest timer due at or before `until`, moving the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let (index, timer) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, t)| (i, *t))?;
        self.timers.remove(index);
        self.now = self.now.max(timer.deadline);
        Some(timer.id)
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
