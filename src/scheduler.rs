//! Debounced rescans.

use std::time::Duration;

use crate::page::{TimerId, TimerQueue};

/// Anything that can arm and cancel one-shot timers.
pub trait TimerHost {
    fn set_timeout(&mut self, delay: Duration) -> TimerId;
    fn clear_timeout(&mut self, id: TimerId);
}

impl TimerHost for TimerQueue {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        TimerQueue::set_timeout(self, delay)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        TimerQueue::clear_timeout(self, id);
    }
}

/// Holds at most one pending timer; rescheduling replaces it.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<TimerId>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending timer and arm a fresh one.
    pub fn schedule(&mut self, host: &mut impl TimerHost) -> TimerId {
        if let Some(previous) = self.pending.take() {
            host.clear_timeout(previous);
        }
        let id = host.set_timeout(self.window);
        self.pending = Some(id);
        id
    }

    /// Whether `id` is the most recent request. Consumes it if so.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reschedule_replaces_pending_timer() {
        let mut timers = TimerQueue::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        let first = debouncer.schedule(&mut timers);
        let second = debouncer.schedule(&mut timers);
        assert_ne!(first, second);
        assert_eq!(timers.pending(), 1);

        let fired = timers.pop_due(Duration::from_millis(50)).unwrap();
        assert_eq!(fired, second);
        assert!(!debouncer.fire(first));
        assert!(debouncer.fire(second));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(second));
    }
}
