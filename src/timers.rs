//! Fire-and-forget deferred tasks
//!
//! Every scheduled task is independent: nothing is ever cancelled or merged.
//! Tasks scheduled for the same instant come out in scheduling order.

use std::time::Duration;

#[derive(Debug)]
struct Pending<T> {
    due: Duration,
    task: T,
}

#[derive(Debug)]
pub struct DeferredQueue<T> {
    pending: Vec<Pending<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, task: T) {
        self.pending.push(Pending { due, task });
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let (mut due, later): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = later;
        // stable sort keeps scheduling order among equal deadlines
        due.sort_by_key(|p| p.due);
        due.into_iter().map(|p| p.task).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending deadline, if any
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|p| p.due).min()
    }
}
