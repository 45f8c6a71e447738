//! Cancelable timers owned by a scan session
//!
//! The UI loop is the only clock: it calls `drain_due` on every tick, so a
//! task can never fire after its owner has been torn down.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Scheduled<T> {
    id: TaskId,
    due: Instant,
    payload: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    tasks: Vec<Scheduled<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled { id, due, payload });
        id
    }

    /// Returns false when the task already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Drop every pending task; returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        dropped
    }

    /// Remove and return every task due at `now`, earliest first. Tasks due
    /// at the same instant come out in scheduling order.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.tasks.len() {
            if self.tasks[index].due <= now {
                due.push(self.tasks.remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|task| (task.due, task.id.0));
        due.into_iter().map(|task| task.payload).collect()
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.due).min()
    }
}

impl<T> Drop for Scheduler<T> {
    fn drop(&mut self) {
        let dropped = self.cancel_all();
        if dropped > 0 {
            tracing::debug!(dropped, "cancelled pending timers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_drains_only_due_tasks_in_due_order() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(start + Duration::from_millis(300), "third");
        scheduler.schedule(start, "first");
        scheduler.schedule(start + Duration::from_millis(100), "second");

        assert_eq!(scheduler.drain_due(start), vec!["first"]);
        assert_eq!(
            scheduler.drain_due(start + Duration::from_millis(300)),
            vec!["second", "third"]
        );
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_all_prevents_firing() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(start, 1);
        scheduler.schedule(start + Duration::from_secs(1), 2);
        assert_eq!(scheduler.cancel_all(), 2);
        assert!(scheduler.drain_due(start + Duration::from_secs(5)).is_empty());
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn test_cancel_single_task() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule(start, "keep");
        let drop = scheduler.schedule(start, "drop");
        assert!(scheduler.cancel(drop));
        assert!(!scheduler.cancel(drop));
        assert_eq!(scheduler.drain_due(start), vec!["keep"]);
        assert!(!scheduler.cancel(keep));
    }
}
