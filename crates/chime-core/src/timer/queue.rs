//! Cooperative timer queue.
//!
//! Nothing here sleeps or spawns. The owner calls `pop_due(now)` in a loop
//! from its tick and dispatches each task itself; cancellation is a direct
//! `cancel(handle)` on the record that was returned at scheduling time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Handle to one scheduled timer. Never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TimerHandle,
    due: DateTime<Utc>,
    every: Option<Duration>,
    task: T,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `task` once at `at`.
    pub fn schedule_once(&mut self, at: DateTime<Utc>, task: T) -> TimerHandle {
        self.push(at, None, task)
    }

    /// Fire `task` at `first_at` and then every `every` until cancelled.
    pub fn schedule_repeating(&mut self, first_at: DateTime<Utc>, every: Duration, task: T) -> TimerHandle {
        let every = every.max(Duration::milliseconds(1));
        self.push(first_at, Some(every), task)
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|e| e.due).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the earliest timer due at or before `now`.
    ///
    /// One-shot timers are removed; repeating timers are rescheduled before
    /// being returned. A repeating timer that has fallen behind skips the
    /// missed beats instead of firing them in a burst.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<(TimerHandle, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.handle))
            .map(|(i, _)| i)?;

        match self.entries[idx].every {
            Some(every) => {
                let entry = &mut self.entries[idx];
                let handle = entry.handle;
                let task = entry.task.clone();
                let mut next = entry.due + every;
                if next <= now {
                    next = now + every;
                }
                entry.due = next;
                Some((handle, task))
            }
            None => {
                let entry = self.entries.swap_remove(idx);
                Some((entry.handle, entry.task))
            }
        }
    }

    fn push(&mut self, due: DateTime<Utc>, every: Option<Duration>, task: T) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            due,
            every,
            task,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn drain(q: &mut TimerQueue<&'static str>, now: DateTime<Utc>) -> Vec<&'static str> {
        std::iter::from_fn(|| q.pop_due(now).map(|(_, t)| t)).collect()
    }

    #[test]
    fn one_shot_fires_once_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule_once(t0() + Duration::milliseconds(500), "late");
        q.schedule_once(t0() + Duration::milliseconds(100), "early");
        assert!(drain(&mut q, t0()).is_empty());
        assert_eq!(drain(&mut q, t0() + Duration::seconds(1)), vec!["early", "late"]);
        assert!(q.is_empty());
    }

    #[test]
    fn repeating_reschedules_and_skips_missed_beats() {
        let mut q = TimerQueue::new();
        let h = q.schedule_repeating(t0() + Duration::seconds(1), Duration::seconds(1), "beat");
        assert_eq!(drain(&mut q, t0() + Duration::seconds(1)), vec!["beat"]);
        assert!(q.is_scheduled(h));
        // Ten seconds late: one beat, not nine.
        assert_eq!(drain(&mut q, t0() + Duration::seconds(11)), vec!["beat"]);
        assert_eq!(q.next_due(), Some(t0() + Duration::seconds(12)));
    }

    #[test]
    fn cancel_is_direct_and_idempotent() {
        let mut q = TimerQueue::new();
        let h = q.schedule_repeating(t0(), Duration::seconds(1), "beat");
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(!q.is_scheduled(h));
        assert!(drain(&mut q, t0() + Duration::seconds(5)).is_empty());
    }

    #[test]
    fn handles_are_unique() {
        let mut q = TimerQueue::new();
        let a = q.schedule_once(t0(), "a");
        let b = q.schedule_once(t0(), "b");
        assert_ne!(a, b);
        assert_eq!(q.pop_due(t0()).map(|(h, _)| h), Some(a));
    }
}
