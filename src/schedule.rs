// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Scheduled Tasks
//
// Timers are plain data advanced by whoever owns them. Nothing here spawns or
// sleeps, so dropping (or clearing) the owner cancels every pending firing.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RecurringTask
// ---------------------------------------------------------------------------

/// Slots released by one [`RecurringTask::take_due`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueBatch {
    /// Slots to run, oldest first. Empty when nothing was due.
    pub slots: Vec<u64>,
    /// Due slots dropped because the backlog exceeded the cap.
    pub skipped: u64,
}

impl DueBatch {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Fixed grid of firings: slot `k >= 1` is due at `origin + k * interval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTask {
    origin: i64,
    interval_ms: i64,
    next_slot: u64,
    max_backlog: u64,
}

impl RecurringTask {
    pub fn new(origin: i64, interval_ms: i64, max_backlog: u64) -> Self {
        Self {
            origin,
            interval_ms: interval_ms.max(1),
            next_slot: 1,
            max_backlog,
        }
    }

    pub fn origin(&self) -> i64 {
        self.origin
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    pub fn next_slot(&self) -> u64 {
        self.next_slot
    }

    pub fn slot_time(&self, slot: u64) -> i64 {
        self.origin + slot as i64 * self.interval_ms
    }

    pub fn next_due_at(&self) -> i64 {
        self.slot_time(self.next_slot)
    }

    fn last_due_slot(&self, now: i64) -> u64 {
        let elapsed = now - self.origin;
        if elapsed < 0 { 0 } else { (elapsed / self.interval_ms) as u64 }
    }

    /// Slots due at `now` that have not been released yet.
    pub fn pending(&self, now: i64) -> u64 {
        self.last_due_slot(now).saturating_sub(self.next_slot - 1)
    }

    /// Release every slot due at `now`, oldest first, at most `max_backlog`
    /// of them. The rest are skipped and the grid resumes after `now`.
    pub fn take_due(&mut self, now: i64) -> DueBatch {
        let pending = self.pending(now);
        if pending == 0 {
            return DueBatch { slots: Vec::new(), skipped: 0 };
        }
        let take = pending.min(self.max_backlog);
        let slots: Vec<u64> = (self.next_slot..self.next_slot + take).collect();
        self.next_slot += pending;
        DueBatch { slots, skipped: pending - take }
    }
}

// ---------------------------------------------------------------------------
// Delay - one-shot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delay {
    due_at: i64,
}

impl Delay {
    pub fn new(now: i64, delay_ms: i64) -> Self {
        Self { due_at: now + delay_ms.max(0) }
    }

    pub fn due_at(&self) -> i64 {
        self.due_at
    }

    pub fn is_due(&self, now: i64) -> bool {
        now >= self.due_at
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_due_before_first_slot() {
        let mut task = RecurringTask::new(1_000, 2_000, 10);
        assert!(task.take_due(1_000).is_empty());
        assert!(task.take_due(2_999).is_empty());
        assert_eq!(task.next_due_at(), 3_000);
    }

    #[test]
    fn test_slots_released_in_order() {
        let mut task = RecurringTask::new(0, 2_000, 10);
        let batch = task.take_due(6_500);
        assert_eq!(batch.slots, vec![1, 2, 3]);
        assert_eq!(batch.skipped, 0);
        assert_eq!(task.slot_time(3), 6_000);
        assert!(task.take_due(7_999).is_empty());
        assert_eq!(task.take_due(8_000).slots, vec![4]);
    }

    #[test]
    fn test_backlog_cap_skips_newest() {
        let mut task = RecurringTask::new(0, 1_000, 5);
        let batch = task.take_due(12_000);
        assert_eq!(batch.slots, vec![1, 2, 3, 4, 5]);
        assert_eq!(batch.skipped, 7);
        assert_eq!(task.next_slot(), 13);
        assert_eq!(task.pending(12_999), 0);
    }

    #[test]
    fn test_zero_backlog_skips_everything() {
        let mut task = RecurringTask::new(0, 1_000, 0);
        let batch = task.take_due(3_000);
        assert!(batch.is_empty());
        assert_eq!(batch.skipped, 3);
    }

    #[test]
    fn test_origin_in_future() {
        let task = RecurringTask::new(10_000, 1_000, 5);
        assert_eq!(task.pending(0), 0);
    }

    #[test]
    fn test_delay() {
        let delay = Delay::new(100, 500);
        assert!(!delay.is_due(599));
        assert!(delay.is_due(600));
    }
}
