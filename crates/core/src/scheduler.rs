//! Deferred tasks - fire-once side effects processed at the top of a tick
//!
//! Each task carries the session epoch it was scheduled in. A restart bumps
//! the epoch, so anything still queued from the old session is discarded
//! instead of touching the new one. The executor additionally re-checks the
//! task's own preconditions before acting.

use std::collections::VecDeque;

/// What a deferred task does when it comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Spawn the next piece (no-op if one is already active or the game ended)
    SpawnPiece,
    /// Stop the shake flourish
    EndShake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    pub due_ms: u64,
    pub epoch: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TaskKind, due_ms: u64, epoch: u32) {
        self.tasks.push_back(Task { kind, due_ms, epoch });
    }

    /// Remove and return tasks due at `now_ms` from the current epoch, in
    /// scheduling order. Tasks from older epochs are dropped.
    pub fn take_due(&mut self, now_ms: u64, epoch: u32) -> Vec<Task> {
        self.tasks.retain(|t| t.epoch == epoch);
        let mut due = Vec::new();
        let mut pending = VecDeque::with_capacity(self.tasks.len());
        for task in self.tasks.drain(..) {
            if task.due_ms <= now_ms {
                due.push(task);
            } else {
                pending.push_back(task);
            }
        }
        self.tasks = pending;
        due
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_tasks_come_out_in_schedule_order() {
        let mut q = TaskQueue::new();
        q.schedule(TaskKind::EndShake, 30, 0);
        q.schedule(TaskKind::SpawnPiece, 10, 0);
        q.schedule(TaskKind::SpawnPiece, 50, 0);

        let due = q.take_due(30, 0);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, TaskKind::EndShake);
        assert_eq!(due[1].kind, TaskKind::SpawnPiece);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn stale_epoch_tasks_are_dropped() {
        let mut q = TaskQueue::new();
        q.schedule(TaskKind::SpawnPiece, 10, 0);
        q.schedule(TaskKind::EndShake, 500, 0);

        assert!(q.take_due(1000, 1).is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn nothing_due_before_its_time() {
        let mut q = TaskQueue::new();
        q.schedule(TaskKind::SpawnPiece, 100, 3);
        assert!(q.take_due(99, 3).is_empty());
        assert_eq!(q.len(), 1);
        assert_eq!(q.take_due(100, 3).len(), 1);
    }
}
