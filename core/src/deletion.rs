//! Deferred deletion with undo
//!
//! Each pending deletion is keyed by task id and owns its own commit and
//! countdown timers, so overlapping deletes never disturb one another.
//! An entry leaves the map exactly once: through undo (restored, no remote
//! effect) or through its commit timer (one remote delete).

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::task::{Task, TaskId};
use crate::Result;

/// A deletion waiting out its grace period
#[derive(Debug)]
pub struct PendingDeletion {
    /// Full record captured at delete time
    pub backup: Task,
    /// Identity of this schedule; a timer only acts on its own ticket
    pub ticket: Uuid,
    /// Countdown display value
    pub remaining: u32,
    seq: u64,
    timers: Vec<JoinHandle<()>>,
}

impl PendingDeletion {
    fn cancel_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }
}

/// Read-only view of a pending deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDeletionInfo {
    pub task_id: TaskId,
    pub title: String,
    pub remaining: u32,
}

/// Bounded set of undoable deletions
#[derive(Debug)]
pub struct DeletionScheduler {
    pending: HashMap<TaskId, PendingDeletion>,
    capacity: usize,
    next_seq: u64,
}

impl DeletionScheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: HashMap::new(),
            capacity,
            next_seq: 0,
        }
    }

    /// Open a grace period for `backup`.
    ///
    /// Returns `Ok(None)` if the task already has one.
    pub fn schedule(&mut self, backup: Task, countdown: u32) -> Result<Option<Uuid>> {
        if self.pending.contains_key(&backup.id) {
            debug!(task_id = %backup.id, "deletion already pending");
            return Ok(None);
        }
        if self.pending.len() >= self.capacity {
            return Err(Error::InvalidInput(format!(
                "Too many pending deletions ({}), wait for one to finish",
                self.capacity
            )));
        }

        let ticket = Uuid::new_v4();
        self.next_seq += 1;
        debug!(task_id = %backup.id, %ticket, "deletion scheduled");
        self.pending.insert(
            backup.id.clone(),
            PendingDeletion {
                backup,
                ticket,
                remaining: countdown,
                seq: self.next_seq,
                timers: Vec::new(),
            },
        );
        Ok(Some(ticket))
    }

    /// Hand the timers of a schedule to its entry.
    ///
    /// If the entry is already gone the timers are cancelled.
    pub fn attach_timers(&mut self, id: &TaskId, ticket: Uuid, timers: Vec<JoinHandle<()>>) {
        match self.pending.get_mut(id) {
            Some(entry) if entry.ticket == ticket => entry.timers.extend(timers),
            _ => timers.into_iter().for_each(|t| t.abort()),
        }
    }

    /// Record a countdown tick; `None` if the schedule is gone
    pub fn record_tick(&mut self, id: &TaskId, ticket: Uuid, remaining: u32) -> Option<u32> {
        let entry = self.pending.get_mut(id).filter(|e| e.ticket == ticket)?;
        entry.remaining = remaining;
        Some(remaining)
    }

    /// Commit-timer expiry: claim the entry if it is still this schedule.
    ///
    /// The timers are detached rather than aborted; the caller is one of them.
    pub fn take_for_commit(&mut self, id: &TaskId, ticket: Uuid) -> Option<Task> {
        if self.pending.get(id)?.ticket != ticket {
            return None;
        }
        let entry = self.pending.remove(id)?;
        Some(entry.backup)
    }

    /// Undo: claim the entry and cancel both of its timers
    pub fn take_for_undo(&mut self, id: &TaskId) -> Option<Task> {
        let mut entry = self.pending.remove(id)?;
        entry.cancel_timers();
        Some(entry.backup)
    }

    /// Most recently scheduled pending deletion
    pub fn latest(&self) -> Option<TaskId> {
        self.pending
            .values()
            .max_by_key(|e| e.seq)
            .map(|e| e.backup.id.clone())
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.pending.contains_key(id)
    }

    /// Ids whose cards must stay hidden
    pub fn hidden_ids(&self) -> HashSet<TaskId> {
        self.pending.keys().cloned().collect()
    }

    /// Pending deletions, oldest first
    pub fn snapshot(&self) -> Vec<PendingDeletionInfo> {
        let mut entries: Vec<&PendingDeletion> = self.pending.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
            .into_iter()
            .map(|e| PendingDeletionInfo {
                task_id: e.backup.id.clone(),
                title: e.backup.title.clone(),
                remaining: e.remaining,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Drop for DeletionScheduler {
    fn drop(&mut self) {
        for entry in self.pending.values_mut() {
            entry.cancel_timers();
        }
    }
}
