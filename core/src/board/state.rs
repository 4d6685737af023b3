//! In-memory board state
//!
//! A cache of task records as last listed by the store. It is replaced
//! wholesale on every reload rather than patched.

use crate::task::{Task, TaskId, TaskStatus};

/// Cached task records for the active lanes and the archived listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    tasks: Vec<Task>,
    archived: Vec<Task>,
}

impl BoardState {
    /// Create an empty board state
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the lane cache; archived records never enter a lane
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks.into_iter().filter(|t| !t.archived).collect();
    }

    /// Replace the archived listing
    pub fn replace_archived(&mut self, tasks: Vec<Task>) {
        self.archived = tasks.into_iter().filter(|t| t.archived).collect();
    }

    /// Tasks of one lane, in store order
    pub fn lane(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    /// Get an active task by ID
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Get an archived task by ID
    pub fn get_archived(&self, id: &TaskId) -> Option<&Task> {
        self.archived.iter().find(|t| &t.id == id)
    }

    /// Drop a record from both caches
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let archived = self
            .archived
            .iter()
            .position(|t| &t.id == id)
            .map(|pos| self.archived.remove(pos));
        self.tasks
            .iter()
            .position(|t| &t.id == id)
            .map(|pos| self.tasks.remove(pos))
            .or(archived)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn archived(&self) -> &[Task] {
        &self.archived
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_excludes_archived() {
        let mut state = BoardState::new();
        state.replace(vec![
            Task::new(1u64, "live").with_status(TaskStatus::Completed),
            Task::new(2u64, "gone").with_status(TaskStatus::Completed).archived(),
        ]);
        assert_eq!(state.len(), 1);
        assert_eq!(state.lane(TaskStatus::Completed).count(), 1);
        assert!(state.get(&TaskId::new("2")).is_none());
    }

    #[test]
    fn test_lane_partitions_by_status() {
        let mut state = BoardState::new();
        state.replace(vec![
            Task::new(1u64, "a"),
            Task::new(2u64, "b").with_status(TaskStatus::InProgress),
            Task::new(3u64, "c"),
        ]);
        let pending: Vec<_> = state.lane(TaskStatus::Pending).map(|t| t.title.as_str()).collect();
        assert_eq!(pending, vec!["a", "c"]);
        assert_eq!(state.lane(TaskStatus::Completed).count(), 0);
    }

    #[test]
    fn test_remove_from_either_cache() {
        let mut state = BoardState::new();
        state.replace(vec![Task::new(1u64, "a")]);
        state.replace_archived(vec![Task::new(2u64, "b").archived()]);

        assert!(state.remove(&TaskId::new("2")).is_some());
        assert!(state.archived().is_empty());
        assert!(state.remove(&TaskId::new("1")).is_some());
        assert!(state.is_empty());
        assert!(state.remove(&TaskId::new("1")).is_none());
    }
}
