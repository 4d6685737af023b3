//! Task store trait
//!
//! Defines the remote operations the board consumes.

use async_trait::async_trait;

use crate::task::{CollabListId, NewTask, Task, TaskId, TaskStatus};
use crate::Result;

/// Filters for a task listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Restrict to a shared list; `None` means the personal list
    pub collab_list_id: Option<CollabListId>,
    /// Return only archived tasks
    pub archived_only: bool,
}

impl ListQuery {
    pub fn scoped(collab_list_id: Option<CollabListId>) -> Self {
        Self {
            collab_list_id,
            archived_only: false,
        }
    }

    pub fn archived(collab_list_id: Option<CollabListId>) -> Self {
        Self {
            collab_list_id,
            archived_only: true,
        }
    }
}

/// Remote task store.
///
/// A store-reported failure (`success: false`) surfaces as
/// [`Error::Rejected`](crate::Error::Rejected); network and parse failures
/// as [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// List tasks matching the query
    async fn list_tasks(&self, query: ListQuery) -> Result<Vec<Task>>;

    /// Create a task; returns the store's confirmation message, if any
    async fn create_task(&self, task: NewTask) -> Result<Option<String>>;

    /// Change a task's status
    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<()>;

    /// Permanently delete a task
    async fn delete_task(&self, id: &TaskId) -> Result<()>;

    /// Move a task out of the active lanes
    async fn archive_task(&self, id: &TaskId) -> Result<()>;

    /// Return an archived task to the active lanes
    async fn unarchive_task(&self, id: &TaskId) -> Result<()>;
}
