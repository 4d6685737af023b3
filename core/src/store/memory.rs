//! In-process task store
//!
//! Behaves like the remote store (same filters, same failure shapes) and
//! keeps a log of every call so callers can assert on remote traffic.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::repository::{ListQuery, TaskStore};
use crate::error::Error;
use crate::task::{NewTask, Task, TaskId, TaskStatus};
use crate::Result;

/// Remote operation kinds, used for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    UpdateStatus,
    Delete,
    Archive,
    Unarchive,
}

/// How an injected failure presents itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMode {
    /// `success: false` with an optional message
    Rejected(Option<String>),
    /// Network or parse failure
    Transport,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(ListQuery),
    Create(String),
    UpdateStatus(TaskId, TaskStatus),
    Delete(TaskId),
    Archive(TaskId),
    Unarchive(TaskId),
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, VecDeque<FailureMode>>,
}

/// [`TaskStore`] held entirely in memory
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: RwLock<Inner>,
    latency: Option<Duration>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with tasks
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks: Vec<Task> = tasks.into_iter().collect();
        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            inner: RwLock::new(Inner {
                tasks,
                next_id,
                ..Inner::default()
            }),
            latency: None,
        }
    }

    /// Delay every call, to let callers interleave with in-flight requests
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call of `op` fail with `mode`
    pub async fn fail_next(&self, op: StoreOp, mode: FailureMode) {
        let mut inner = self.inner.write().await;
        inner.failures.entry(op).or_default().push_back(mode);
    }

    /// All calls so far, in order
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.read().await.calls.clone()
    }

    /// Number of delete calls issued for `id`
    pub async fn delete_calls(&self, id: &TaskId) -> usize {
        self.inner
            .read()
            .await
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Delete(d) if d == id))
            .count()
    }

    /// Status-update calls issued so far
    pub async fn status_calls(&self) -> Vec<(TaskId, TaskStatus)> {
        self.inner
            .read()
            .await
            .calls
            .iter()
            .filter_map(|c| match c {
                StoreCall::UpdateStatus(id, status) => Some((id.clone(), *status)),
                _ => None,
            })
            .collect()
    }

    /// Snapshot of a stored task
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner
            .read()
            .await
            .tasks
            .iter()
            .find(|t| &t.id == id)
            .cloned()
    }

    /// Mutate stored data directly, as another collaborator would
    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) -> bool {
        let mut inner = self.inner.write().await;
        match inner.tasks.iter_mut().find(|t| &t.id == id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    async fn begin(&self, op: StoreOp, call: StoreCall) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.inner.write().await;
        debug!(?call, "in-memory store call");
        inner.calls.push(call);
        match inner.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(FailureMode::Rejected(message)) => Err(Error::rejected(message)),
            Some(FailureMode::Transport) => {
                Err(Error::Transport("injected transport failure".into()))
            }
            None => Ok(()),
        }
    }

    async fn modify(&self, id: &TaskId, f: impl FnOnce(&mut Task)) -> Result<()> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| Error::rejected(Some("Task not found".into())))?;
        f(task);
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_tasks(&self, query: ListQuery) -> Result<Vec<Task>> {
        self.begin(StoreOp::List, StoreCall::List(query)).await?;
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.collab_list_id == query.collab_list_id)
            .filter(|t| t.archived == query.archived_only)
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: NewTask) -> Result<Option<String>> {
        self.begin(StoreOp::Create, StoreCall::Create(task.title.clone()))
            .await?;
        if task.title.trim().is_empty() {
            return Err(Error::rejected(Some("Task title is required".into())));
        }
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let mut created = Task::new(inner.next_id, task.title)
            .with_status(task.status)
            .with_priority(task.priority);
        created.due_date = task.due_date;
        created.collab_list_id = task.collab_list_id;
        inner.tasks.push(created);
        Ok(Some("Task created successfully".into()))
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        self.begin(StoreOp::UpdateStatus, StoreCall::UpdateStatus(id.clone(), status))
            .await?;
        self.modify(id, |t| t.status = status).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.begin(StoreOp::Delete, StoreCall::Delete(id.clone()))
            .await?;
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| &t.id != id);
        if inner.tasks.len() == before {
            return Err(Error::rejected(Some("Task not found".into())));
        }
        Ok(())
    }

    async fn archive_task(&self, id: &TaskId) -> Result<()> {
        self.begin(StoreOp::Archive, StoreCall::Archive(id.clone()))
            .await?;
        self.modify(id, |t| t.archived = true).await
    }

    async fn unarchive_task(&self, id: &TaskId) -> Result<()> {
        self.begin(StoreOp::Unarchive, StoreCall::Unarchive(id.clone()))
            .await?;
        self.modify(id, |t| t.archived = false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_scope_and_archive() {
        let store = InMemoryTaskStore::with_tasks([
            Task::new(1u64, "personal"),
            Task::new(2u64, "shared").with_collab_list(4),
            Task::new(3u64, "old").archived(),
        ]);

        let personal = store.list_tasks(ListQuery::scoped(None)).await.unwrap();
        assert_eq!(personal.len(), 1);
        assert_eq!(personal[0].title, "personal");

        let shared = store.list_tasks(ListQuery::scoped(Some(4))).await.unwrap();
        assert_eq!(shared[0].title, "shared");

        let archived = store.list_tasks(ListQuery::archived(None)).await.unwrap();
        assert_eq!(archived[0].title, "old");
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = InMemoryTaskStore::with_tasks([Task::new(7u64, "seed")]);
        store.create_task(NewTask::new("fresh")).await.unwrap();
        assert!(store.get(&TaskId::new("8")).await.is_some());
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded_and_consumed() {
        let store = InMemoryTaskStore::with_tasks([Task::new(1u64, "a")]);
        store
            .fail_next(StoreOp::Delete, FailureMode::Rejected(Some("nope".into())))
            .await;

        let err = store.delete_task(&TaskId::new("1")).await.unwrap_err();
        assert_eq!(err.store_message(), Some("nope"));
        assert!(store.get(&TaskId::new("1")).await.is_some());

        store.delete_task(&TaskId::new("1")).await.unwrap();
        assert_eq!(store.delete_calls(&TaskId::new("1")).await, 2);
        assert!(store.get(&TaskId::new("1")).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_task_is_rejected() {
        let store = InMemoryTaskStore::new();
        let err = store
            .update_status(&TaskId::new("99"), TaskStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.store_message(), Some("Task not found"));
    }
}
