//! Task model definitions
//!
//! These types follow the wire format of the remote task store, which is
//! looser than the model: ids arrive as integers, priorities capitalized,
//! and the archived flag as `0`/`1`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque task identifier, stable across reloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Identifier of a shared (collaborative) task list
pub type CollabListId = i64;

/// Task status; each status owns exactly one board lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The store keeps whatever text it was given; anything unknown reads as medium.
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| Self::parse(&s)).unwrap_or_default())
    }
}

/// A task record as held by the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub collab_list_id: Option<CollabListId>,
    #[serde(default, deserialize_with = "flag")]
    pub archived: bool,
}

impl Task {
    /// Create a pending, unarchived task
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority: TaskPriority::default(),
            due_date: None,
            status: TaskStatus::default(),
            collab_list_id: None,
            archived: false,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Set the shared list
    pub fn with_collab_list(mut self, list_id: CollabListId) -> Self {
        self.collab_list_id = Some(list_id);
        self
    }

    /// Mark archived
    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Creation payload sent to the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collab_list_id: Option<CollabListId>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: TaskPriority::default(),
            due_date: None,
            status: TaskStatus::Pending,
            collab_list_id: None,
        }
    }
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        // Stores sometimes send a full timestamp; only the date part matters.
        let date = s.get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<RawFlag>::deserialize(deserializer)? {
        None => false,
        Some(RawFlag::Bool(b)) => b,
        Some(RawFlag::Int(n)) => n != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task() {
        let task = Task::new("7", "Write report");
        assert_eq!(task.id.as_str(), "7");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(!task.archived);
    }

    #[test]
    fn test_deserialize_store_row() {
        let json = r#"{
            "id": 42,
            "title": "Ship it",
            "priority": "High",
            "due_date": "2024-05-01",
            "status": "in_progress",
            "collab_list_id": null,
            "archived": 0
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, TaskId::new("42"));
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert!(!task.archived);
    }

    #[test]
    fn test_deserialize_loose_fields() {
        let json = r#"{"id": "abc", "title": "t", "priority": null, "due_date": "soon", "archived": true}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id.as_str(), "abc");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.due_date.is_none());
        assert!(task.archived);

        let json = r#"{"id": 1, "title": "t", "archived": 1, "due_date": "2024-01-02 10:00:00"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.archived);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_unknown_priority_falls_back_to_medium() {
        let json = r#"{"id": 1, "title": "t", "priority": "Urgent"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, TaskPriority::Medium);

        let json = r#"{"id": 2, "title": "t", "priority": "LOW"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, TaskPriority::Low);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let json = r#"{"id": 1, "title": "t", "status": "blocked"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_new_task_payload() {
        let mut new_task = NewTask::new("Plan");
        new_task.collab_list_id = Some(3);
        let value = serde_json::to_value(&new_task).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["collab_list_id"], 3);
        assert!(value["due_date"].is_null());
    }
}
