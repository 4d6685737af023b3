//! Board events
//!
//! Everything a host needs to present beyond the view itself: transient
//! notices, reload signals and the undo countdown.

use serde::Serialize;

use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Event broadcast to board subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    Notice(Notice),
    /// The view was rebuilt from a fresh listing
    Reloaded { generation: u64 },
    ArchivedLoaded { count: usize },
    /// Undo countdown display value
    Countdown { task_id: TaskId, remaining: u32 },
    /// The undo affordance for a task is gone
    UndoHidden { task_id: TaskId },
    /// The delete call for a task was issued and succeeded
    DeletionCommitted { task_id: TaskId },
}
