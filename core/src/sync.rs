//! Status sync
//!
//! Turns a resolved status change into a remote update. The caller has
//! already moved the card optimistically; whatever the store says, the
//! board then converges by reloading in full.

use std::sync::Arc;

use tracing::{info, warn};

use crate::board::{Lane, Notice};
use crate::store::TaskStore;
use crate::task::{TaskId, TaskStatus};

/// How a status update ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Confirmed,
    /// The store answered `success: false`
    Rejected { message: Option<String> },
    /// The request never produced a usable answer
    TransportFailed,
}

impl SyncOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Notice to show for this outcome of a move into `target`
    pub fn notice(&self, target: Lane) -> Notice {
        match self {
            Self::Confirmed => Notice::success(format!("Task moved to {}", target.title())),
            Self::Rejected { message } => Notice::error(
                message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Failed to update status".to_string()),
            ),
            Self::TransportFailed => Notice::error("Network error updating status"),
        }
    }
}

/// Issues one remote update per status-changing drop
#[derive(Clone)]
pub struct SyncReconciler {
    store: Arc<dyn TaskStore>,
}

impl SyncReconciler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Ask the store to move `task_id` to `status`.
    ///
    /// No coalescing or cancellation: every call goes out on its own.
    pub async fn commit_status(&self, task_id: &TaskId, status: TaskStatus) -> SyncOutcome {
        match self.store.update_status(task_id, status).await {
            Ok(()) => {
                info!(%task_id, %status, "status change confirmed");
                SyncOutcome::Confirmed
            }
            Err(err) if err.is_transport() => {
                warn!(%task_id, %status, error = %err, "status change lost in transport");
                SyncOutcome::TransportFailed
            }
            Err(err) => {
                warn!(%task_id, %status, error = %err, "status change rejected");
                SyncOutcome::Rejected {
                    message: err.store_message().map(str::to_string),
                }
            }
        }
    }
}
