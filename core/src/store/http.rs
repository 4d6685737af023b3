//! HTTP task store client
//!
//! Talks JSON to the remote task store. Every response body is an envelope
//! `{success, message?, ...payload}`; the HTTP status code is not trusted on
//! its own because the store reports most failures in the body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::repository::{ListQuery, TaskStore};
use crate::error::Error;
use crate::task::{NewTask, Task, TaskId, TaskStatus};
use crate::Result;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<serde_json::Value>>,
}

impl Envelope {
    fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::rejected(self.message.or(self.error)))
        }
    }
}

/// [`TaskStore`] backed by the store's REST endpoints
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
}

impl HttpTaskStore {
    /// Create a client for the store at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid store URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, id: &TaskId, suffix: &str) -> String {
        format!(
            "{}/tasks/{}{}",
            self.base_url,
            urlencoding::encode(id.as_str()),
            suffix
        )
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Envelope> {
        let resp = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to {}: {}", what, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read {} response: {}", what, e)))?;

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            Error::Transport(format!(
                "Malformed {} response (HTTP {}): {}",
                what, status, e
            ))
        })?;

        debug!(%status, success = envelope.success, "store responded to {}", what);
        envelope.into_result()
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self, query: ListQuery) -> Result<Vec<Task>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(list_id) = query.collab_list_id {
            params.push(("collab_list_id", list_id.to_string()));
        }
        if query.archived_only {
            params.push(("archived_only", "true".to_string()));
        }

        let request = self
            .client
            .get(format!("{}/tasks", self.base_url))
            .query(&params);
        let envelope = self.send(request, "list tasks").await?;

        // One bad row must not hide the rest of the board.
        let rows = envelope.tasks.unwrap_or_default();
        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.get("id").cloned();
            match serde_json::from_value::<Task>(row) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(?id, error = %e, "skipping unreadable task row"),
            }
        }
        Ok(tasks)
    }

    async fn create_task(&self, task: NewTask) -> Result<Option<String>> {
        let request = self
            .client
            .post(format!("{}/tasks", self.base_url))
            .json(&task);
        let envelope = self.send(request, "create task").await?;
        info!(title = %task.title, "task created");
        Ok(envelope.message)
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let request = self
            .client
            .put(self.task_url(id, "/status"))
            .json(&json!({ "status": status }));
        self.send(request, "update status").await?;
        info!(task_id = %id, %status, "task status updated");
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let request = self.client.delete(self.task_url(id, ""));
        self.send(request, "delete task").await?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn archive_task(&self, id: &TaskId) -> Result<()> {
        let request = self.client.post(self.task_url(id, "/archive"));
        self.send(request, "archive task").await?;
        info!(task_id = %id, "task archived");
        Ok(())
    }

    async fn unarchive_task(&self, id: &TaskId) -> Result<()> {
        let request = self.client.post(self.task_url(id, "/unarchive"));
        self.send(request, "unarchive task").await?;
        info!(task_id = %id, "task unarchived");
        Ok(())
    }
}
