//! Error types for the board engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store answered with `success: false`.
    #[error("Store rejected request: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    /// Network failure or a response body that is not a valid envelope.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a rejection carrying the store's message, if any
    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected { message }
    }

    /// True for failures that never reached a store decision
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Serialization(_))
    }

    /// The store-provided message for a rejection
    pub fn store_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Pick the text shown to the user for a failed remote call.
    ///
    /// Rejections prefer the store's own message; everything else falls
    /// back to the generic text for the operation.
    pub fn user_message(&self, rejected_fallback: &str, transport_fallback: &str) -> String {
        match self {
            Self::Rejected { message } => message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| rejected_fallback.to_string()),
            Self::Transport(_) | Self::Serialization(_) => transport_fallback.to_string(),
            Self::InvalidInput(message) => message.clone(),
            Self::TaskNotFound(_) => "Task not found".to_string(),
            other => other.to_string(),
        }
    }
}
