use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone)]
pub enum ActorError {
    /// An error originating from the completion provider.
    #[error("LLM request failed: {0}")]
    LlmError(String),
    /// A generic internal error within an actor.
    #[error("Internal system error: {0}")]
    Internal(String),
    /// An error indicating that an actor operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("Actor operation timed out: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Role tag of a chat-completion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A full completion request. Model settings are filled in by the provider
/// from its configuration when left as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request to generate a complete text response.
    Complete {
        request: CompletionRequest,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
    /// A command to stop the runner loop.
    Shutdown,
}
