//! Chat message types and the completion client port.
//!
//! Transport crates implement [`ChatClient`]; the agent services only ever
//! see plain text coming back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a chat message, serialized in lowercase.
///
/// Every call is a single user turn; no system or assistant turns are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A single message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Build a `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Everything a client needs for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Ask the provider to ground the answer with a web search, when supported.
    pub web_search: bool,
}

/// Failure reported by a [`ChatClient`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("AI service error: {0}")]
pub struct ChatClientError(pub String);

/// Sends chat-style prompts to a language model and returns the reply text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatClientError>;
}
