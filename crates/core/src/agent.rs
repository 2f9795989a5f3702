//! Single-message chat agent.
//!
//! An [`Agent`] forwards one user message to the configured model and wraps
//! the reply. It is cheap to build, so the HTTP layer creates one per request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chat::{ChatClient, ChatMessage, ChatRequest};
use crate::error::CoreError;

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Model selection and provider flags for an [`Agent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub model: String,
    pub web_search: bool,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            web_search: false,
        }
    }

    pub fn with_web_search(mut self, web_search: bool) -> Self {
        self.web_search = web_search;
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

/// Reply returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
}

#[derive(Clone)]
pub struct Agent {
    config: AgentConfig,
    client: Arc<dyn ChatClient>,
}

impl Agent {
    pub fn new(config: AgentConfig, client: Arc<dyn ChatClient>) -> Self {
        tracing::debug!(model = %config.model, web_search = config.web_search, "Agent initialized");
        Self { config, client }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Send `message` as a single user turn and return the model's reply.
    ///
    /// Blank messages are rejected before any upstream call is made.
    pub async fn send_message(&self, message: &str) -> Result<AgentResponse, CoreError> {
        if message.trim().is_empty() {
            return Err(CoreError::Validation("Message cannot be empty".to_string()));
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(message)],
            web_search: self.config.web_search,
        };

        tracing::debug!(
            model = %request.model,
            chars = message.chars().count(),
            "Sending message to agent",
        );

        let reply = self.client.chat_completion(&request).await.map_err(|e| {
            tracing::error!(model = %request.model, error = %e, "Failed to send message");
            CoreError::Agent(format!("Failed to communicate with AI: {e}"))
        })?;

        tracing::debug!(chars = reply.chars().count(), "Received response from agent");

        Ok(AgentResponse { message: reply })
    }
}
