//! REST client for OpenAI-compatible chat-completions providers.
//!
//! Wraps `POST {base_url}/chat/completions` using [`reqwest`] and exposes
//! it to the domain through [`ChatClient`].

use std::time::Duration;

use async_trait::async_trait;
use quill_core::chat::{ChatClient, ChatClientError, ChatRequest};

use crate::messages::{CompletionRequest, CompletionResponse};

/// Connection settings for a chat-completions provider.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the API version segment, e.g. `http://host:1337/v1`.
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    /// Upper bound for a single completion call.
    pub timeout: Duration,
}

/// Errors from the chat-completions REST layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("provider returned {status}: {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The reply carried no choice or no message content.
    #[error("provider returned no completion text")]
    EmptyResponse,
}

impl From<LlmApiError> for ChatClientError {
    fn from(err: LlmApiError) -> Self {
        ChatClientError(err.to_string())
    }
}

/// HTTP client for a single chat-completions provider.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    /// Build a client with its own connection pool and request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, LlmApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.api_key.clone(),
        ))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request a completion and return the text of the first choice.
    pub async fn create_completion(&self, request: &ChatRequest) -> Result<String, LlmApiError> {
        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
            web_search: request.web_search,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let completion: CompletionResponse = Self::parse_response(response).await?;

        completion.into_text().ok_or(LlmApiError::EmptyResponse)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, capturing the body of
    /// failed responses.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, LlmApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, LlmApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ChatClient for ChatCompletionsClient {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatClientError> {
        self.create_completion(request).await.map_err(|e| {
            tracing::warn!(model = %request.model, error = %e, "Chat completion failed");
            ChatClientError::from(e)
        })
    }
}
