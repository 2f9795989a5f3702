//! Wire types for the `/chat/completions` endpoint.
//!
//! Only the fields the service reads are modelled; unknown response fields
//! are ignored.

use quill_core::chat::ChatMessage;
use serde::{Deserialize, Serialize};

/// Request body sent to `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    /// Provider extension; omitted unless enabled so strict providers accept
    /// the body.
    #[serde(skip_serializing_if = "is_false")]
    pub web_search: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Response body of a non-streaming completion.
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice, if the provider returned any.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}
