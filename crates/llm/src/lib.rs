//! OpenAI-compatible chat-completions client.
//!
//! Implements [`quill_core::chat::ChatClient`] on top of [`reqwest`] so the
//! agent services can talk to any provider exposing `/chat/completions`.

pub mod client;
pub mod messages;

pub use client::{ChatCompletionsClient, ClientConfig, LlmApiError};
