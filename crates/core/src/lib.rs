//! Quill domain library.
//!
//! Holds the chat message types, the [`chat::ChatClient`] port implemented by
//! transport crates, and the agent services built on top of it.

pub mod agent;
pub mod article;
pub mod chat;
pub mod error;
