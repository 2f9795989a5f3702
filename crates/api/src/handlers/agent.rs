//! Handler for the chat agent endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use quill_core::agent::AgentResponse;
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageParams {
    pub message: String,
}

/// POST /api/v1/agent/?message=...
///
/// Forwards the message to the configured model and returns its reply.
pub async fn send_message(
    State(state): State<AppState>,
    params: Result<Query<SendMessageParams>, QueryRejection>,
) -> AppResult<Json<AgentResponse>> {
    let Query(params) = params?;
    tracing::info!(chars = params.message.chars().count(), "Agent request received");

    let response = state.agent().send_message(&params.message).await?;

    tracing::info!(chars = response.message.chars().count(), "Agent reply sent");
    Ok(Json(response))
}
