use std::any::Any;

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quill_core::error::CoreError;
use serde_json::json;

/// Body text for panics; the payload is logged, never returned.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Server Error";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds query rejections.
/// Implements [`IntoResponse`] to produce `{"detail": ..., "code": ...}`
/// bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `quill_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Missing or malformed query parameters.
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    msg.clone(),
                ),
                CoreError::Agent(msg) => {
                    tracing::error!(error = %msg, "Agent error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR", msg.clone())
                }
                CoreError::ArticleGeneration(msg) => {
                    tracing::error!(error = %msg, "Article generation error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "ARTICLE_GENERATION_ERROR",
                        msg.clone(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::InvalidQuery(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                rejection.body_text(),
            ),
        };

        error_response(status, code, detail)
    }
}

fn error_response(status: StatusCode, code: &str, detail: String) -> Response {
    let body = json!({
        "detail": detail,
        "code": code,
    });
    (status, axum::Json(body)).into_response()
}

/// Response for a handler that panicked, used with `CatchPanicLayer::custom`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let msg = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %msg, "Handler panicked");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_ERROR_DETAIL.to_string(),
    )
}
