use axum::routing::post;
use axum::Router;

use crate::handlers::agent;
use crate::state::AppState;

/// Agent routes, accepted with and without the trailing slash.
///
/// ```text
/// POST /agent/?message=...   -> send_message
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/agent/", post(agent::send_message))
        .route("/agent", post(agent::send_message))
}
