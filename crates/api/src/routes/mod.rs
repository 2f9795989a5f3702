pub mod agent;
pub mod article;
pub mod health;
pub mod metrics;
pub mod openapi;

use axum::Router;

use crate::state::AppState;

/// Version prefixes under which the agent routes are mounted, besides the
/// unversioned `/api` root.
pub const VERSION_PREFIXES: [&str; 2] = ["/v1", "/latest"];

/// Agent routes shared by every version prefix.
pub fn versioned_routes() -> Router<AppState> {
    Router::new()
        .merge(agent::router())
        .merge(article::router())
}

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                          GET   liveness
///
/// /v1/agent/                       POST  chat with the model
/// /v1/article-agent/               POST  generate an article
///
/// /latest/...                      same as /v1
/// /agent/, /article-agent/         same as /v1
/// ```
pub fn api_routes() -> Router<AppState> {
    VERSION_PREFIXES.iter().fold(
        Router::new()
            .merge(health::router())
            .merge(versioned_routes()),
        |router, prefix| router.nest(prefix, versioned_routes()),
    )
}
