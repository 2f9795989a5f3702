use axum::routing::post;
use axum::Router;

use crate::handlers::article;
use crate::state::AppState;

/// Article routes, accepted with and without the trailing slash.
///
/// ```text
/// POST /article-agent/?article_name=...   -> generate_article
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/article-agent/", post(article::generate_article))
        .route("/article-agent", post(article::generate_article))
}
