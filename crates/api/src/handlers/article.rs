//! Handler for article generation.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use quill_core::article::Article;
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Characters of the summary included in the completion log line.
const SUMMARY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct GenerateArticleParams {
    pub article_name: String,
}

/// POST /api/v1/article-agent/?article_name=...
///
/// Generates an article for the given title and returns it split into a
/// summary paragraph and the remaining body.
pub async fn generate_article(
    State(state): State<AppState>,
    params: Result<Query<GenerateArticleParams>, QueryRejection>,
) -> AppResult<Json<Article>> {
    let Query(params) = params?;
    tracing::info!(title = %params.article_name, "Article request received");

    let article = state.article_agent().generate(&params.article_name).await?;

    let preview: String = article.summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    tracing::info!(
        summary = %preview,
        body_chars = article.article.chars().count(),
        "Article generated"
    );
    Ok(Json(article))
}
