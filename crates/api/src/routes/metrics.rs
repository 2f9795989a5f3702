use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::metrics::{METRICS_PATH, PROMETHEUS_CONTENT_TYPE};
use crate::state::AppState;

/// GET /metrics -- Prometheus scrape endpoint.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], state.metrics.render())
}

pub fn router() -> Router<AppState> {
    Router::new().route(METRICS_PATH, get(render_metrics))
}
