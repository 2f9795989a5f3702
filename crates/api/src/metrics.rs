//! Prometheus metrics for HTTP traffic and upstream model calls.
//!
//! Series are kept in ordered maps so the rendered exposition is stable
//! between scrapes.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use quill_core::chat::{ChatClient, ChatClientError, ChatRequest};

/// Content type of the text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Path of the scrape endpoint; never tracked itself.
pub const METRICS_PATH: &str = "/metrics";

/// `handler` label for requests that matched no route.
pub const UNMATCHED_HANDLER: &str = "none";

const HTTP_DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];
const LLM_DURATION_BUCKETS: &[f64] = &[0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0];

/// Result label for `llm_requests_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LlmOutcome {
    Success,
    Error,
}

impl LlmOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
struct Histogram {
    bounds: &'static [f64],
    /// Cumulative count per upper bound.
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Histogram {
    fn new(bounds: &'static [f64]) -> Self {
        Self {
            bounds,
            buckets: vec![0; bounds.len()],
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, value: f64) {
        for (bound, bucket) in self.bounds.iter().zip(self.buckets.iter_mut()) {
            if value <= *bound {
                *bucket += 1;
            }
        }
        self.sum += value;
        self.count += 1;
    }

    /// Append `_bucket`, `_sum` and `_count` lines. `labels` is either empty
    /// or a comma-terminated label list.
    fn render(&self, out: &mut String, name: &str, labels: &str) {
        for (bound, count) in self.bounds.iter().zip(&self.buckets) {
            let _ = writeln!(out, "{name}_bucket{{{labels}le=\"{bound}\"}} {count}");
        }
        let _ = writeln!(out, "{name}_bucket{{{labels}le=\"+Inf\"}} {}", self.count);
        let labels = match labels.trim_end_matches(',') {
            "" => String::new(),
            list => format!("{{{list}}}"),
        };
        let _ = writeln!(out, "{name}_sum{labels} {}", self.sum);
        let _ = writeln!(out, "{name}_count{labels} {}", self.count);
    }
}

/// Collapse a request method into a fixed label set; extension methods all
/// share `other`.
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        _ => "other",
    }
}

/// `(handler, method)`
type RouteKey = (String, String);

#[derive(Debug)]
struct Series {
    requests: BTreeMap<(String, String, String), u64>,
    durations: BTreeMap<RouteKey, Histogram>,
    in_progress: BTreeMap<RouteKey, i64>,
    llm_requests: BTreeMap<LlmOutcome, u64>,
    llm_durations: Histogram,
}

/// In-process metric registry shared through `AppState`.
#[derive(Debug)]
pub struct ServiceMetrics {
    series: Mutex<Series>,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        let llm_requests = [(LlmOutcome::Success, 0), (LlmOutcome::Error, 0)].into();
        Self {
            series: Mutex::new(Series {
                requests: BTreeMap::new(),
                durations: BTreeMap::new(),
                in_progress: BTreeMap::new(),
                llm_requests,
                llm_durations: Histogram::new(LLM_DURATION_BUCKETS),
            }),
        }
    }

    // Poisoning is ignored: every critical section is a plain map update.
    fn series(&self) -> MutexGuard<'_, Series> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a request as started. The returned guard decrements the
    /// in-progress gauge when dropped, including during unwinding.
    pub fn start_request(self: &Arc<Self>, handler: &str, method: &str) -> InFlightGuard {
        let key = (handler.to_string(), method_label(method).to_string());
        *self.series().in_progress.entry(key.clone()).or_default() += 1;
        InFlightGuard {
            metrics: Arc::clone(self),
            key,
        }
    }

    pub fn record_request(&self, handler: &str, method: &str, status: u16, elapsed_secs: f64) {
        let status_group = format!("{}xx", status / 100);
        let method = method_label(method);
        let mut series = self.series();
        *series
            .requests
            .entry((handler.to_string(), method.to_string(), status_group))
            .or_default() += 1;
        series
            .durations
            .entry((handler.to_string(), method.to_string()))
            .or_insert_with(|| Histogram::new(HTTP_DURATION_BUCKETS))
            .observe(elapsed_secs);
    }

    pub fn record_llm_call(&self, outcome: LlmOutcome, elapsed_secs: f64) {
        let mut series = self.series();
        *series.llm_requests.entry(outcome).or_default() += 1;
        series.llm_durations.observe(elapsed_secs);
    }

    /// Render all series in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let series = self.series();
        let mut out = String::new();

        out.push_str("# HELP http_requests_total Total number of requests by method, status and handler.\n");
        out.push_str("# TYPE http_requests_total counter\n");
        for ((handler, method, status), count) in &series.requests {
            let _ = writeln!(
                out,
                "http_requests_total{{handler=\"{}\",method=\"{}\",status=\"{}\"}} {count}",
                escape_label(handler),
                escape_label(method),
                status,
            );
        }

        out.push_str("# HELP http_request_duration_seconds Latency of HTTP requests.\n");
        out.push_str("# TYPE http_request_duration_seconds histogram\n");
        for ((handler, method), histogram) in &series.durations {
            let labels = format!(
                "handler=\"{}\",method=\"{}\",",
                escape_label(handler),
                escape_label(method)
            );
            histogram.render(&mut out, "http_request_duration_seconds", &labels);
        }

        out.push_str("# HELP http_requests_inprogress Number of HTTP requests in progress.\n");
        out.push_str("# TYPE http_requests_inprogress gauge\n");
        for ((handler, method), value) in &series.in_progress {
            let _ = writeln!(
                out,
                "http_requests_inprogress{{handler=\"{}\",method=\"{}\"}} {value}",
                escape_label(handler),
                escape_label(method),
            );
        }

        out.push_str("# HELP llm_requests_total Chat-completion calls by outcome.\n");
        out.push_str("# TYPE llm_requests_total counter\n");
        for (outcome, count) in &series.llm_requests {
            let _ = writeln!(out, "llm_requests_total{{outcome=\"{}\"}} {count}", outcome.as_str());
        }

        out.push_str("# HELP llm_request_duration_seconds Latency of chat-completion calls.\n");
        out.push_str("# TYPE llm_request_duration_seconds histogram\n");
        series
            .llm_durations
            .render(&mut out, "llm_request_duration_seconds", "");

        out
    }
}

/// Decrements `http_requests_inprogress` on drop.
pub struct InFlightGuard {
    metrics: Arc<ServiceMetrics>,
    key: RouteKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(value) = self.metrics.series().in_progress.get_mut(&self.key) {
            *value -= 1;
        }
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Axum middleware recording request count, latency and in-flight requests
/// per matched route template.
pub async fn track_http_metrics(
    State(metrics): State<Arc<ServiceMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let handler = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_HANDLER.to_owned());
    if handler == METRICS_PATH {
        return next.run(request).await;
    }
    let method = request.method().as_str().to_owned();

    let _in_flight = metrics.start_request(&handler, &method);
    let start = Instant::now();
    let response = next.run(request).await;
    metrics.record_request(
        &handler,
        &method,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// [`ChatClient`] decorator that counts and times upstream calls.
pub struct InstrumentedChatClient {
    inner: Arc<dyn ChatClient>,
    metrics: Arc<ServiceMetrics>,
}

impl InstrumentedChatClient {
    pub fn new(inner: Arc<dyn ChatClient>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl ChatClient for InstrumentedChatClient {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatClientError> {
        let start = Instant::now();
        let result = self.inner.chat_completion(request).await;
        let outcome = if result.is_ok() {
            LlmOutcome::Success
        } else {
            LlmOutcome::Error
        };
        self.metrics
            .record_llm_call(outcome, start.elapsed().as_secs_f64());
        result
    }
}
