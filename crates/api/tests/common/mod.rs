#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use quill_api::config::ServerConfig;
use quill_api::router::build_app_router;
use quill_api::state::AppState;
use quill_core::chat::{ChatClient, ChatClientError, ChatRequest};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_ORIGIN: &str = "http://localhost:3000";
pub const TEST_MODEL: &str = "test-model";

/// Chat client replaying queued replies and recording every request.
#[derive(Default)]
pub struct StubChatClient {
    replies: Mutex<VecDeque<Result<String, ChatClientError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl StubChatClient {
    pub fn replying(reply: &str) -> Arc<Self> {
        let client = Self::default();
        client.push(Ok(reply.to_string()));
        Arc::new(client)
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        let client = Self::default();
        client.push(Err(ChatClientError(reason.to_string())));
        Arc::new(client)
    }

    /// Replies after sleeping for `delay`.
    pub fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        let client = Self {
            delay: Some(delay),
            ..Self::default()
        };
        client.push(Ok(reply.to_string()));
        Arc::new(client)
    }

    pub fn push(&self, reply: Result<String, ChatClientError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for StubChatClient {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<String, ChatClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatClientError("no stubbed reply".to_string())))
    }
}

/// Chat client that panics on every call.
pub struct PanickingChatClient;

#[async_trait]
impl ChatClient for PanickingChatClient {
    async fn chat_completion(&self, _: &ChatRequest) -> Result<String, ChatClientError> {
        panic!("provider exploded");
    }
}

/// Build a test `ServerConfig` from the given overrides.
///
/// Uses [`TEST_ORIGIN`] as the only CORS origin and [`TEST_MODEL`] as the
/// model unless overridden.
pub fn test_config_with(vars: &[(&str, &str)]) -> ServerConfig {
    let vars: Vec<(String, String)> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ServerConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| match key {
                "ALLOW_ORIGINS" => Some(format!(r#"["{TEST_ORIGIN}"]"#)),
                "DEFAULT_MODEL" => Some(TEST_MODEL.to_string()),
                "REQUEST_TIMEOUT_SECS" => Some("30".to_string()),
                _ => None,
            })
    })
    .expect("test configuration must be valid")
}

pub fn test_config() -> ServerConfig {
    test_config_with(&[])
}

/// Build the full application router with all middleware layers around the
/// given chat client.
pub fn build_test_app(client: Arc<dyn ChatClient>) -> Router {
    build_test_app_with_config(test_config(), client)
}

pub fn build_test_app_with_config(config: ServerConfig, client: Arc<dyn ChatClient>) -> Router {
    build_app_router(AppState::new(config, client))
}

pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
