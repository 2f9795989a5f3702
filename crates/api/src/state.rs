use std::sync::Arc;

use quill_core::agent::Agent;
use quill_core::article::ArticleAgent;
use quill_core::chat::ChatClient;

use crate::config::ServerConfig;
use crate::metrics::{InstrumentedChatClient, ServiceMetrics};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Upstream model client, already wrapped for call metrics.
    pub chat_client: Arc<dyn ChatClient>,
    /// Prometheus registry rendered at `/metrics`.
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(config: ServerConfig, chat_client: Arc<dyn ChatClient>) -> Self {
        let metrics = Arc::new(ServiceMetrics::new());
        let chat_client: Arc<dyn ChatClient> = Arc::new(InstrumentedChatClient::new(
            chat_client,
            Arc::clone(&metrics),
        ));
        Self {
            config: Arc::new(config),
            chat_client,
            metrics,
        }
    }

    /// A chat agent bound to the configured model.
    pub fn agent(&self) -> Agent {
        Agent::new(self.config.llm.agent.clone(), Arc::clone(&self.chat_client))
    }

    /// An article agent using the configured prompt, language and paragraph
    /// threshold.
    pub fn article_agent(&self) -> ArticleAgent {
        let article = &self.config.article;
        ArticleAgent::new(self.agent())
            .with_prompt(article.prompt.clone())
            .with_language(article.language.clone())
            .with_min_paragraphs(article.min_paragraphs)
    }
}
