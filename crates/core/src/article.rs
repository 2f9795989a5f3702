//! Article generation on top of [`Agent`].
//!
//! The model is asked for an article whose first paragraph is a standalone
//! summary. The reply is split on blank lines: the first non-empty paragraph
//! becomes the summary and the rest become the article body.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Language requested when none is configured.
pub const DEFAULT_LANGUAGE: &str = "русский";

/// Paragraph count below which a reply is logged as suspicious.
pub const DEFAULT_MIN_PARAGRAPHS: usize = 2;

/// Summaries shorter than this (in characters) are logged as suspicious.
pub const MIN_SUMMARY_CHARS: usize = 10;

const TITLE_PLACEHOLDER: &str = "{title}";
const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Matches `{placeholder}` tokens in prompt templates.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[a-zA-Z_][a-zA-Z0-9_]*\}").expect("valid regex"));

/// Paragraph separator: a line break followed by at least one blank line.
static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("valid regex"));

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Prompt template with `{title}` and `{language}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePrompt {
    template: String,
}

impl ArticlePrompt {
    pub const DEFAULT_TEMPLATE: &'static str = "Сгенерируй статью с названием: {title}. \
        Первый абзац должен быть кратким описанием - сводка, самостоятельный абзац. \
        Со следующего абзаца должна начинаться статья без контекста сводки. \
        Вначале и в конце не должно быть никаких утверждений и вопросов, помимо статьи. \
        Абзацы разделяй пустой строкой. \
        Статья должна быть написана на языке: {language}.";

    /// Build a prompt from a custom template.
    ///
    /// The template must contain `{title}`; `{language}` is optional and no
    /// other placeholders are accepted.
    pub fn new(template: impl Into<String>) -> Result<Self, CoreError> {
        let template = template.into();

        if !template.contains(TITLE_PLACEHOLDER) {
            return Err(CoreError::Validation(format!(
                "Article prompt template must contain {TITLE_PLACEHOLDER}"
            )));
        }

        let unknown: Vec<&str> = PLACEHOLDER_RE
            .find_iter(&template)
            .map(|m| m.as_str())
            .filter(|p| *p != TITLE_PLACEHOLDER && *p != LANGUAGE_PLACEHOLDER)
            .collect();
        if !unknown.is_empty() {
            return Err(CoreError::Validation(format!(
                "Article prompt template has unknown placeholders: {}",
                unknown.join(", ")
            )));
        }

        Ok(Self { template })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute `title` and `language` into the template.
    pub fn format(&self, title: &str, language: &str) -> String {
        // Language first so a title containing "{language}" is left alone.
        self.template
            .replace(LANGUAGE_PLACEHOLDER, language)
            .replace(TITLE_PLACEHOLDER, title)
    }
}

impl Default for ArticlePrompt {
    fn default() -> Self {
        Self {
            template: Self::DEFAULT_TEMPLATE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Article agent
// ---------------------------------------------------------------------------

/// Generated article returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Standalone summary (the first paragraph of the reply).
    pub summary: String,
    /// Remaining paragraphs joined with a blank line.
    pub article: String,
}

#[derive(Clone)]
pub struct ArticleAgent {
    agent: Agent,
    prompt: ArticlePrompt,
    language: String,
    min_paragraphs: usize,
}

impl ArticleAgent {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            prompt: ArticlePrompt::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            min_paragraphs: DEFAULT_MIN_PARAGRAPHS,
        }
    }

    pub fn with_prompt(mut self, prompt: ArticlePrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_min_paragraphs(mut self, min_paragraphs: usize) -> Self {
        self.min_paragraphs = min_paragraphs;
        self
    }

    pub fn prompt(&self) -> &ArticlePrompt {
        &self.prompt
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn min_paragraphs(&self) -> usize {
        self.min_paragraphs
    }

    /// Ask the model for an article titled `title` and split the reply.
    pub async fn generate(&self, title: &str) -> Result<Article, CoreError> {
        if title.trim().is_empty() {
            return Err(CoreError::Validation("Title cannot be empty".to_string()));
        }

        tracing::info!(
            title = %title,
            language = %self.language,
            model = %self.agent.config().model,
            "Generating article",
        );

        let prompt = self.prompt.format(title, &self.language);
        let response = self.agent.send_message(&prompt).await.map_err(|e| {
            tracing::error!(title = %title, error = %e, "Failed to generate article");
            CoreError::ArticleGeneration(format!("Article generation failed: {e}"))
        })?;

        let paragraphs = split_paragraphs(&response.message);
        if paragraphs.len() < self.min_paragraphs {
            tracing::warn!(
                paragraphs = paragraphs.len(),
                expected = self.min_paragraphs,
                "Not enough paragraphs in generated article",
            );
        }

        let (summary, article) = join_paragraphs(&paragraphs);
        validate_article(&summary, &article)?;

        tracing::info!(
            summary_chars = summary.chars().count(),
            article_chars = article.chars().count(),
            "Successfully generated article",
        );

        Ok(Article { summary, article })
    }
}

// ---------------------------------------------------------------------------
// Parsing and validation
// ---------------------------------------------------------------------------

/// Split a model reply into `(summary, article)`.
///
/// Paragraphs are separated by blank lines, trimmed, and empty ones dropped.
/// A single paragraph yields an empty article; an empty reply yields two
/// empty strings.
pub fn parse_article(text: &str) -> (String, String) {
    join_paragraphs(&split_paragraphs(text))
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn join_paragraphs(paragraphs: &[&str]) -> (String, String) {
    match paragraphs.split_first() {
        Some((summary, rest)) => (summary.to_string(), rest.join("\n\n")),
        None => (String::new(), String::new()),
    }
}

/// Reject empty articles; warn about summaries shorter than
/// [`MIN_SUMMARY_CHARS`].
pub fn validate_article(summary: &str, article: &str) -> Result<(), CoreError> {
    if summary.is_empty() && article.is_empty() {
        return Err(CoreError::ArticleGeneration(
            "Generated article is empty".to_string(),
        ));
    }

    let summary_chars = summary.chars().count();
    if summary_chars < MIN_SUMMARY_CHARS {
        tracing::warn!(summary_chars, "Summary is too short: {summary_chars} chars");
    }

    Ok(())
}
