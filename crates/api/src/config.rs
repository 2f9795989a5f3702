use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use quill_core::agent::{AgentConfig, DEFAULT_MODEL};
use quill_core::article::{ArticlePrompt, DEFAULT_LANGUAGE, DEFAULT_MIN_PARAGRAPHS};
use quill_llm::ClientConfig;
use serde_json::{Map, Value};

use crate::logging::{LogConfig, LogFormat};

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The value could not be parsed into the expected shape.
    #[error("{key} must be {expected} (got {value:?})")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    /// The value parsed but failed a semantic check.
    #[error("{key}: {reason}")]
    Rejected { key: &'static str, reason: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against an
/// OpenAI-compatible provider on `localhost:1337`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Whole-request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    pub cors: CorsConfig,
    /// Metadata published in `/openapi.json`.
    pub api: ApiInfo,
    pub llm: LlmConfig,
    pub article: ArticleConfig,
    pub logging: LogConfig,
}

/// CORS policy. A `*` entry in any list means "anything"; with credentials
/// enabled the request's own origin/method/headers are mirrored back.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub allow_credentials: bool,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ApiInfo {
    pub title: String,
    pub description: String,
    pub version: String,
    pub summary: String,
    pub contact: Map<String, Value>,
    pub license_info: Map<String, Value>,
}

/// Upstream model provider settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Model and flags handed to every agent.
    pub agent: AgentConfig,
}

impl LlmConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArticleConfig {
    pub language: String,
    pub min_paragraphs: usize,
    pub prompt: ArticlePrompt,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default                      |
    /// |---------------------------|------------------------------|
    /// | `HOST`                    | `0.0.0.0`                    |
    /// | `PORT`                    | `8000`                       |
    /// | `REQUEST_TIMEOUT_SECS`    | `120`                        |
    /// | `ALLOW_ORIGINS`           | `["*"]` (JSON array)         |
    /// | `ALLOW_CREDENTIALS`       | `true`                       |
    /// | `ALLOW_METHODS`           | `["*"]` (JSON array)         |
    /// | `ALLOW_HEADERS`           | `["*"]` (JSON array)         |
    /// | `TITLE`                   | `Quill LLM Service`          |
    /// | `DESCRIPTION`             | short service description    |
    /// | `VERSION`                 | crate version                |
    /// | `SUMMARY`                 | short service summary        |
    /// | `CONTACT`                 | `{}` (JSON object)           |
    /// | `LICENSE_INFO`            | `{}` (JSON object)           |
    /// | `DEFAULT_MODEL`           | `gpt-4o` (blank is rejected) |
    /// | `WEB_SEARCH`              | `false`                      |
    /// | `LLM_BASE_URL`            | `http://localhost:1337/v1`   |
    /// | `LLM_API_KEY`             | unset                        |
    /// | `LLM_TIMEOUT_SECS`        | `90`                         |
    /// | `ARTICLE_LANGUAGE`        | `русский`                    |
    /// | `ARTICLE_MIN_PARAGRAPHS`  | `2`                          |
    /// | `ARTICLE_PROMPT_TEMPLATE` | built-in template            |
    /// | `APP_FILES_PATH`          | `.`                          |
    /// | `LOG_FORMAT`              | `pretty`                     |
    /// | `LOG_FILE`                | unset                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let cors = CorsConfig {
            allow_origins: env.json_list("ALLOW_ORIGINS", &["*"])?,
            allow_credentials: env.boolean("ALLOW_CREDENTIALS", true)?,
            allow_methods: env.json_list("ALLOW_METHODS", &["*"])?,
            allow_headers: env.json_list("ALLOW_HEADERS", &["*"])?,
        };
        validate_cors(&cors)?;

        let api = ApiInfo {
            title: env.string("TITLE", "Quill LLM Service"),
            description: env.string(
                "DESCRIPTION",
                "REST API for chatting with a language model and generating articles.",
            ),
            version: env.string("VERSION", env!("CARGO_PKG_VERSION")),
            summary: env.string("SUMMARY", "Simple LLM microservice"),
            contact: env.json_object("CONTACT")?,
            license_info: env.json_object("LICENSE_INFO")?,
        };

        let model = env.non_blank("DEFAULT_MODEL", DEFAULT_MODEL)?;

        let base_url = env.string("LLM_BASE_URL", "http://localhost:1337/v1");
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "LLM_BASE_URL",
                expected: "an http(s) URL",
                value: base_url,
            });
        }

        let llm = LlmConfig {
            base_url,
            api_key: env.optional("LLM_API_KEY"),
            timeout_secs: env.positive("LLM_TIMEOUT_SECS", 90)?,
            agent: AgentConfig::new(model).with_web_search(env.boolean("WEB_SEARCH", false)?),
        };

        let prompt = match env.optional("ARTICLE_PROMPT_TEMPLATE") {
            Some(template) => {
                ArticlePrompt::new(template).map_err(|e| ConfigError::Rejected {
                    key: "ARTICLE_PROMPT_TEMPLATE",
                    reason: e.to_string(),
                })?
            }
            None => ArticlePrompt::default(),
        };

        let article = ArticleConfig {
            language: env.string("ARTICLE_LANGUAGE", DEFAULT_LANGUAGE),
            min_paragraphs: env.parse(
                "ARTICLE_MIN_PARAGRAPHS",
                DEFAULT_MIN_PARAGRAPHS,
                "a non-negative integer",
            )?,
            prompt,
        };

        let logging = LogConfig {
            app_files_path: PathBuf::from(env.string("APP_FILES_PATH", ".")),
            format: env.parse("LOG_FORMAT", LogFormat::Pretty, "`pretty` or `json`")?,
            file: env.optional("LOG_FILE").map(PathBuf::from),
        };

        Ok(Self {
            host: env.string("HOST", "0.0.0.0"),
            port: env.parse("PORT", 8000, "a valid u16")?,
            request_timeout_secs: env.positive("REQUEST_TIMEOUT_SECS", 120)?,
            cors,
            api,
            llm,
            article,
            logging,
        })
    }
}

/// Typed accessors over a key lookup. Empty values count as unset, except
/// for [`Env::non_blank`] keys.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Like [`Env::string`], but a key that is set to whitespace is an error
    /// rather than a fallback to `default`.
    fn non_blank(&self, key: &'static str, default: &str) -> Result<String, ConfigError> {
        match (self.lookup)(key) {
            None => Ok(default.to_string()),
            Some(raw) if raw.trim().is_empty() => Err(ConfigError::Rejected {
                key,
                reason: "must not be blank".to_string(),
            }),
            Some(raw) => Ok(raw.trim().to_string()),
        }
    }

    fn parse<T: FromStr>(
        &self,
        key: &'static str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key,
                expected,
                value: raw,
            }),
        }
    }

    fn positive(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        let value = self.parse(key, default, "a positive integer")?;
        if value == 0 {
            return Err(ConfigError::Invalid {
                key,
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }
        Ok(value)
    }

    fn boolean(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key,
                    expected: "a boolean",
                    value: raw,
                }),
            },
        }
    }

    /// Parse a JSON array of strings, e.g. `["https://example.com"]`.
    fn json_list(&self, key: &'static str, default: &[&str]) -> Result<Vec<String>, ConfigError> {
        match self.optional(key) {
            None => Ok(default.iter().map(|s| s.to_string()).collect()),
            Some(raw) => serde_json::from_str(&raw).map_err(|_| ConfigError::Invalid {
                key,
                expected: "a JSON array of strings",
                value: raw,
            }),
        }
    }

    /// Parse a JSON object, e.g. `{"name": "Support"}`.
    fn json_object(&self, key: &'static str) -> Result<Map<String, Value>, ConfigError> {
        match self.optional(key) {
            None => Ok(Map::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|_| ConfigError::Invalid {
                key,
                expected: "a JSON object",
                value: raw,
            }),
        }
    }
}

fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigError> {
    for origin in cors.allow_origins.iter().filter(|o| o.as_str() != "*") {
        HeaderValue::from_str(origin).map_err(|e| ConfigError::Rejected {
            key: "ALLOW_ORIGINS",
            reason: format!("invalid origin '{origin}': {e}"),
        })?;
    }
    for method in cors.allow_methods.iter().filter(|m| m.as_str() != "*") {
        Method::from_bytes(method.as_bytes()).map_err(|e| ConfigError::Rejected {
            key: "ALLOW_METHODS",
            reason: format!("invalid method '{method}': {e}"),
        })?;
    }
    for header in cors.allow_headers.iter().filter(|h| h.as_str() != "*") {
        HeaderName::from_bytes(header.as_bytes()).map_err(|e| ConfigError::Rejected {
            key: "ALLOW_HEADERS",
            reason: format!("invalid header '{header}': {e}"),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.cors.allow_origins, ["*"]);
        assert!(config.cors.allow_credentials);
        assert_eq!(config.llm.agent.model, DEFAULT_MODEL);
        assert!(!config.llm.agent.web_search);
        assert_eq!(config.llm.base_url, "http://localhost:1337/v1");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.article.language, DEFAULT_LANGUAGE);
        assert_eq!(config.article.min_paragraphs, DEFAULT_MIN_PARAGRAPHS);
        assert_eq!(config.article.prompt, ArticlePrompt::default());
        assert_eq!(config.api.version, env!("CARGO_PKG_VERSION"));
        assert!(config.api.contact.is_empty());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = load(&[("PORT", ""), ("TITLE", "  ")]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.api.title, "Quill LLM Service");
    }

    #[test]
    fn blank_default_model_is_rejected() {
        for blank in ["", "  ", "\t"] {
            let err = load(&[("DEFAULT_MODEL", blank)]).unwrap_err();
            assert_matches!(err, ConfigError::Rejected { key: "DEFAULT_MODEL", .. });
            assert!(err.to_string().contains("must not be blank"), "got: {err}");
        }
    }

    #[test]
    fn default_model_is_trimmed() {
        let config = load(&[("DEFAULT_MODEL", "  gpt-4o-mini \n")]).unwrap();
        assert_eq!(config.llm.agent.model, "gpt-4o-mini");
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DEFAULT_MODEL", "env-test-model"),
            ("WEB_SEARCH", "true"),
            ("LLM_API_KEY", "secret"),
            ("LLM_TIMEOUT_SECS", "15"),
            ("ARTICLE_LANGUAGE", "English"),
            ("ARTICLE_MIN_PARAGRAPHS", "3"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.llm.agent.model, "env-test-model");
        assert!(config.llm.agent.web_search);
        assert_eq!(config.llm.api_key.as_deref(), Some("secret"));
        assert_eq!(config.llm.client_config().timeout, Duration::from_secs(15));
        assert_eq!(config.article.language, "English");
        assert_eq!(config.article.min_paragraphs, 3);
    }

    // -- JSON-valued variables --

    #[test]
    fn json_object_string_is_parsed() {
        let config = load(&[("CONTACT", r#"{"name": "Alice", "email": "test@mail.com"}"#)]).unwrap();
        assert_eq!(config.api.contact["name"], "Alice");
        assert_eq!(config.api.contact["email"], "test@mail.com");
    }

    #[test]
    fn json_list_string_is_parsed() {
        let config =
            load(&[("ALLOW_ORIGINS", r#"["https://example.com", "https://test.com"]"#)]).unwrap();
        assert_eq!(
            config.cors.allow_origins,
            ["https://example.com", "https://test.com"]
        );
    }

    #[test]
    fn broken_json_object_is_rejected() {
        let err = load(&[("CONTACT", r#"{"name": "Alice""#)]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "CONTACT", .. });
    }

    #[test]
    fn plain_string_for_object_is_rejected() {
        let err = load(&[("LICENSE_INFO", "not a json")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "LICENSE_INFO", .. });
    }

    #[test]
    fn json_array_for_object_is_rejected() {
        let err = load(&[("CONTACT", r#"["Alice"]"#)]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "CONTACT", .. });
    }

    #[test]
    fn broken_json_list_is_rejected() {
        let err = load(&[("ALLOW_ORIGINS", r#"["test", "prod""#)]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "ALLOW_ORIGINS", .. });
    }

    #[test]
    fn plain_string_for_list_is_rejected() {
        let err = load(&[("ALLOW_ORIGINS", "localhost")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "ALLOW_ORIGINS", .. });
        assert!(err.to_string().contains("JSON array"));
    }

    #[test]
    fn non_json_fields_are_untouched() {
        let config = load(&[("ALLOW_CREDENTIALS", "false"), ("TITLE", "[not json]")]).unwrap();
        assert!(!config.cors.allow_credentials);
        assert_eq!(config.api.title, "[not json]");
    }

    // -- Validation --

    #[test]
    fn invalid_port_is_rejected() {
        let err = load(&[("PORT", "70000")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "PORT", .. });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load(&[("REQUEST_TIMEOUT_SECS", "0")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "REQUEST_TIMEOUT_SECS", .. });
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        let err = load(&[("WEB_SEARCH", "maybe")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "WEB_SEARCH", .. });
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = load(&[("LLM_BASE_URL", "ftp://models")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "LLM_BASE_URL", .. });
    }

    #[test]
    fn invalid_cors_entries_are_rejected() {
        let err = load(&[("ALLOW_ORIGINS", r#"["http://bad\norigin"]"#)]).unwrap_err();
        assert_matches!(err, ConfigError::Rejected { key: "ALLOW_ORIGINS", .. });

        let err = load(&[("ALLOW_HEADERS", r#"["bad header"]"#)]).unwrap_err();
        assert_matches!(err, ConfigError::Rejected { key: "ALLOW_HEADERS", .. });
    }

    #[test]
    fn custom_prompt_template_is_validated() {
        let config = load(&[("ARTICLE_PROMPT_TEMPLATE", "Write {title} in {language}")]).unwrap();
        assert_eq!(config.article.prompt.template(), "Write {title} in {language}");

        let err = load(&[("ARTICLE_PROMPT_TEMPLATE", "Write something")]).unwrap_err();
        assert_matches!(err, ConfigError::Rejected { key: "ARTICLE_PROMPT_TEMPLATE", .. });
    }

    #[test]
    fn log_settings_are_parsed() {
        let config = load(&[
            ("APP_FILES_PATH", "/srv/quill"),
            ("LOG_FORMAT", "json"),
            ("LOG_FILE", "logs/app.log"),
        ])
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.logging.file_path(),
            Some(PathBuf::from("/srv/quill/logs/app.log"))
        );

        let err = load(&[("LOG_FORMAT", "xml")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "LOG_FORMAT", .. });
    }
}
