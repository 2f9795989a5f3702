//! Tracing subscriber setup.
//!
//! Console output is always enabled. When `LOG_FILE` is set, events are also
//! appended to that file; relative paths are resolved under `APP_FILES_PATH`.
//! File output is single-line and never carries ANSI escapes.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "quill_api=info,quill_core=info,quill_llm=info,tower_http=info";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable records on the console.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Optional log file, absolute or relative to `app_files_path`.
    pub file: Option<PathBuf>,
    pub app_files_path: PathBuf,
}

impl LogConfig {
    /// Resolved location of the log file, if file logging is enabled.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .map(|file| resolve_log_path(&self.app_files_path, file))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Anchor a relative log path under the application files directory.
pub fn resolve_log_path(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}

/// Open `path` for appending, creating missing parent directories.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Assemble the subscriber for `config` without installing it.
///
/// Fails if the log file cannot be opened.
pub fn build_subscriber(
    config: &LogConfig,
    filter: EnvFilter,
) -> Result<impl Subscriber + Send + Sync + 'static, LoggingError> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    });

    if let Some(path) = config.file_path() {
        let file = open_log_file(&path).map_err(|source| LoggingError::File {
            path: path.clone(),
            source,
        })?;
        let writer = Mutex::new(file);
        layers.push(match config.format {
            LogFormat::Pretty => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        });
    }

    Ok(tracing_subscriber::registry().with(layers).with(filter))
}

/// Install the global tracing subscriber.
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    build_subscriber(config, filter)?.try_init()?;

    if let Some(path) = config.file_path() {
        tracing::info!(path = %path.display(), "File logging enabled");
    }
    Ok(())
}
