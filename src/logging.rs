//! Tracing subscriber setup
//!
//! Console output always; with a log directory, every record also goes to
//! `chatroom-agents.log` and errors additionally to `errors.log`. Records
//! emitted inside a participant carry its `participant` span, so per
//! participant logs are a filter away.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub const DEFAULT_FILTER: &str = "chatroom_agents=info";
pub const LOG_FILE: &str = "chatroom-agents.log";
pub const ERROR_LOG_FILE: &str = "errors.log";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),
    #[error("Logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Directory for log files; console only when unset
    pub dir: Option<PathBuf>,
    /// JSON console output
    pub json: bool,
}

/// Keeps the background file writers alive; logs are flushed on drop
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _writers: Vec<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber
pub fn init(config: &LogConfig) -> Result<LogGuard, LogError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut writers = Vec::new();

    layers.push(if config.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    });

    if let Some(dir) = &config.dir {
        std::fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let (writer, guard) = tracing_appender::non_blocking(file_appender(dir, LOG_FILE)?);
        writers.push(guard);
        layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());

        let (writer, guard) = tracing_appender::non_blocking(file_appender(dir, ERROR_LOG_FILE)?);
        writers.push(guard);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter())
        .try_init()?;

    if let Some(dir) = &config.dir {
        tracing::info!(dir = %dir.display(), "Writing logs");
    }

    Ok(LogGuard { _writers: writers })
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn file_appender(dir: &Path, name: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}
