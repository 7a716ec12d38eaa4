//! Structured logging initialisation via `tracing`.
//!
//! Two output formats are supported:
//! - [`LogFormat::Human`]: human-readable lines for development.
//! - [`LogFormat::Json`]: newline-delimited JSON for log aggregation.
//!
//! Logs go to stdout, stderr or an append-only file. The filter level can be
//! overridden at runtime via the `RUST_LOG` environment variable. When
//! `RUST_LOG` is not set, the caller-supplied `level` string is used
//! (e.g. `"info"`, `"debug,marketd_store=trace"`).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unsupported log format '{0}' (expected \"human\" or \"json\")")]
    UnknownFormat(String),

    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local development.
    #[default]
    Human,
    /// Newline-delimited JSON for production and log aggregation pipelines.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::UnknownFormat(s.to_string())),
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File(PathBuf),
}

fn open_log_file(path: &Path) -> Result<Arc<File>, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Arc::new)
        .map_err(|source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Initialise the global tracing subscriber.
///
/// Fails if a global subscriber has already been set or the log file cannot
/// be opened.
pub fn init_logging(format: LogFormat, level: &str, output: &LogOutput) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (format, output) {
        (LogFormat::Human, LogOutput::Stdout) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
            .try_init(),
        (LogFormat::Human, LogOutput::Stderr) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Human, LogOutput::File(path)) => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(open_log_file(path)?),
            )
            .try_init(),
        (LogFormat::Json, LogOutput::Stdout) => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stdout))
            .try_init(),
        (LogFormat::Json, LogOutput::Stderr) => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, LogOutput::File(path)) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(open_log_file(path)?),
            )
            .try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn format_deserializes_from_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("marketd.log");
        let err = open_log_file(&path).unwrap_err();
        assert!(matches!(err, LoggingError::File { .. }));
    }

    #[test]
    fn second_initialisation_fails() {
        let _ = init_logging(LogFormat::Human, "info", &LogOutput::Stderr);
        assert!(init_logging(LogFormat::Json, "info", &LogOutput::Stderr).is_err());
    }
}
