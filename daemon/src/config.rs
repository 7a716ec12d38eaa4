//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use marketd_store::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use marketd_utils::{LogFormat, LogOutput};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("log output 'file' needs log.file to be set")]
    MissingLogFile,

    #[error("unsupported log output '{0}' (expected \"stdout\", \"stderr\" or \"file\")")]
    UnknownLogOutput(String),
}

/// Configuration for the daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; every field
/// has a default, so an empty file is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Attempts per CAS transaction before giving up. 0 retries forever.
    #[serde(default = "default_max_cas_attempts")]
    pub max_cas_attempts: u32,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "debug,marketd_store=trace".
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// "stdout", "stderr" or "file".
    #[serde(default = "default_log_output")]
    pub output: String,

    /// Target of the "file" output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./marketd_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_max_cas_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stderr".to_string()
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self.max_cas_attempts {
            0 => RetryPolicy::unbounded(),
            n => RetryPolicy::bounded(n),
        }
    }
}

impl LogConfig {
    pub fn output(&self) -> Result<LogOutput, ConfigError> {
        match self.output.to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => self
                .file
                .clone()
                .map(LogOutput::File)
                .ok_or(ConfigError::MissingLogFile),
            _ => Err(ConfigError::UnknownLogOutput(self.output.clone())),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            max_cas_attempts: default_max_cas_attempts(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: default_log_output(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.map_size_mb, 1024);
        assert_eq!(config.max_cas_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Human);
        assert_eq!(config.log.output().unwrap(), LogOutput::Stderr);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            data_dir = "/var/lib/marketd"
            max_cas_attempts = 5

            [log]
            format = "json"
            output = "file"
            file = "/var/log/marketd.log"
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/marketd"));
        assert_eq!(config.retry_policy(), RetryPolicy::bounded(5));
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(
            config.log.output().unwrap(),
            LogOutput::File(PathBuf::from("/var/log/marketd.log"))
        );
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn zero_attempts_means_unbounded() {
        let config = DaemonConfig::from_toml_str("max_cas_attempts = 0").unwrap();
        assert_eq!(config.retry_policy(), RetryPolicy::unbounded());
    }

    #[test]
    fn file_output_without_path_is_rejected() {
        let config = DaemonConfig::from_toml_str("[log]\noutput = \"file\"").unwrap();
        assert!(matches!(config.log.output(), Err(ConfigError::MissingLogFile)));
    }

    #[test]
    fn unknown_output_and_format_are_rejected() {
        let config = DaemonConfig::from_toml_str("[log]\noutput = \"syslog\"").unwrap();
        assert!(matches!(
            config.log.output(),
            Err(ConfigError::UnknownLogOutput(o)) if o == "syslog"
        ));
        assert!(matches!(
            DaemonConfig::from_toml_str("[log]\nformat = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_returns_read_error() {
        let result = DaemonConfig::from_toml_file(Path::new("/nonexistent/marketd.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn map_size_is_in_mebibytes() {
        let config = DaemonConfig::from_toml_str("map_size_mb = 64").unwrap();
        assert_eq!(config.map_size_bytes(), 64 * 1024 * 1024);
    }
}
