//! marketd: administrative entry point over the training model stores.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use marketd_store::AtomicStore;
use marketd_store_lmdb::LmdbEnvironment;
use marketd_training::TrainingStorage;
use marketd_utils::{init_logging, LogFormat};

use crate::commands::Command;
use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "marketd", about = "Training model storage for the marketplace daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "MARKETD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "MARKETD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "MARKETD_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Attempts per CAS transaction; 0 retries until committed.
    #[arg(long, env = "MARKETD_MAX_CAS_ATTEMPTS")]
    max_cas_attempts: Option<u32>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MARKETD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MARKETD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log output: "stdout", "stderr" or "file".
    #[arg(long, env = "MARKETD_LOG_OUTPUT")]
    log_output: Option<String>,

    /// Log file, used with `--log-output file`.
    #[arg(long, env = "MARKETD_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(DaemonConfig, Command)> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(map_size_mb) = self.map_size_mb {
            config.map_size_mb = map_size_mb;
        }
        if let Some(attempts) = self.max_cas_attempts {
            config.max_cas_attempts = attempts;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
        if let Some(output) = self.log_output {
            config.log.output = output;
        }
        if let Some(file) = self.log_file {
            config.log.file = Some(file);
        }
        Ok((config, self.command))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();
    let (config, command) = cli.into_config()?;

    init_logging(config.log.format, &config.log.level, &config.log.output()?)?;
    if let Some(path) = config_path {
        tracing::info!(path = %path.display(), "loaded config");
    }

    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    let store: Arc<dyn AtomicStore> = Arc::new(env.atomic_store());
    let storage = TrainingStorage::new(store, config.retry_policy());

    let output = commands::run(&storage, &command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
