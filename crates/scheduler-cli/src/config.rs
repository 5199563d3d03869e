//! Layered configuration (C10, §4.10): compiled-in defaults, then an
//! optional config file (format auto-detected from its extension), then
//! environment-variable overrides under the `SCHEDULER` prefix with `__`
//! nesting. No component downstream of this module reads a file or an
//! environment variable itself — everything is passed in at construction.

use std::path::Path;

use config::{Config as Layered, Environment, File};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "SCHEDULER";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read or parse config source: {0}")]
    Load(#[from] config::ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Every tunable named across §4 and §6.5, collected into one typed structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `sqlite:` connection string, or omitted to run against the in-memory backend.
    pub database_url: Option<String>,
    pub poll_interval_seconds: u64,
    pub worker_count: usize,
    pub stuck_threshold_minutes: i64,
    pub batch_limit: u32,
    pub queue_capacity: usize,
    pub shutdown_grace_seconds: u64,
    pub default_max_retries: u32,
    pub agent_timeout_seconds: u64,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub retry_jitter_fraction: f64,
    pub quality_threshold: f32,
    /// `"pretty"` or `"json"`.
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            poll_interval_seconds: 30,
            worker_count: 4,
            stuck_threshold_minutes: 30,
            batch_limit: 100,
            queue_capacity: 100,
            shutdown_grace_seconds: 60,
            default_max_retries: 3,
            agent_timeout_seconds: 120,
            retry_base_ms: 60_000,
            retry_max_ms: 3_600_000,
            retry_jitter_fraction: 0.2,
            quality_threshold: 0.6,
            log_format: "pretty".into(),
        }
    }
}

/// Builds the layered configuration. `path`, if given, is read with its
/// format auto-detected from the file extension (TOML/YAML/JSON); missing
/// optional file paths are not an error.
pub fn load(path: Option<&Path>) -> ConfigResult<AppConfig> {
    let defaults = Layered::try_from(&AppConfig::default())?;
    let mut builder = Layered::builder().add_source(defaults);

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    builder.build()?.try_deserialize().map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_round_trip_with_no_sources() {
        let config = load(None).unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.log_format, "pretty");
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "worker_count = 8\nlog_format = \"json\"").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.batch_limit, 100);
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        std::env::set_var("SCHEDULER_WORKER_COUNT", "16");
        let config = load(None).unwrap();
        std::env::remove_var("SCHEDULER_WORKER_COUNT");
        assert_eq!(config.worker_count, 16);
    }
}
