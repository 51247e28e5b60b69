use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{DatabaseConfig, MqAppConfig};

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Maximum number of files processed at the same time. Default: 4.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Deflate level, 0-9. Default: 9.
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
    /// Age after which an unfinished file is reported. Default: 600.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// How often to look for stale files; 0 disables the scan. Default: 60.
    #[serde(default = "default_stale_scan_interval_secs")]
    pub stale_scan_interval_secs: u64,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_concurrency() -> usize {
    4
}
fn default_compression_level() -> i64 {
    9
}
fn default_stale_after_secs() -> u64 {
    600
}
fn default_stale_scan_interval_secs() -> u64 {
    60
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            concurrency: default_concurrency(),
            compression_level: default_compression_level(),
            stale_after_secs: default_stale_after_secs(),
            stale_scan_interval_secs: default_stale_scan_interval_secs(),
        }
    }
}

impl WorkerConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// `None` when the stale file monitor is disabled.
    pub fn stale_scan_interval(&self) -> Option<Duration> {
        (self.stale_scan_interval_secs > 0)
            .then(|| Duration::from_secs(self.stale_scan_interval_secs))
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = common::config::config_path();

        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.concurrency", 4_i64)?
            .set_default("worker.compression_level", 9_i64)?
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("database.url", "postgres://localhost/filepipe")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix(common::config::ENV_PREFIX).separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
