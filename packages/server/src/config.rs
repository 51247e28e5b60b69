use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{DatabaseConfig, MqAppConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Largest accepted upload in bytes. Default: 50 MiB.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

fn default_max_size_bytes() -> u64 {
    50 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerAppConfig {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl ServerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("database.url", "postgres://localhost/filepipe")?
            .add_source(File::with_name(&common::config::config_path()).required(false))
            // e.g. FILEPIPE__UPLOAD__MAX_SIZE_BYTES
            .add_source(Environment::with_prefix(common::config::ENV_PREFIX).separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
