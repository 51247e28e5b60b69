use serde::Deserialize;

/// Environment variable naming the config file (without extension).
pub const CONFIG_PATH_ENV: &str = "FILEPIPE_CONFIG";
/// Prefix for environment overrides, e.g. `FILEPIPE__DATABASE__URL`.
pub const ENV_PREFIX: &str = "FILEPIPE";

/// Path of the layered config file. Default: "config/config".
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config".to_string())
}

/// App-level MQ configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MqAppConfig {
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_mq_url")]
    pub url: String,
    /// Upper bound for a single publish round-trip. Default: 2000.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

fn default_mq_url() -> String {
    "redis://localhost:6379".into()
}
fn default_publish_timeout_ms() -> u64 {
    2000
}

impl Default for MqAppConfig {
    fn default() -> Self {
        Self {
            url: default_mq_url(),
            publish_timeout_ms: default_publish_timeout_ms(),
        }
    }
}

/// Connection settings for the file record store.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Default: "postgres://localhost/filepipe".
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Default: 10.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Default: 1.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Default: 8.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Log every SQL statement. Default: false.
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_database_url() -> String {
    "postgres://localhost/filepipe".into()
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout_secs() -> u64 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            sqlx_logging: false,
        }
    }
}
