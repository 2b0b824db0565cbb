use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::lookup::IPIFY_URL;

#[derive(Debug, Deserialize, Clone)]
pub struct EnricherConfig {
    /// DynamoDB table receiving the enriched records
    pub table_name: String,

    /// Plain-text public IP echo endpoint
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Request timeout of the shared HTTP client, in seconds
    #[serde(default = "default_ip_lookup_timeout_secs")]
    pub ip_lookup_timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_ip_lookup_url() -> String {
    IPIFY_URL.to_string()
}

fn default_ip_lookup_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EnricherConfig {
    /// Read configuration from the process environment
    /// (`TABLE_NAME`, `IP_LOOKUP_URL`, `IP_LOOKUP_TIMEOUT_SECS`, `LOG_LEVEL`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    fn from_source(source: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn ip_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.ip_lookup_timeout_secs)
    }
}
