use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::{ConfigError, ConsumerConfig, from_entries};
use crate::protocol::api_key::ApiKey;

/// Timing policy of a single broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerLinkConfig {
    #[serde(rename = "connect.timeout.ms")]
    pub connect_timeout_ms: u64,

    #[serde(rename = "timeout.ms")]
    pub timeout_ms: u64,

    /// Timeout in milliseconds per API, indexed by [`ApiKey::index`]. Empty means `timeout.ms` everywhere.
    #[serde(rename = "timeout.ms.for.eachapi")]
    pub timeout_ms_for_each_api: Vec<u64>,

    #[serde(rename = "metadata.refresh.interval.ms")]
    pub metadata_refresh_interval_ms: u64,
}

impl Default for BrokerLinkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 60_000,
            timeout_ms: 30_000,
            timeout_ms_for_each_api: vec![],
            metadata_refresh_interval_ms: 300_000,
        }
    }
}

impl BrokerLinkConfig {
    pub fn from_map<I, K>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let config: Self = from_entries(entries)?;
        config.check_valid()?;
        Ok(config)
    }

    pub fn check_valid(&self) -> Result<(), ConfigError> {
        // Nothing is enforced yet. A missing broker address would be reported as
        // `ConfigError::BrokerAddressNotSet` once the link carries one.
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// How long a request of API `key` may take on this link.
    pub fn timeout_for(&self, key: ApiKey) -> Duration {
        super::api_timeout(&self.timeout_ms_for_each_api, key, self.timeout_ms)
    }
}

/// Link settings for connections opened on behalf of a consumer.
///
/// Both timeouts and the full per-API list are copied from the consumer. The refresh interval keeps its default.
impl From<&ConsumerConfig> for BrokerLinkConfig {
    fn from(consumer: &ConsumerConfig) -> Self {
        Self {
            connect_timeout_ms: consumer.connect_timeout_ms,
            timeout_ms: consumer.timeout_ms,
            timeout_ms_for_each_api: consumer.api_timeouts(),
            ..Default::default()
        }
    }
}
