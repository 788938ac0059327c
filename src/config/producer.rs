use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Compression, ConfigError, from_entries};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    #[serde(rename = "bootstrap.servers")]
    pub bootstrap_servers: String,

    #[serde(rename = "client.id")]
    pub client_id: String,

    #[serde(rename = "acks")]
    pub acks: i16,

    /// One of `none`, `gzip`, `snappy` or `lz4`.
    #[serde(rename = "compress.type")]
    pub compression_type: String,

    #[serde(rename = "batch.size")]
    pub batch_size: i32,

    #[serde(rename = "message.max.count")]
    pub message_max_count: i32,

    #[serde(rename = "flush.interval.ms")]
    pub flush_interval_ms: i64,

    #[serde(rename = "metadata.max.age.ms")]
    pub metadata_max_age_ms: u64,

    #[serde(rename = "fetch.topic.metadata.retrys")]
    pub fetch_topic_metadata_retries: u32,

    #[serde(rename = "connections.max.idle.ms")]
    pub connections_max_idle_ms: u64,

    #[serde(rename = "retries")]
    pub retries: u32,

    #[serde(rename = "request.timeout.ms")]
    pub request_timeout_ms: u32,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: String::new(),
            client_id: "franz".to_owned(),
            acks: 1,
            compression_type: Compression::None.as_str().to_owned(),
            batch_size: 16384,
            message_max_count: 1024,
            flush_interval_ms: 200,
            metadata_max_age_ms: 300_000,
            fetch_topic_metadata_retries: 3,
            connections_max_idle_ms: 540_000,
            retries: 0,
            request_timeout_ms: 30_000,
        }
    }
}

impl ProducerConfig {
    /// Build a validated configuration from dotted-key overrides.
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
        if self.bootstrap_servers.is_empty() {
            return Err(ConfigError::BootstrapServersNotSet);
        }
        if self.message_max_count <= 0 {
            return Err(ConfigError::MessageMaxCount(self.message_max_count));
        }
        if self.flush_interval_ms <= 0 {
            return Err(ConfigError::FlushIntervalMs(self.flush_interval_ms));
        }
        let compression = self.compression()?;

        debug!(
            bootstrap_servers = self.bootstrap_servers.as_str(),
            %compression,
            "producer config validated",
        );
        Ok(())
    }

    /// The configured codec.
    pub fn compression(&self) -> Result<Compression, ConfigError> {
        self.compression_type.parse()
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.unsigned_abs())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.request_timeout_ms))
    }
}
