use thiserror::Error;

/// Reasons a configuration is rejected.
///
/// Construction stops at the first failed check, so exactly one of these is reported.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("bootstrap servers not set")]
    BootstrapServersNotSet,

    /// Broker link configurations are currently accepted as-is, so this is never returned.
    #[error("broker address not set in broker config")]
    BrokerAddressNotSet,

    #[error("group.id is empty")]
    EmptyGroupId,

    #[error("offsets.storage must be 0 or 1, got {0}")]
    InvalidOffsetsStorage(i32),

    #[error("fetch.max.wait.ms must be >= 0, got {0}")]
    FetchMaxWaitMs(i32),

    #[error("message.max.count must be > 0, got {0}")]
    MessageMaxCount(i32),

    #[error("flush.interval.ms must be > 0, got {0}")]
    FlushIntervalMs(i64),

    #[error("unknown compression type: {0:?}")]
    UnknownCompressionType(String),

    #[error("invalid configuration value: {0}")]
    Invalid(#[from] serde_json::Error),
}
