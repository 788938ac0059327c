use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ConfigError, from_entries};
use crate::protocol::api_key::ApiKey;

/// Extra time a group join gets on top of the session timeout.
const JOIN_GROUP_MARGIN_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Comma separated `host:port` list used for the first topology request.
    #[serde(rename = "bootstrap.servers")]
    pub bootstrap_servers: String,

    #[serde(rename = "client.id")]
    pub client_id: String,

    #[serde(rename = "group.id")]
    pub group_id: String,

    #[serde(rename = "retry.backoff.ms")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "metadata.max.age.ms")]
    pub metadata_max_age_ms: u64,

    #[serde(rename = "session.timeout.ms")]
    pub session_timeout_ms: u32,

    /// How long the broker may hold a fetch before answering.
    #[serde(rename = "fetch.max.wait.ms")]
    pub fetch_max_wait_ms: i32,

    #[serde(rename = "fetch.max.bytes")]
    pub fetch_max_bytes: i32,

    #[serde(rename = "fetch.min.bytes")]
    pub fetch_min_bytes: i32,

    #[serde(rename = "frombeginning")]
    pub from_beginning: bool,

    #[serde(rename = "auto.commit")]
    pub auto_commit: bool,

    #[serde(rename = "commit.after.fetch")]
    pub commit_after_fetch: bool,

    #[serde(rename = "auto.commit.interval.ms")]
    pub auto_commit_interval_ms: u64,

    /// `0` stores offsets in ZooKeeper, `1` in the brokers.
    #[serde(rename = "offsets.storage")]
    pub offsets_storage: i32,

    #[serde(rename = "connect.timeout.ms")]
    pub connect_timeout_ms: u64,

    #[serde(rename = "timeout.ms")]
    pub timeout_ms: u64,

    /// Explicit timeout in milliseconds per API, indexed by [`ApiKey::index`].
    ///
    /// `None` (or an empty list) derives every entry from the other timeouts, see [`Self::api_timeouts`].
    #[serde(rename = "timeout.ms.for.eachapi")]
    pub timeout_ms_for_each_api: Option<Vec<u64>>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: String::new(),
            client_id: String::new(),
            group_id: String::new(),
            retry_backoff_ms: 100,
            metadata_max_age_ms: 300_000,
            session_timeout_ms: 30_000,
            fetch_max_wait_ms: 100,
            fetch_max_bytes: 10 * 1024 * 1024,
            fetch_min_bytes: 1,
            from_beginning: false,
            auto_commit: true,
            commit_after_fetch: false,
            auto_commit_interval_ms: 5_000,
            offsets_storage: 1,
            connect_timeout_ms: 30_000,
            timeout_ms: 30_000,
            timeout_ms_for_each_api: None,
        }
    }
}

impl ConsumerConfig {
    /// Build a validated configuration from dotted-key overrides.
    pub fn from_map<I, K>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let config: Self = from_entries(entries)?;

        if let Some(supplied) = config.supplied_api_timeouts() {
            if supplied.len() < ApiKey::COUNT {
                warn!(
                    supplied = supplied.len(),
                    expected = ApiKey::COUNT,
                    "per-API timeout list is short, missing entries fall back to timeout.ms",
                );
            }
        }

        config.check_valid()?;
        Ok(config)
    }

    /// Per-API timeouts computed from `timeout.ms`, `session.timeout.ms` and `fetch.max.wait.ms`.
    ///
    /// Always reflects the current field values. Sums saturate at `u64::MAX`.
    pub fn derive_api_timeouts(&self) -> Vec<u64> {
        let mut timeouts = vec![self.timeout_ms; ApiKey::COUNT];
        for key in [ApiKey::JoinGroup, ApiKey::OffsetCommit, ApiKey::Fetch] {
            if let (Some(idx), Some(timeout)) = (key.index(), self.derived_override(key)) {
                timeouts[idx] = timeout;
            }
        }
        timeouts
    }

    /// The per-API timeout table in effect: the supplied list if there is one, the derived table otherwise.
    pub fn api_timeouts(&self) -> Vec<u64> {
        match self.supplied_api_timeouts() {
            Some(supplied) => supplied.to_vec(),
            None => self.derive_api_timeouts(),
        }
    }

    fn supplied_api_timeouts(&self) -> Option<&[u64]> {
        self.timeout_ms_for_each_api
            .as_deref()
            .filter(|timeouts| !timeouts.is_empty())
    }

    /// Derived timeout for the APIs that do not simply use `timeout.ms`.
    fn derived_override(&self, key: ApiKey) -> Option<u64> {
        let session = u64::from(self.session_timeout_ms);
        match key {
            ApiKey::JoinGroup => Some(session + JOIN_GROUP_MARGIN_MS),
            ApiKey::OffsetCommit => Some(session / 2),
            ApiKey::Fetch => {
                // negative waits are rejected by `check_valid`
                let fetch_wait = u64::try_from(self.fetch_max_wait_ms).unwrap_or_default();
                Some(self.timeout_ms.saturating_add(fetch_wait))
            }
            _ => None,
        }
    }

    pub fn check_valid(&self) -> Result<(), ConfigError> {
        if self.bootstrap_servers.is_empty() {
            return Err(ConfigError::BootstrapServersNotSet);
        }
        if self.group_id.is_empty() {
            return Err(ConfigError::EmptyGroupId);
        }
        if !matches!(self.offsets_storage, 0 | 1) {
            return Err(ConfigError::InvalidOffsetsStorage(self.offsets_storage));
        }
        if self.fetch_max_wait_ms < 0 {
            return Err(ConfigError::FetchMaxWaitMs(self.fetch_max_wait_ms));
        }

        debug!(
            bootstrap_servers = self.bootstrap_servers.as_str(),
            group_id = self.group_id.as_str(),
            "consumer config validated",
        );
        Ok(())
    }

    /// How long a request of API `key` may take.
    pub fn timeout_for(&self, key: ApiKey) -> Duration {
        match self.supplied_api_timeouts() {
            Some(supplied) => super::api_timeout(supplied, key, self.timeout_ms),
            None => Duration::from_millis(self.derived_override(key).unwrap_or(self.timeout_ms)),
        }
    }

    pub fn with_bootstrap_servers(mut self, servers: impl Into<String>) -> Self {
        self.bootstrap_servers = servers.into();
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn valid() -> Vec<(&'static str, Value)> {
        vec![
            ("bootstrap.servers", json!("localhost:9092")),
            ("group.id", json!("g")),
        ]
    }

    #[test]
    fn test_defaults() {
        let c = ConsumerConfig::default();
        assert_eq!(c.session_timeout_ms, 30_000);
        assert_eq!(c.retry_backoff_ms, 100);
        assert_eq!(c.metadata_max_age_ms, 300_000);
        assert_eq!(c.fetch_max_wait_ms, 100);
        assert_eq!(c.fetch_max_bytes, 10 * 1024 * 1024);
        assert_eq!(c.fetch_min_bytes, 1);
        assert!(!c.from_beginning);
        assert!(c.auto_commit);
        assert!(!c.commit_after_fetch);
        assert_eq!(c.auto_commit_interval_ms, 5_000);
        assert_eq!(c.offsets_storage, 1);
        assert_eq!(c.connect_timeout_ms, 30_000);
        assert_eq!(c.timeout_ms, 30_000);
    }

    #[test]
    fn test_default_api_timeouts() {
        let c = ConsumerConfig::default();
        assert_eq!(c.timeout_ms_for_each_api, None);
        assert_eq!(c.api_timeouts().len(), 38);

        for (idx, timeout) in c.api_timeouts().iter().enumerate() {
            let expected = match idx {
                11 => 35_000,
                8 => 15_000,
                1 => 30_100,
                _ => 30_000,
            };
            assert_eq!(*timeout, expected, "api index {idx}");
        }
    }

    #[test]
    fn test_from_map_derives_from_overrides() {
        let mut entries = valid();
        entries.push(("session.timeout.ms", json!(10_000)));
        entries.push(("fetch.max.wait.ms", json!(500)));
        entries.push(("timeout.ms", json!(1_000)));

        let c = ConsumerConfig::from_map(entries).unwrap();
        assert_eq!(c.timeout_for(ApiKey::JoinGroup), Duration::from_millis(15_000));
        assert_eq!(c.timeout_for(ApiKey::OffsetCommit), Duration::from_millis(5_000));
        assert_eq!(c.timeout_for(ApiKey::Fetch), Duration::from_millis(1_500));
        assert_eq!(c.timeout_for(ApiKey::Metadata), Duration::from_millis(1_000));
    }

    #[test]
    fn test_from_map_keeps_supplied_timeouts() {
        let mut entries = valid();
        entries.push(("timeout.ms.for.eachapi", json!([1, 2, 3])));

        let c = ConsumerConfig::from_map(entries).unwrap();
        assert_eq!(c.timeout_ms_for_each_api, Some(vec![1, 2, 3]));
        assert_eq!(c.api_timeouts(), vec![1, 2, 3]);
        assert_eq!(c.timeout_for(ApiKey::Fetch), Duration::from_millis(2));
        assert_eq!(c.timeout_for(ApiKey::JoinGroup), Duration::from_millis(30_000));
    }

    #[test]
    fn test_struct_update_rederives_timeouts() {
        let c = ConsumerConfig {
            session_timeout_ms: 10_000,
            timeout_ms: 1_000,
            ..Default::default()
        };
        assert_eq!(c.timeout_for(ApiKey::JoinGroup), Duration::from_millis(15_000));
        assert_eq!(c.timeout_for(ApiKey::OffsetCommit), Duration::from_millis(5_000));
        assert_eq!(c.timeout_for(ApiKey::Fetch), Duration::from_millis(1_100));
        assert_eq!(c.timeout_for(ApiKey::Metadata), Duration::from_millis(1_000));

        let fetch = ApiKey::Fetch.index().unwrap();
        assert_eq!(c.api_timeouts()[fetch], 1_100);
    }

    #[test]
    fn test_empty_supplied_list_derives() {
        let mut entries = valid();
        entries.push(("timeout.ms.for.eachapi", json!([])));

        let c = ConsumerConfig::from_map(entries).unwrap();
        assert_eq!(c.api_timeouts(), c.derive_api_timeouts());
        assert_eq!(c.timeout_for(ApiKey::JoinGroup), Duration::from_millis(35_000));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let mut entries = valid();
        entries.push(("timeout.ms", json!(u64::MAX)));

        let c = ConsumerConfig::from_map(entries).unwrap();
        assert_eq!(c.timeout_for(ApiKey::Fetch), Duration::from_millis(u64::MAX));
        assert_eq!(c.timeout_for(ApiKey::Metadata), Duration::from_millis(u64::MAX));
        assert_eq!(c.api_timeouts()[ApiKey::Fetch.index().unwrap()], u64::MAX);
    }

    #[test]
    fn test_negative_fetch_wait_rejected() {
        let mut entries = valid();
        entries.push(("fetch.max.wait.ms", json!(-1)));
        assert_matches!(
            ConsumerConfig::from_map(entries),
            Err(ConfigError::FetchMaxWaitMs(-1))
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut entries = valid();
        entries.push(("no.such.key", json!(true)));
        let c = ConsumerConfig::from_map(entries).unwrap();
        assert_eq!(c.group_id, "g");
    }

    #[test]
    fn test_validation_order() {
        assert_matches!(
            ConsumerConfig::from_map(Vec::<(String, Value)>::new()),
            Err(ConfigError::BootstrapServersNotSet)
        );
        assert_matches!(
            ConsumerConfig::from_map([("bootstrap.servers", json!("b:9092"))]),
            Err(ConfigError::EmptyGroupId)
        );

        let mut entries = valid();
        entries.push(("offsets.storage", json!(2)));
        assert_matches!(
            ConsumerConfig::from_map(entries),
            Err(ConfigError::InvalidOffsetsStorage(2))
        );

        let mut entries = valid();
        entries.push(("offsets.storage", json!(0)));
        assert!(ConsumerConfig::from_map(entries).is_ok());
    }

    #[test]
    fn test_wrong_value_type() {
        let mut entries = valid();
        entries.push(("session.timeout.ms", json!("soon")));
        assert_matches!(ConsumerConfig::from_map(entries), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn test_builder() {
        let c = ConsumerConfig::default()
            .with_bootstrap_servers("a:1,b:2")
            .with_group_id("group");
        assert!(c.check_valid().is_ok());
    }
}
