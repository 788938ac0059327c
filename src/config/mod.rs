//! Client configuration.
//!
//! Every entity is a plain value with fixed defaults. Overrides come in as a flat mapping of dotted keys (for example
//! `session.timeout.ms`) to JSON values; keys an entity does not know are ignored. A configuration returned from
//! `from_map` has passed validation and is not modified afterwards.

use std::{fmt, str::FromStr, time::Duration};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::protocol::api_key::ApiKey;

mod broker;
pub use broker::*;
mod consumer;
pub use consumer::*;
mod error;
pub use error::*;
mod producer;
pub use producer::*;

/// Payload compression codec a producer may be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Snappy,
    Lz4,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Snappy => "snappy",
            Self::Lz4 => "lz4",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "snappy" => Ok(Self::Snappy),
            "lz4" => Ok(Self::Lz4),
            other => Err(ConfigError::UnknownCompressionType(other.to_owned())),
        }
    }
}

/// Deserialize `entries` on top of the defaults of `T`.
fn from_entries<T, I, K>(entries: I) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let map: Map<String, Value> = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Entry for `key` in a per-API timeout list, or `fallback_ms` if the list does not cover it.
fn api_timeout(timeouts: &[u64], key: ApiKey, fallback_ms: u64) -> Duration {
    let ms = key
        .index()
        .and_then(|idx| timeouts.get(idx).copied())
        .unwrap_or(fallback_ms);
    Duration::from_millis(ms)
}
