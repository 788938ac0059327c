//! The Apache Kafka protocol, version 0 of the metadata and fetch APIs.
//!
//! # References
//! - <https://kafka.apache.org/protocol>
//! - <https://kafka.apache.org/documentation>
pub mod api_key;
pub mod api_version;
pub mod cursor;
pub mod error;
pub mod frame;
pub mod messages;
pub mod primitives;
pub mod record;
pub mod traits;
