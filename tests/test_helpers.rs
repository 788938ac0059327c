use parking_lot::Once;

use franz::protocol::{
    messages::{
        FetchResponse, FetchResponsePartition, FetchResponseTopic, MetadataResponse,
        MetadataResponseBroker, MetadataResponsePartition, MetadataResponseTopic,
    },
    primitives::{Array, Int8, Int32, Int64, NullableBytes, String_, UInt32},
    record::Message,
};

static LOG_SETUP: Once = Once::new();

/// Enables debug logging if the `RUST_LOG` environment variable is
/// set. Does nothing if `RUST_LOG` is not set.
pub fn maybe_start_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        start_logging()
    }
}

/// Start logging.
pub fn start_logging() {
    use tracing_log::LogTracer;
    use tracing_subscriber::{FmtSubscriber, filter::EnvFilter};

    LOG_SETUP.call_once(|| {
        LogTracer::init().unwrap();

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

#[allow(dead_code)]
pub fn broker(node_id: i32, host: &str, port: i32) -> MetadataResponseBroker {
    MetadataResponseBroker {
        node_id: Int32(node_id),
        host: String_(host.to_owned()),
        port: Int32(port),
    }
}

#[allow(dead_code)]
pub fn partition(
    index: i32,
    leader: i32,
    error: Option<franz::ProtocolError>,
) -> MetadataResponsePartition {
    MetadataResponsePartition {
        error,
        partition_index: Int32(index),
        leader_id: Int32(leader),
        replica_nodes: Array(vec![Int32(1), Int32(2), Int32(3)]),
        isr_nodes: Array(vec![Int32(1), Int32(2)]),
    }
}

#[allow(dead_code)]
pub fn topic(
    name: &str,
    error: Option<franz::ProtocolError>,
    partitions: Vec<MetadataResponsePartition>,
) -> MetadataResponseTopic {
    MetadataResponseTopic {
        error,
        name: String_(name.to_owned()),
        partitions,
    }
}

#[allow(dead_code)]
pub fn metadata_response(
    brokers: Vec<MetadataResponseBroker>,
    topics: Vec<MetadataResponseTopic>,
) -> MetadataResponse {
    MetadataResponse {
        correlation_id: UInt32(1),
        brokers,
        topics,
    }
}

#[allow(dead_code)]
pub fn message(offset: i64, key: Option<&[u8]>, value: Option<&[u8]>) -> Message {
    Message {
        offset: Int64(offset),
        message_size: Int32(0),
        crc: UInt32(0),
        magic_byte: Int8(0),
        attributes: Int8(0),
        key: NullableBytes(key.map(<[u8]>::to_vec)),
        value: NullableBytes(value.map(<[u8]>::to_vec)),
    }
}

#[allow(dead_code)]
pub fn fetch_response(topic: &str, partitions: Vec<(i32, Vec<Message>)>) -> FetchResponse {
    FetchResponse {
        responses: vec![FetchResponseTopic {
            topic: String_(topic.to_owned()),
            partitions: partitions
                .into_iter()
                .map(|(index, messages)| FetchResponsePartition {
                    partition_index: Int32(index),
                    error: None,
                    high_watermark: Int64(messages.len() as i64),
                    messages,
                })
                .collect(),
        }],
    }
}
