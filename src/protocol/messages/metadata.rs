use std::io::Write;

use tracing::{debug, warn};

use super::{DecodeError, RequestBody};
use crate::protocol::{
    api_key::ApiKey,
    api_version::ApiVersion,
    cursor::ByteCursor,
    error::Error as ApiError,
    primitives::*,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

#[derive(Debug, Default)]
pub struct MetadataRequest {
    /// The topics to fetch metadata for
    ///
    /// Requests data for all topics if empty.
    pub topics: Vec<String_>,
}

impl RequestBody for MetadataRequest {
    type ResponseBody = MetadataResponse;

    const API_KEY: ApiKey = ApiKey::Metadata;

    const API_VERSION: ApiVersion = ApiVersion::V0;
}

impl<W> WriteType<W> for MetadataRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        write_array(writer, &self.topics)
    }
}

/// Decoded topology response.
///
/// Every decode produces a fresh value; nothing is shared with earlier responses.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MetadataResponse {
    /// The correlation ID of the request this response answers.
    pub correlation_id: UInt32,

    /// Each broker in the response, in wire order.
    pub brokers: Vec<MetadataResponseBroker>,

    /// Each topic in the response, sorted by name.
    pub topics: Vec<MetadataResponseTopic>,
}

impl MetadataResponse {
    /// Decode a complete response frame, including its leading length field.
    ///
    /// A length field that disagrees with the buffer size fails the whole decode. Otherwise the full snapshot is
    /// always returned, next to the first non-benign error code found in topic or partition entries (in wire order).
    /// [`ApiError::LeaderNotAvailable`] is expected during leader elections and never reported here.
    ///
    /// Topics come back sorted by name and the partitions of each topic by partition ID, whatever the wire order.
    pub fn decode(payload: &[u8]) -> Result<(Self, Option<ApiError>), DecodeError> {
        let mut cursor = ByteCursor::new(payload);

        let declared = UInt32::read(&mut cursor)?.0;
        if u64::from(declared) + 4 != payload.len() as u64 {
            return Err(DecodeError::FrameLengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        let mut response = Self::read(&mut cursor)?;
        if !cursor.is_exhausted() {
            debug!(
                trailing = cursor.remaining(),
                "ignoring trailing bytes in metadata response"
            );
        }

        let error = response.first_error();
        response.sort();

        debug!(
            correlation_id = response.correlation_id.0,
            brokers = response.brokers.len(),
            topics = response.topics.len(),
            ?error,
            "decoded metadata response",
        );

        Ok((response, error))
    }

    /// Encode as a complete frame that [`decode`](Self::decode) accepts.
    pub fn encode(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = vec![0u8; 4];
        self.write(&mut buf)?;

        let len = u32::try_from(buf.len() - 4)?;
        buf[..4].copy_from_slice(&len.to_be_bytes());

        Ok(buf)
    }

    /// Topic by name.
    pub fn topic(&self, name: &str) -> Option<&MetadataResponseTopic> {
        self.topics
            .binary_search_by(|t| t.name.0.as_str().cmp(name))
            .ok()
            .map(|idx| &self.topics[idx])
    }

    /// First non-benign error in decode order: topic code first, then the codes of its partitions.
    fn first_error(&self) -> Option<ApiError> {
        let codes = self.topics.iter().flat_map(|t| {
            std::iter::once((t, None, t.error))
                .chain(t.partitions.iter().map(move |p| (t, Some(p), p.error)))
        });

        for (topic, partition, error) in codes {
            let Some(error) = error else {
                continue;
            };

            let partition = partition.map(|p| p.partition_index.0);
            if error.is_benign() {
                debug!(
                    topic = topic.name.0.as_str(),
                    partition,
                    %error,
                    "ignoring benign metadata error",
                );
                continue;
            }

            warn!(
                topic = topic.name.0.as_str(),
                partition,
                %error,
                "metadata response reports an error",
            );
            return Some(error);
        }

        None
    }

    pub(crate) fn sort(&mut self) {
        self.topics.sort_by(|a, b| a.name.cmp(&b.name));
        for topic in &mut self.topics {
            topic.partitions.sort_by_key(|p| p.partition_index);
        }
    }
}

impl ReadType for MetadataResponse {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            correlation_id: UInt32::read(cursor)?,
            brokers: Array::read(cursor)?.0,
            topics: Array::read(cursor)?.0,
        })
    }
}

impl<W> WriteType<W> for MetadataResponse
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.correlation_id.write(writer)?;
        write_array(writer, &self.brokers)?;
        write_array(writer, &self.topics)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MetadataResponseBroker {
    /// The broker ID
    pub node_id: Int32,
    /// The broker hostname
    pub host: String_,
    /// The broker port
    pub port: Int32,
}

impl WireSize for MetadataResponseBroker {
    const MIN_SIZE: usize = 4 + 2 + 4;
}

impl ReadType for MetadataResponseBroker {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            node_id: Int32::read(cursor)?,
            host: String_::read(cursor)?,
            port: Int32::read(cursor)?,
        })
    }
}

impl<W> WriteType<W> for MetadataResponseBroker
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.node_id.write(writer)?;
        self.host.write(writer)?;
        self.port.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MetadataResponseTopic {
    /// The topic error, or `None` if there was no error
    pub error: Option<ApiError>,
    /// The topic name
    pub name: String_,
    /// Each partition in the topic, sorted by partition index
    pub partitions: Vec<MetadataResponsePartition>,
}

impl MetadataResponseTopic {
    /// Partition by index.
    pub fn partition(&self, partition_index: i32) -> Option<&MetadataResponsePartition> {
        self.partitions
            .binary_search_by_key(&partition_index, |p| p.partition_index.0)
            .ok()
            .map(|idx| &self.partitions[idx])
    }
}

impl WireSize for MetadataResponseTopic {
    const MIN_SIZE: usize = 2 + 2 + 4;
}

impl ReadType for MetadataResponseTopic {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            error: ApiError::new(Int16::read(cursor)?.0),
            name: String_::read(cursor)?,
            partitions: Array::read(cursor)?.0,
        })
    }
}

impl<W> WriteType<W> for MetadataResponseTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Int16(self.error.map_or(0, |e| e.code())).write(writer)?;
        self.name.write(writer)?;
        write_array(writer, &self.partitions)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MetadataResponsePartition {
    /// The partition error, or `None` if there was no error
    pub error: Option<ApiError>,
    /// The partition index
    pub partition_index: Int32,
    /// The ID of the leader broker, `-1` while a leader election is in progress
    pub leader_id: Int32,
    /// The set of all nodes that host this partition
    pub replica_nodes: Array<Int32>,
    /// The set of all nodes that are in sync with the leader for this partition
    pub isr_nodes: Array<Int32>,
}

impl MetadataResponsePartition {
    /// Leader ID, or `None` while a leader election is in progress.
    pub fn leader(&self) -> Option<i32> {
        (self.leader_id != super::NO_LEADER).then_some(self.leader_id.0)
    }
}

impl WireSize for MetadataResponsePartition {
    const MIN_SIZE: usize = 2 + 4 + 4 + 4 + 4;
}

impl ReadType for MetadataResponsePartition {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            error: ApiError::new(Int16::read(cursor)?.0),
            partition_index: Int32::read(cursor)?,
            leader_id: Int32::read(cursor)?,
            replica_nodes: Array::read(cursor)?,
            isr_nodes: Array::read(cursor)?,
        })
    }
}

impl<W> WriteType<W> for MetadataResponsePartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Int16(self.error.map_or(0, |e| e.code())).write(writer)?;
        self.partition_index.write(writer)?;
        self.leader_id.write(writer)?;
        self.replica_nodes.write(writer)?;
        self.isr_nodes.write(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;

    fn partition(index: i32, leader: i32, error: Option<ApiError>) -> MetadataResponsePartition {
        MetadataResponsePartition {
            error,
            partition_index: Int32(index),
            leader_id: Int32(leader),
            replica_nodes: Array(vec![Int32(1), Int32(2), Int32(3)]),
            isr_nodes: Array(vec![Int32(1), Int32(2)]),
        }
    }

    fn topic(name: &str, partitions: Vec<MetadataResponsePartition>) -> MetadataResponseTopic {
        MetadataResponseTopic {
            error: None,
            name: String_(name.to_owned()),
            partitions,
        }
    }

    fn response(topics: Vec<MetadataResponseTopic>) -> MetadataResponse {
        MetadataResponse {
            correlation_id: UInt32(42),
            brokers: vec![
                MetadataResponseBroker {
                    node_id: Int32(2),
                    host: String_("kafka-2".to_owned()),
                    port: Int32(9092),
                },
                MetadataResponseBroker {
                    node_id: Int32(1),
                    host: String_("kafka-1".to_owned()),
                    port: Int32(9093),
                },
            ],
            topics,
        }
    }

    #[test]
    fn test_decode_wire_layout() {
        #[rustfmt::skip]
        let data = [
            // length
            0x00, 0x00, 0x00, 0x36,
            // correlation id
            0x00, 0x00, 0x00, 0x07,
            // brokers
            0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x05, 0x00, 0x01, b'h', 0x00, 0x00, 0x23, 0x84,
            // topics
            0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x01, b't',
            // partitions
            0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x05,
            // replicas
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05,
            // isr
            0x00, 0x00, 0x00, 0x00,
        ];

        let (response, error) = MetadataResponse::decode(&data).unwrap();
        assert_eq!(error, None);
        assert_eq!(response.correlation_id, UInt32(7));
        assert_eq!(
            response.brokers,
            vec![MetadataResponseBroker {
                node_id: Int32(5),
                host: String_("h".to_owned()),
                port: Int32(9092),
            }]
        );
        assert_eq!(response.topics.len(), 1);
        let t = &response.topics[0];
        assert_eq!(t.name.0, "t");
        assert_eq!(t.partitions.len(), 1);
        let p = &t.partitions[0];
        assert_eq!(p.partition_index, Int32(3));
        assert_eq!(p.leader(), Some(5));
        assert_eq!(p.replica_nodes, Array(vec![Int32(5)]));
        assert_eq!(p.isr_nodes, Array(vec![]));
    }

    #[test]
    fn test_frame_length_mismatch() {
        let mut data = response(vec![]).encode().unwrap();
        data.push(0);

        let err = MetadataResponse::decode(&data).unwrap_err();
        assert_matches!(
            err,
            DecodeError::FrameLengthMismatch { declared, actual } if declared as usize + 5 == actual
        );

        data.truncate(data.len() - 2);
        assert_matches!(
            MetadataResponse::decode(&data),
            Err(DecodeError::FrameLengthMismatch { .. })
        );
    }

    #[test]
    fn test_too_short_for_length() {
        assert_matches!(
            MetadataResponse::decode(&[0, 0]),
            Err(DecodeError::ReadError(ReadError::OutOfRange { .. }))
        );
    }

    #[test]
    fn test_length_matches_but_body_truncated() {
        // declares 8 bytes of body, but brokers array claims one entry that is not there
        let data = [0, 0, 0, 8, 0, 0, 0, 1, 0, 0, 0, 1];
        assert_matches!(
            MetadataResponse::decode(&data),
            Err(DecodeError::ReadError(ReadError::OutOfRange { offset: 12, .. }))
        );
    }

    #[test]
    fn test_sorting() {
        let data = response(vec![
            topic("zebra", vec![partition(1, 1, None), partition(0, 2, None)]),
            topic(
                "orders",
                vec![
                    partition(2, 1, None),
                    partition(0, 1, None),
                    partition(1, 2, None),
                ],
            ),
            topic("apples", vec![]),
        ])
        .encode()
        .unwrap();

        let (response, error) = MetadataResponse::decode(&data).unwrap();
        assert_eq!(error, None);

        let names: Vec<_> = response.topics.iter().map(|t| t.name.0.as_str()).collect();
        assert_eq!(names, vec!["apples", "orders", "zebra"]);

        let orders = response.topic("orders").unwrap();
        let ids: Vec<_> = orders.partitions.iter().map(|p| p.partition_index.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(orders.partition(1).unwrap().leader_id, Int32(2));
        assert!(orders.partition(3).is_none());

        // broker order is kept as-is
        let brokers: Vec<_> = response.brokers.iter().map(|b| b.node_id.0).collect();
        assert_eq!(brokers, vec![2, 1]);
    }

    #[test]
    fn test_leader_election_is_not_an_error() {
        let data = response(vec![topic(
            "orders",
            vec![
                partition(2, 1, None),
                partition(0, 1, None),
                partition(1, -1, Some(ApiError::LeaderNotAvailable)),
            ],
        )])
        .encode()
        .unwrap();

        let (response, error) = MetadataResponse::decode(&data).unwrap();
        assert_eq!(error, None);

        let p1 = response.topic("orders").unwrap().partition(1).unwrap();
        assert_eq!(p1.leader_id, Int32(-1));
        assert_eq!(p1.leader(), None);
        assert_eq!(p1.error, Some(ApiError::LeaderNotAvailable));
    }

    #[test]
    fn test_first_non_benign_error_wins() {
        let data = response(vec![
            topic(
                "b",
                vec![
                    partition(0, -1, Some(ApiError::LeaderNotAvailable)),
                    partition(1, 1, Some(ApiError::ReplicaNotAvailable)),
                ],
            ),
            MetadataResponseTopic {
                error: Some(ApiError::UnknownTopicOrPartition),
                ..topic("a", vec![])
            },
        ])
        .encode()
        .unwrap();

        let (response, error) = MetadataResponse::decode(&data).unwrap();

        // "b" comes first on the wire even though it sorts last
        assert_eq!(error, Some(ApiError::ReplicaNotAvailable));

        // snapshot is complete despite the error
        assert_eq!(response.topics.len(), 2);
        assert_eq!(response.topics[0].error, Some(ApiError::UnknownTopicOrPartition));
        assert_eq!(response.topics[1].partitions.len(), 2);
    }

    #[test]
    fn test_topic_error_before_partition_errors() {
        let data = response(vec![MetadataResponseTopic {
            error: Some(ApiError::TopicAuthorizationFailed),
            ..topic("a", vec![partition(0, 1, Some(ApiError::NotLeaderForPartition))])
        }])
        .encode()
        .unwrap();

        let (_, error) = MetadataResponse::decode(&data).unwrap();
        assert_eq!(error, Some(ApiError::TopicAuthorizationFailed));
    }

    #[test]
    fn test_unknown_error_code() {
        let data = response(vec![MetadataResponseTopic {
            error: ApiError::new(9999),
            ..topic("a", vec![])
        }])
        .encode()
        .unwrap();

        let (_, error) = MetadataResponse::decode(&data).unwrap();
        assert_eq!(error, Some(ApiError::Unknown(9999)));
    }

    #[test]
    fn test_decode_is_repeatable() {
        let data = response(vec![topic("a", vec![partition(0, 1, None)])])
            .encode()
            .unwrap();

        let (first, _) = MetadataResponse::decode(&data).unwrap();
        let (second, _) = MetadataResponse::decode(&data).unwrap();
        assert_eq!(first, second);
    }

    fn arb_topics() -> impl Strategy<Value = Vec<(String, Vec<i32>)>> {
        proptest::collection::btree_map(
            "[a-zA-Z0-9._-]{1,12}",
            proptest::collection::btree_set(-5i32..100, 0..8),
            0..8,
        )
        .prop_map(|topics| {
            topics
                .into_iter()
                .map(|(name, partitions)| (name, partitions.into_iter().collect()))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_sorted_regardless_of_wire_order(topics in arb_topics(), rot in 0usize..16) {
            // scramble wire order
            let mut topics: Vec<_> = topics
                .into_iter()
                .map(|(name, mut ids)| {
                    if !ids.is_empty() {
                        let n = rot % ids.len();
                        ids.rotate_left(n);
                    }
                    if rot % 2 == 1 {
                        ids.reverse();
                    }
                    topic(&name, ids.into_iter().map(|id| partition(id, 1, None)).collect())
                })
                .collect();
            if !topics.is_empty() {
                let n = rot % topics.len();
                topics.rotate_left(n);
            }
            if rot % 3 == 0 {
                topics.reverse();
            }
            let expected_topics = topics.len();

            let data = response(topics).encode().unwrap();
            let (response, error) = MetadataResponse::decode(&data).unwrap();

            prop_assert_eq!(error, None);
            prop_assert_eq!(response.topics.len(), expected_topics);
            for pair in response.topics.windows(2) {
                prop_assert!(pair[0].name < pair[1].name);
            }
            for t in &response.topics {
                for pair in t.partitions.windows(2) {
                    prop_assert!(pair[0].partition_index < pair[1].partition_index);
                }
            }
        }

        #[test]
        fn test_arbitrary_bytes_do_not_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = MetadataResponse::decode(&data);
        }
    }
}
