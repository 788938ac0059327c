//! Cluster-wide Kafka metadata.

use crate::{
    ProtocolError,
    protocol::messages::{
        DecodeError, MetadataResponse, MetadataResponsePartition, MetadataResponseTopic,
    },
    topology::BrokerTopology,
};

/// Metadata container for the entire cluster.
///
/// Topics are sorted by name and partitions by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Correlation ID of the response this snapshot was taken from.
    pub correlation_id: u32,

    /// Brokers, by node ID.
    pub brokers: BrokerTopology,

    /// Topics.
    pub topics: Vec<MetadataTopic>,
}

/// Metadata for a certain topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTopic {
    /// The topic name
    pub name: String,

    /// Topic-level error reported by the broker
    pub error: Option<ProtocolError>,

    /// Each partition in the topic
    pub partitions: Vec<MetadataPartition>,
}

/// Metadata for a certain partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPartition {
    /// The partition index
    pub partition_index: i32,

    /// Partition-level error reported by the broker
    pub error: Option<ProtocolError>,

    /// The ID of the leader broker, `None` during a leader election
    pub leader_id: Option<i32>,

    /// The set of all nodes that host this partition
    pub replica_nodes: Vec<i32>,

    /// The set of all nodes that are in sync with the leader for this partition
    pub isr_nodes: Vec<i32>,
}

impl Metadata {
    /// Decode a topology response frame into a snapshot.
    ///
    /// See [`MetadataResponse::decode`] for how errors are reported.
    pub fn decode(payload: &[u8]) -> Result<(Self, Option<ProtocolError>), DecodeError> {
        let (response, error) = MetadataResponse::decode(payload)?;
        Ok((response.into(), error))
    }

    pub fn topic(&self, name: &str) -> Option<&MetadataTopic> {
        self.topics
            .binary_search_by(|t| t.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.topics[idx])
    }

    pub fn partition(&self, topic: &str, partition: i32) -> Option<&MetadataPartition> {
        let topic = self.topic(topic)?;
        topic
            .partitions
            .binary_search_by_key(&partition, |p| p.partition_index)
            .ok()
            .map(|idx| &topic.partitions[idx])
    }

    /// `host:port` of the current leader.
    ///
    /// `None` if the partition is unknown, has no leader, or its leader is not among the known brokers.
    pub fn leader_url(&self, topic: &str, partition: i32) -> Option<String> {
        let leader = self.partition(topic, partition)?.leader_id?;
        self.brokers.get_broker_url(leader)
    }
}

impl From<MetadataResponse> for Metadata {
    fn from(mut response: MetadataResponse) -> Self {
        response.sort();
        Self {
            correlation_id: response.correlation_id.0,
            brokers: BrokerTopology::new(&response.brokers),
            topics: response.topics.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<MetadataResponseTopic> for MetadataTopic {
    fn from(topic: MetadataResponseTopic) -> Self {
        Self {
            name: topic.name.0,
            error: topic.error,
            partitions: topic.partitions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<MetadataResponsePartition> for MetadataPartition {
    fn from(partition: MetadataResponsePartition) -> Self {
        Self {
            partition_index: partition.partition_index.0,
            error: partition.error,
            leader_id: partition.leader(),
            replica_nodes: partition.replica_nodes.0.into_iter().map(|n| n.0).collect(),
            isr_nodes: partition.isr_nodes.0.into_iter().map(|n| n.0).collect(),
        }
    }
}
