use std::io::Write;

use tracing::debug;

use super::{DecodeError, NORMAL_CONSUMER, RequestBody};
use crate::{
    config::ConsumerConfig,
    protocol::{
        api_key::ApiKey,
        api_version::ApiVersion,
        cursor::{ByteCursor, bounded_capacity},
        error::Error as ApiError,
        primitives::*,
        record::Message,
        traits::{ReadError, ReadType, WriteError, WriteType},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequestPartition {
    /// The partition index.
    pub partition: Int32,

    /// The message offset.
    pub fetch_offset: Int64,

    /// The maximum bytes to fetch from this partition.
    pub partition_max_bytes: Int32,
}

impl<W> WriteType<W> for FetchRequestPartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition.write(writer)?;
        self.fetch_offset.write(writer)?;
        self.partition_max_bytes.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequestTopic {
    /// The name of the topic to fetch.
    pub topic: String_,

    /// The partitions to fetch.
    pub partitions: Vec<FetchRequestPartition>,
}

impl<W> WriteType<W> for FetchRequestTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topic.write(writer)?;
        write_array(writer, &self.partitions)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// The broker ID of the follower, of -1 if this request is from a consumer.
    pub replica_id: Int32,

    /// The maximum time in milliseconds the broker may wait before answering.
    pub max_wait_ms: Int32,

    /// The minimum bytes to accumulate in the response.
    pub min_bytes: Int32,

    /// The topics to fetch.
    pub topics: Vec<FetchRequestTopic>,
}

impl FetchRequest {
    /// Build a consumer fetch for `(topic, partition, offset)` triples.
    ///
    /// Wait time, minimum bytes and per-partition maximum bytes come from `config`. Partitions of the same topic are
    /// grouped in the order they first appear.
    pub fn from_config<'a, I>(config: &ConsumerConfig, partitions: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i32, i64)>,
    {
        let mut topics: Vec<FetchRequestTopic> = vec![];
        for (topic, partition, fetch_offset) in partitions {
            let partition = FetchRequestPartition {
                partition: Int32(partition),
                fetch_offset: Int64(fetch_offset),
                partition_max_bytes: Int32(config.fetch_max_bytes),
            };

            match topics.iter_mut().find(|t| t.topic.0 == topic) {
                Some(t) => t.partitions.push(partition),
                None => topics.push(FetchRequestTopic {
                    topic: String_(topic.to_owned()),
                    partitions: vec![partition],
                }),
            }
        }

        Self {
            replica_id: NORMAL_CONSUMER,
            max_wait_ms: Int32(config.fetch_max_wait_ms),
            min_bytes: Int32(config.fetch_min_bytes),
            topics,
        }
    }
}

impl<W> WriteType<W> for FetchRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.replica_id.write(writer)?;
        self.max_wait_ms.write(writer)?;
        self.min_bytes.write(writer)?;
        write_array(writer, &self.topics)?;
        Ok(())
    }
}

impl RequestBody for FetchRequest {
    type ResponseBody = FetchResponse;

    const API_KEY: ApiKey = ApiKey::Fetch;

    const API_VERSION: ApiVersion = ApiVersion::V0;
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct FetchResponsePartition {
    /// The partition index.
    pub partition_index: Int32,

    /// The error code, or `None` if there was no fetch error.
    pub error: Option<ApiError>,

    /// The current high water mark.
    pub high_watermark: Int64,

    /// Messages in wire order.
    pub messages: Vec<Message>,
}

impl FetchResponsePartition {
    /// Read one partition entry.
    ///
    /// The field following the high watermark is read as a message *count*, not as the byte length of a message set.
    /// Reading stops early once the buffer is used up. With `trailing` set (nothing else follows this partition in
    /// the response) a final message cut off by the end of the buffer is dropped instead of failing the read.
    fn read_partition(cursor: &mut ByteCursor<'_>, trailing: bool) -> Result<Self, ReadError> {
        let partition_index = Int32::read(cursor)?;
        let error = ApiError::new(Int16::read(cursor)?.0);
        let high_watermark = Int64::read(cursor)?;

        let count = Int32::read(cursor)?.0;
        let count = usize::try_from(count).map_err(|_| {
            ReadError::Malformed(format!("Invalid negative message count: {count}").into())
        })?;

        let mut messages = Vec::with_capacity(bounded_capacity(
            count,
            cursor.remaining(),
            Message::MIN_SIZE,
        ));
        for _ in 0..count {
            match Message::read(cursor) {
                Ok(message) => messages.push(message),
                Err(ReadError::OutOfRange { offset, .. }) if trailing => {
                    debug!(
                        partition = partition_index.0,
                        offset,
                        decoded = messages.len(),
                        "dropping truncated trailing message",
                    );
                    cursor.skip_to_end();
                    break;
                }
                Err(e) => return Err(e),
            }

            if cursor.is_exhausted() {
                if messages.len() < count {
                    debug!(
                        partition = partition_index.0,
                        declared = count,
                        decoded = messages.len(),
                        "fetch response ends before declared message count",
                    );
                }
                break;
            }
        }

        Ok(Self {
            partition_index,
            error,
            high_watermark,
            messages,
        })
    }
}

impl<W> WriteType<W> for FetchResponsePartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_index.write(writer)?;
        Int16(self.error.map_or(0, |e| e.code())).write(writer)?;
        self.high_watermark.write(writer)?;
        write_count_prefixed(writer, &self.messages)?;
        Ok(())
    }
}

/// Messages are prefixed with a signed count, not with an unsigned array length.
fn write_count_prefixed<W: Write>(writer: &mut W, messages: &[Message]) -> Result<(), WriteError> {
    Int32(i32::try_from(messages.len())?).write(writer)?;
    for message in messages {
        message.write(writer)?;
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct FetchResponseTopic {
    /// The topic name.
    pub topic: String_,

    /// The topic partitions.
    pub partitions: Vec<FetchResponsePartition>,
}

impl<W> WriteType<W> for FetchResponseTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topic.write(writer)?;
        write_array(writer, &self.partitions)?;
        Ok(())
    }
}

/// Decoded fetch response.
///
/// Unlike [`MetadataResponse`](super::MetadataResponse) this carries no length prefix and no correlation ID, and
/// per-partition errors are not folded into an overall result. Check [`FetchResponsePartition::error`].
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct FetchResponse {
    /// The response topics, in wire order.
    pub responses: Vec<FetchResponseTopic>,
}

impl FetchResponse {
    /// Decode a buffer that starts directly at the topic count.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(payload);

        let topic_count =
            usize::try_from(UInt32::read(&mut cursor)?.0).map_err(ReadError::from)?;
        let mut responses =
            Vec::with_capacity(bounded_capacity(topic_count, cursor.remaining(), 2 + 4));

        for t in 0..topic_count {
            let topic = String_::read(&mut cursor)?;

            let partition_count =
                usize::try_from(UInt32::read(&mut cursor)?.0).map_err(ReadError::from)?;
            let mut partitions = Vec::with_capacity(bounded_capacity(
                partition_count,
                cursor.remaining(),
                4 + 2 + 8 + 4,
            ));
            for p in 0..partition_count {
                let trailing = t + 1 == topic_count && p + 1 == partition_count;
                partitions.push(FetchResponsePartition::read_partition(
                    &mut cursor,
                    trailing,
                )?);
            }

            responses.push(FetchResponseTopic { topic, partitions });
        }

        debug!(
            topics = responses.len(),
            messages = responses
                .iter()
                .flat_map(|t| t.partitions.iter())
                .map(|p| p.messages.len())
                .sum::<usize>(),
            "decoded fetch response",
        );

        Ok(Self { responses })
    }

    /// Encode into the layout [`decode`](Self::decode) reads.
    pub fn encode(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = vec![];
        write_array(&mut buf, &self.responses)?;
        Ok(buf)
    }

    /// Partition entry for `topic`/`partition`, if present.
    pub fn partition(&self, topic: &str, partition: i32) -> Option<&FetchResponsePartition> {
        self.responses
            .iter()
            .filter(|t| t.topic.0 == topic)
            .flat_map(|t| t.partitions.iter())
            .find(|p| p.partition_index.0 == partition)
    }
}
