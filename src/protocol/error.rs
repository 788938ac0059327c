//! Server-reported error codes.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_error_codes>

use thiserror::Error;

macro_rules! error_codes {
    ($(($code:literal, $variant:ident, $retriable:literal, $msg:literal),)*) => {
        /// Semantic kind of a non-zero error code found in a response.
        #[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Error {
            $(
                #[error($msg)]
                $variant,
            )*

            /// A code this client does not know about.
            #[error("Unknown error code {0}")]
            Unknown(i16),
        }

        impl Error {
            /// Map a wire error code.
            ///
            /// `0` means "no error" and yields `None`. Codes missing from the table map to [`Error::Unknown`] rather
            /// than failing.
            pub fn new(code: i16) -> Option<Self> {
                match code {
                    0 => None,
                    $($code => Some(Self::$variant),)*
                    _ => Some(Self::Unknown(code)),
                }
            }

            /// Wire code of this error.
            pub fn code(&self) -> i16 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unknown(code) => *code,
                }
            }

            /// Whether repeating the request (usually after a metadata refresh) may succeed.
            pub fn is_retriable(&self) -> bool {
                match self {
                    $(Self::$variant => $retriable,)*
                    Self::Unknown(_) => false,
                }
            }
        }
    };
}

error_codes! {
    (-1, UnknownServerError, false, "The server experienced an unexpected error when processing the request."),
    (1, OffsetOutOfRange, false, "The requested offset is not within the range of offsets maintained by the server."),
    (2, CorruptMessage, true, "This message has failed its CRC checksum, exceeds the valid size, has a null key for a compacted topic, or is otherwise corrupt."),
    (3, UnknownTopicOrPartition, true, "This server does not host this topic-partition."),
    (4, InvalidFetchSize, false, "The requested fetch size is invalid."),
    (5, LeaderNotAvailable, true, "There is no leader for this topic-partition as we are in the middle of a leadership election."),
    (6, NotLeaderForPartition, true, "This server is not the leader for that topic-partition."),
    (7, RequestTimedOut, true, "The request timed out."),
    (8, BrokerNotAvailable, false, "The broker is not available."),
    (9, ReplicaNotAvailable, true, "The replica is not available for the requested topic-partition."),
    (10, MessageTooLarge, false, "The request included a message larger than the max message size the server will accept."),
    (11, StaleControllerEpoch, false, "The controller moved to another broker."),
    (12, OffsetMetadataTooLarge, false, "The metadata field of the offset request was too large."),
    (13, NetworkException, true, "The server disconnected before a response was received."),
    (14, CoordinatorLoadInProgress, true, "The coordinator is loading and hence can't process requests."),
    (15, CoordinatorNotAvailable, true, "The coordinator is not available."),
    (16, NotCoordinator, true, "This is not the correct coordinator."),
    (17, InvalidTopicException, false, "The request attempted to perform an operation on an invalid topic."),
    (18, RecordListTooLarge, false, "The request included message batch larger than the configured segment size on the server."),
    (19, NotEnoughReplicas, true, "Messages are rejected since there are fewer in-sync replicas than required."),
    (20, NotEnoughReplicasAfterAppend, true, "Messages are written to the log, but to fewer in-sync replicas than required."),
    (21, InvalidRequiredAcks, false, "Produce request specified an invalid value for required acks."),
    (22, IllegalGeneration, false, "Specified group generation id is not valid."),
    (23, InconsistentGroupProtocol, false, "The group member's supported protocols are incompatible with those of existing members."),
    (24, InvalidGroupId, false, "The configured groupId is invalid."),
    (25, UnknownMemberId, false, "The coordinator is not aware of this member."),
    (26, InvalidSessionTimeout, false, "The session timeout is not within the range allowed by the broker."),
    (27, RebalanceInProgress, false, "The group is rebalancing, so a rejoin is needed."),
    (28, InvalidCommitOffsetSize, false, "The committing offset data size is not valid."),
    (29, TopicAuthorizationFailed, false, "Topic authorization failed."),
    (30, GroupAuthorizationFailed, false, "Group authorization failed."),
    (31, ClusterAuthorizationFailed, false, "Cluster authorization failed."),
    (32, InvalidTimestamp, false, "The timestamp of the message is out of acceptable range."),
    (33, UnsupportedSaslMechanism, false, "The broker does not support the requested SASL mechanism."),
    (34, IllegalSaslState, false, "Request is not valid given the current SASL state."),
    (35, UnsupportedVersion, false, "The version of API is not supported."),
    (36, TopicAlreadyExists, false, "Topic with this name already exists."),
    (37, InvalidPartitions, false, "Number of partitions is below 1."),
    (38, InvalidReplicationFactor, false, "Replication factor is below 1 or larger than the number of available brokers."),
    (39, InvalidReplicaAssignment, false, "Replica assignment is invalid."),
    (40, InvalidConfig, false, "Configuration is invalid."),
    (41, NotController, true, "This is not the correct controller for this cluster."),
    (42, InvalidRequest, false, "This most likely occurs because of a request being malformed by the client library or the message was sent to an incompatible broker."),
    (43, UnsupportedForMessageFormat, false, "The message format version on the broker does not support the request."),
    (44, PolicyViolation, false, "Request parameters do not satisfy the configured policy."),
    (45, OutOfOrderSequenceNumber, false, "The broker received an out of order sequence number."),
    (46, DuplicateSequenceNumber, false, "The broker received a duplicate sequence number."),
    (47, InvalidProducerEpoch, false, "Producer attempted to produce with an old epoch."),
    (48, InvalidTxnState, false, "The producer attempted a transactional operation in an invalid state."),
    (49, InvalidProducerIdMapping, false, "The producer attempted to use a producer id which is not currently assigned to its transactional id."),
    (50, InvalidTransactionTimeout, false, "The transaction timeout is larger than the maximum value allowed by the broker."),
    (51, ConcurrentTransactions, true, "The producer attempted to update a transaction while another concurrent operation on the same transaction was ongoing."),
    (52, TransactionCoordinatorFenced, false, "Indicates that the transaction coordinator sending a WriteTxnMarker is no longer the current coordinator for a given producer."),
    (53, TransactionalIdAuthorizationFailed, false, "Transactional Id authorization failed."),
    (54, SecurityDisabled, false, "Security features are disabled."),
    (55, OperationNotAttempted, false, "The broker did not attempt to execute this operation."),
    (56, KafkaStorageError, true, "Disk error when trying to access log file on the disk."),
    (57, LogDirNotFound, false, "The user-specified log directory is not found in the broker config."),
    (58, SaslAuthenticationFailed, false, "SASL Authentication failed."),
    (59, UnknownProducerId, false, "The broker could not locate the producer metadata associated with the producer id."),
    (60, ReassignmentInProgress, false, "A partition reassignment is in progress."),
    (61, DelegationTokenAuthDisabled, false, "Delegation Token feature is not enabled."),
    (62, DelegationTokenNotFound, false, "Delegation Token is not found on server."),
    (63, DelegationTokenOwnerMismatch, false, "Specified Principal is not valid Owner/Renewer."),
    (64, DelegationTokenRequestNotAllowed, false, "Delegation Token requests are not allowed on PLAINTEXT/1-way SSL channels and on delegation token authenticated channels."),
    (65, DelegationTokenAuthorizationFailed, false, "Delegation Token authorization failed."),
    (66, DelegationTokenExpired, false, "Delegation Token is expired."),
    (67, InvalidPrincipalType, false, "Supplied principalType is not supported."),
    (68, NonEmptyGroup, false, "The group is not empty."),
    (69, GroupIdNotFound, false, "The group id does not exist."),
    (70, FetchSessionIdNotFound, true, "The fetch session ID was not found."),
    (71, InvalidFetchSessionEpoch, true, "The fetch session epoch is invalid."),
    (72, ListenerNotFound, true, "There is no listener on the leader broker that matches the listener on which metadata request was processed."),
    (73, TopicDeletionDisabled, false, "Topic deletion is disabled."),
    (74, FencedLeaderEpoch, true, "The leader epoch in the request is older than the epoch on the broker."),
    (75, UnknownLeaderEpoch, true, "The leader epoch in the request is newer than the epoch on the broker."),
    (76, UnsupportedCompressionType, false, "The requesting client does not support the compression type of given partition."),
    (77, StaleBrokerEpoch, false, "Broker epoch has changed."),
    (78, OffsetNotAvailable, true, "The leader high watermark has not caught up from a recent leader election so the offsets cannot be guaranteed to be monotonically increasing."),
    (79, MemberIdRequired, false, "The group member needs to have a valid member id before actually entering a consumer group."),
    (80, PreferredLeaderNotAvailable, true, "The preferred leader was not available."),
    (81, GroupMaxSizeReached, false, "The consumer group has reached its max size."),
    (82, FencedInstanceId, false, "The broker rejected this static consumer since another consumer with the same group.instance.id has registered with a different member.id."),
}

impl Error {
    /// Whether this error is an expected, transient state of a healthy cluster rather than a failure.
    ///
    /// Only [`Error::LeaderNotAvailable`] qualifies: it is reported while a partition elects a new leader.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::LeaderNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_no_error() {
        assert_eq!(Error::new(0), None);
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(Error::new(-1), Some(Error::UnknownServerError));
        assert_eq!(Error::new(1), Some(Error::OffsetOutOfRange));
        assert_eq!(Error::new(5), Some(Error::LeaderNotAvailable));
        assert_eq!(Error::new(6), Some(Error::NotLeaderForPartition));
        assert_eq!(Error::new(7), Some(Error::RequestTimedOut));
        assert_eq!(Error::new(82), Some(Error::FencedInstanceId));
    }

    #[test]
    fn test_unrecognized_code() {
        assert_eq!(Error::new(-2), Some(Error::Unknown(-2)));
        assert_eq!(Error::new(1000), Some(Error::Unknown(1000)));
        assert_eq!(
            Error::Unknown(1000).to_string(),
            "Unknown error code 1000"
        );
    }

    #[test]
    fn test_benign() {
        assert!(Error::LeaderNotAvailable.is_benign());
        assert!(Error::LeaderNotAvailable.is_retriable());
        assert!(!Error::NotLeaderForPartition.is_benign());
        assert!(!Error::Unknown(5000).is_benign());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::RequestTimedOut.to_string(),
            "The request timed out."
        );
    }

    proptest! {
        #[test]
        fn test_code_roundtrip(code: i16) {
            match Error::new(code) {
                None => prop_assert_eq!(code, 0),
                Some(e) => prop_assert_eq!(e.code(), code),
            }
        }
    }
}
