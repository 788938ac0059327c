//! ApiKey to tag request types.
//!
//! Only the first 38 keys (`Produce` through `CreatePartitions`) are modeled; they form the index space of the
//! per-API timeout vector.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_api_keys>

use super::primitives::Int16;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum ApiKey {
    Produce,
    Fetch,
    ListOffsets,
    Metadata,
    LeaderAndIsr,
    StopReplica,
    UpdateMetadata,
    ControlledShutdown,
    OffsetCommit,
    OffsetFetch,
    FindCoordinator,
    JoinGroup,
    Heartbeat,
    LeaveGroup,
    SyncGroup,
    DescribeGroups,
    ListGroups,
    SaslHandshake,
    ApiVersions,
    CreateTopics,
    DeleteTopics,
    DeleteRecords,
    InitProducerId,
    OffsetForLeaderEpoch,
    AddPartitionsToTxn,
    AddOffsetsToTxn,
    EndTxn,
    WriteTxnMarkers,
    TxnOffsetCommit,
    DescribeAcls,
    CreateAcls,
    DeleteAcls,
    DescribeConfigs,
    AlterConfigs,
    AlterReplicaLogDirs,
    DescribeLogDirs,
    SaslAuthenticate,
    CreatePartitions,
    Unknown(Int16),
}

impl ApiKey {
    /// Number of distinct known API keys.
    pub const COUNT: usize = 38;

    /// Position of this key in a per-API table of [`Self::COUNT`] entries.
    ///
    /// Returns `None` for [`ApiKey::Unknown`].
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Unknown(_) => None,
            known => usize::try_from(Int16::from(*known).0).ok(),
        }
    }
}

impl From<Int16> for ApiKey {
    fn from(key: Int16) -> Self {
        match key.0 {
            0 => Self::Produce,
            1 => Self::Fetch,
            2 => Self::ListOffsets,
            3 => Self::Metadata,
            4 => Self::LeaderAndIsr,
            5 => Self::StopReplica,
            6 => Self::UpdateMetadata,
            7 => Self::ControlledShutdown,
            8 => Self::OffsetCommit,
            9 => Self::OffsetFetch,
            10 => Self::FindCoordinator,
            11 => Self::JoinGroup,
            12 => Self::Heartbeat,
            13 => Self::LeaveGroup,
            14 => Self::SyncGroup,
            15 => Self::DescribeGroups,
            16 => Self::ListGroups,
            17 => Self::SaslHandshake,
            18 => Self::ApiVersions,
            19 => Self::CreateTopics,
            20 => Self::DeleteTopics,
            21 => Self::DeleteRecords,
            22 => Self::InitProducerId,
            23 => Self::OffsetForLeaderEpoch,
            24 => Self::AddPartitionsToTxn,
            25 => Self::AddOffsetsToTxn,
            26 => Self::EndTxn,
            27 => Self::WriteTxnMarkers,
            28 => Self::TxnOffsetCommit,
            29 => Self::DescribeAcls,
            30 => Self::CreateAcls,
            31 => Self::DeleteAcls,
            32 => Self::DescribeConfigs,
            33 => Self::AlterConfigs,
            34 => Self::AlterReplicaLogDirs,
            35 => Self::DescribeLogDirs,
            36 => Self::SaslAuthenticate,
            37 => Self::CreatePartitions,
            _ => Self::Unknown(key),
        }
    }
}

impl From<ApiKey> for Int16 {
    fn from(key: ApiKey) -> Self {
        match key {
            ApiKey::Produce => Self(0),
            ApiKey::Fetch => Self(1),
            ApiKey::ListOffsets => Self(2),
            ApiKey::Metadata => Self(3),
            ApiKey::LeaderAndIsr => Self(4),
            ApiKey::StopReplica => Self(5),
            ApiKey::UpdateMetadata => Self(6),
            ApiKey::ControlledShutdown => Self(7),
            ApiKey::OffsetCommit => Self(8),
            ApiKey::OffsetFetch => Self(9),
            ApiKey::FindCoordinator => Self(10),
            ApiKey::JoinGroup => Self(11),
            ApiKey::Heartbeat => Self(12),
            ApiKey::LeaveGroup => Self(13),
            ApiKey::SyncGroup => Self(14),
            ApiKey::DescribeGroups => Self(15),
            ApiKey::ListGroups => Self(16),
            ApiKey::SaslHandshake => Self(17),
            ApiKey::ApiVersions => Self(18),
            ApiKey::CreateTopics => Self(19),
            ApiKey::DeleteTopics => Self(20),
            ApiKey::DeleteRecords => Self(21),
            ApiKey::InitProducerId => Self(22),
            ApiKey::OffsetForLeaderEpoch => Self(23),
            ApiKey::AddPartitionsToTxn => Self(24),
            ApiKey::AddOffsetsToTxn => Self(25),
            ApiKey::EndTxn => Self(26),
            ApiKey::WriteTxnMarkers => Self(27),
            ApiKey::TxnOffsetCommit => Self(28),
            ApiKey::DescribeAcls => Self(29),
            ApiKey::CreateAcls => Self(30),
            ApiKey::DeleteAcls => Self(31),
            ApiKey::DescribeConfigs => Self(32),
            ApiKey::AlterConfigs => Self(33),
            ApiKey::AlterReplicaLogDirs => Self(34),
            ApiKey::DescribeLogDirs => Self(35),
            ApiKey::SaslAuthenticate => Self(36),
            ApiKey::CreatePartitions => Self(37),
            ApiKey::Unknown(code) => code,
        }
    }
}
