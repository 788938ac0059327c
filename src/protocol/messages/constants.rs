use crate::protocol::primitives::Int32;

/// The `replica_id` to use to signify the request is being made by a normal consumer.
pub const NORMAL_CONSUMER: Int32 = Int32(-1);

/// Leader ID reported while a partition has no elected leader.
pub const NO_LEADER: Int32 = Int32(-1);
