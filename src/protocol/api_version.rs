use super::primitives::Int16;

/// Version of a request or response schema.
///
/// All messages in this crate use the version 0 layouts.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct ApiVersion(pub Int16);

impl ApiVersion {
    pub const V0: Self = Self(Int16(0));
}
