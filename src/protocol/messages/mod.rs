//! Individual API messages.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_messages>

use thiserror::Error;

use super::{
    api_key::ApiKey,
    api_version::ApiVersion,
    primitives::{Int32, NullableString},
    traits::{ReadError, WriteError, WriteType},
};

mod constants;
pub use constants::*;
mod fetch;
pub use fetch::*;
mod header;
pub use header::*;
mod metadata;
pub use metadata::*;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Response length did not match: {declared} + 4 != {actual}")]
    FrameLengthMismatch { declared: u32, actual: usize },

    #[error(transparent)]
    ReadError(#[from] ReadError),
}

/// Specifies a request body.
pub trait RequestBody {
    /// The response type that will follow when issuing this request.
    type ResponseBody;

    /// Kafka API key.
    ///
    /// This will be added to the request header and selects the per-API timeout.
    const API_KEY: ApiKey;

    /// Schema version this body is written in.
    const API_VERSION: ApiVersion;
}

/// Encode a complete request frame: `[length][header][body]`.
pub fn encode_request<B>(
    correlation_id: i32,
    client_id: Option<&str>,
    body: &B,
) -> Result<Vec<u8>, WriteError>
where
    B: RequestBody + WriteType<Vec<u8>>,
{
    let header = RequestHeader {
        request_api_key: B::API_KEY,
        request_api_version: B::API_VERSION,
        correlation_id: Int32(correlation_id),
        client_id: NullableString(client_id.map(ToOwned::to_owned)),
    };

    // reserve the length prefix and patch it once the size is known
    let mut buf = vec![0u8; 4];
    header.write(&mut buf)?;
    body.write(&mut buf)?;

    let len = i32::try_from(buf.len() - 4)?;
    buf[..4].copy_from_slice(&len.to_be_bytes());

    Ok(buf)
}
