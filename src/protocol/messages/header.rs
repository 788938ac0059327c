use std::io::Write;

use crate::protocol::{
    api_key::ApiKey,
    api_version::ApiVersion,
    cursor::ByteCursor,
    primitives::{Int16, Int32, NullableString, UInt32},
    traits::{ReadError, ReadType, WriteError, WriteType},
};

#[derive(Debug)]
pub struct RequestHeader {
    /// The API key of this request.
    pub request_api_key: ApiKey,

    /// The API version of this request.
    pub request_api_version: ApiVersion,

    /// The correlation ID of this request.
    pub correlation_id: Int32,

    /// The client ID string.
    pub client_id: NullableString,
}

impl<W> WriteType<W> for RequestHeader
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Int16::from(self.request_api_key).write(writer)?;
        self.request_api_version.0.write(writer)?;
        self.correlation_id.write(writer)?;
        self.client_id.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// The correlation ID of this response.
    pub correlation_id: UInt32,
}

impl ReadType for ResponseHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            correlation_id: UInt32::read(cursor)?,
        })
    }
}
