//! Legacy log records as carried by version 0 fetch responses.
//!
//! # References
//! - <https://kafka.apache.org/documentation/#messageset>

use std::io::Write;

use crate::config::Compression;

use super::{
    cursor::ByteCursor,
    primitives::{Int8, Int32, Int64, NullableBytes, UInt32},
    traits::{ReadError, ReadType, WriteError, WriteType},
};

/// Lowest three bits of the attributes byte select the compression codec.
const COMPRESSION_CODEC_MASK: i8 = 0x07;

/// One log record.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Message {
    pub offset: Int64,

    /// Size of everything following this field, as reported by the broker.
    ///
    /// It is not used to skip or bound the remaining fields.
    pub message_size: Int32,

    pub crc: UInt32,

    pub magic_byte: Int8,

    pub attributes: Int8,

    /// `None` when the wire length was `-1`, which is not the same as an empty key.
    pub key: NullableBytes,

    /// `None` when the wire length was `-1`, which is not the same as an empty value.
    pub value: NullableBytes,
}

impl Message {
    /// Smallest encoded size: all fixed-width fields plus two null lengths.
    pub(crate) const MIN_SIZE: usize = 8 + 4 + 4 + 1 + 1 + 4 + 4;

    /// Compression codec declared in the attributes.
    ///
    /// Returns `None` for codec numbers this crate does not know.
    pub fn compression(&self) -> Option<Compression> {
        match self.attributes.0 & COMPRESSION_CODEC_MASK {
            0 => Some(Compression::None),
            1 => Some(Compression::Gzip),
            2 => Some(Compression::Snappy),
            3 => Some(Compression::Lz4),
            _ => None,
        }
    }
}

impl ReadType for Message {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            offset: Int64::read(cursor)?,
            message_size: Int32::read(cursor)?,
            crc: UInt32::read(cursor)?,
            magic_byte: Int8::read(cursor)?,
            attributes: Int8::read(cursor)?,
            key: NullableBytes::read(cursor)?,
            value: NullableBytes::read(cursor)?,
        })
    }
}

impl<W> WriteType<W> for Message
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.offset.write(writer)?;
        self.message_size.write(writer)?;
        self.crc.write(writer)?;
        self.magic_byte.write(writer)?;
        self.attributes.write(writer)?;
        self.key.write(writer)?;
        self.value.write(writer)?;
        Ok(())
    }
}
