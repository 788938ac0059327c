//! Primitive types.
//!
//! All integers are big-endian. Strings carry an unsigned 16-bit length, arrays an unsigned 32-bit element count and
//! nullable byte sequences a signed 32-bit length where `-1` means "absent".
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_types>

use std::io::Write;

use super::{
    cursor::{ByteCursor, bounded_capacity},
    traits::{ReadError, ReadType, WriteError, WriteType},
};

macro_rules! fixed_width {
    ($(#[$meta:meta])* $name:ident, $inner:ty) => {
        $(#[$meta])*
        #[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        pub struct $name(pub $inner);

        impl ReadType for $name {
            fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
                Ok(Self(<$inner>::from_be_bytes(cursor.take_array()?)))
            }
        }

        impl<W> WriteType<W> for $name
        where
            W: Write,
        {
            fn write(&self, writer: &mut W) -> Result<(), WriteError> {
                writer.write_all(&self.0.to_be_bytes())?;
                Ok(())
            }
        }
    };
}

fixed_width!(
    /// Represents an integer between `-2^7` and `2^7-1` inclusive.
    Int8,
    i8
);

fixed_width!(
    /// Represents an integer between `-2^15` and `2^15-1` inclusive.
    Int16,
    i16
);

fixed_width!(
    /// Represents an integer between `-2^31` and `2^31-1` inclusive.
    Int32,
    i32
);

fixed_width!(
    /// Represents an integer between `-2^63` and `2^63-1` inclusive.
    Int64,
    i64
);

fixed_width!(
    /// Represents an integer between `0` and `2^16-1` inclusive.
    UInt16,
    u16
);

fixed_width!(
    /// Represents an integer between `0` and `2^32-1` inclusive.
    ///
    /// Used for response lengths, correlation IDs and array counts.
    UInt32,
    u32
);

fixed_width!(
    /// Represents an integer between `0` and `2^64-1` inclusive.
    UInt64,
    u64
);

/// Represents a sequence of characters.
///
/// First the length N is given as an unsigned 16-bit integer. Then N bytes follow which are the UTF-8 encoding of the
/// character sequence.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct String_(pub String);

impl ReadType for String_ {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        let len = UInt16::read(cursor)?;
        let buf = cursor.take(usize::from(len.0))?;
        let s = std::str::from_utf8(buf).map_err(|e| ReadError::Malformed(Box::new(e)))?;
        Ok(Self(s.to_owned()))
    }
}

impl<W> WriteType<W> for String_
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = u16::try_from(self.0.len()).map_err(WriteError::Overflow)?;
        UInt16(len).write(writer)?;
        writer.write_all(self.0.as_bytes())?;
        Ok(())
    }
}

/// Represents a sequence of characters or null.
///
/// Only used in request headers. The length is a signed 16-bit integer and a null value is encoded with length of -1
/// and no following bytes.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct NullableString(pub Option<String>);

impl ReadType for NullableString {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        let len = Int16::read(cursor)?;
        match len.0 {
            l if l < -1 => Err(ReadError::Malformed(
                format!("Invalid negative length for nullable string: {l}").into(),
            )),
            -1 => Ok(Self(None)),
            l => {
                let buf = cursor.take(usize::try_from(l)?)?;
                let s =
                    std::str::from_utf8(buf).map_err(|e| ReadError::Malformed(Box::new(e)))?;
                Ok(Self(Some(s.to_owned())))
            }
        }
    }
}

impl<W> WriteType<W> for NullableString
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match &self.0 {
            Some(s) => {
                let l = i16::try_from(s.len()).map_err(|e| WriteError::Malformed(Box::new(e)))?;
                Int16(l).write(writer)?;
                writer.write_all(s.as_bytes())?;
                Ok(())
            }
            None => Int16(-1).write(writer),
        }
    }
}

/// Represents a raw sequence of bytes or null.
///
/// For non-null values, first the length N is given as an INT32. Then N bytes follow. A null value is encoded with
/// length of -1 and there are no following bytes. Null and empty are distinct values.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct NullableBytes(pub Option<Vec<u8>>);

impl ReadType for NullableBytes {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        let len = Int32::read(cursor)?;
        match len.0 {
            l if l < -1 => Err(ReadError::Malformed(
                format!("Invalid negative length for nullable bytes: {l}").into(),
            )),
            -1 => Ok(Self(None)),
            l => {
                let buf = cursor.take(usize::try_from(l)?)?;
                Ok(Self(Some(buf.to_vec())))
            }
        }
    }
}

impl<W> WriteType<W> for NullableBytes
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match &self.0 {
            Some(s) => {
                let l = i32::try_from(s.len()).map_err(|e| WriteError::Malformed(Box::new(e)))?;
                Int32(l).write(writer)?;
                writer.write_all(s)?;
                Ok(())
            }
            None => Int32(-1).write(writer),
        }
    }
}

/// Represents a sequence of objects of a given type T.
///
/// First the element count N is given as an unsigned 32-bit integer, then N instances of type T follow. There is no
/// null array in this encoding.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct Array<T>(pub Vec<T>);

impl<T> ReadType for Array<T>
where
    T: ReadType + WireSize,
{
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError> {
        let len = usize::try_from(UInt32::read(cursor)?.0)?;
        let mut res = Vec::with_capacity(bounded_capacity(len, cursor.remaining(), T::MIN_SIZE));
        for _ in 0..len {
            res.push(T::read(cursor)?);
        }
        Ok(Self(res))
    }
}

impl<W, T> WriteType<W> for Array<T>
where
    W: Write,
    T: WriteType<W>,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        write_array(writer, &self.0)
    }
}

/// Write `items` as an [`Array`] without taking ownership.
pub fn write_array<W, T>(writer: &mut W, items: &[T]) -> Result<(), WriteError>
where
    W: Write,
    T: WriteType<W>,
{
    let len = u32::try_from(items.len())?;
    UInt32(len).write(writer)?;

    for element in items {
        element.write(writer)?;
    }

    Ok(())
}

/// Smallest number of bytes a value of this type occupies on the wire.
///
/// Used to cap pre-allocation for element counts read from untrusted input.
pub trait WireSize {
    const MIN_SIZE: usize;
}

impl WireSize for Int32 {
    const MIN_SIZE: usize = 4;
}

impl WireSize for String_ {
    const MIN_SIZE: usize = 2;
}
