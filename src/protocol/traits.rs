use std::io::Write;

use thiserror::Error;

use super::cursor::ByteCursor;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Out of range: need {needed} bytes at offset {offset} but buffer holds {len}")]
    OutOfRange {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("Overflow converting integer")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error(transparent)]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A type that can be decoded from the current position of a [`ByteCursor`].
///
/// After a failed read the cursor position is unspecified.
pub trait ReadType: Sized {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, ReadError>;
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Cannot write data")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error(transparent)]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub trait WriteType<W>: Sized
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError>;
}
