//! Bounds-checked read cursor over an immutable response buffer.

use super::traits::{ReadError, ReadType};

/// Read position within a borrowed byte buffer.
///
/// The offset only ever moves forward and the buffer is never modified. Every read that would cross the end of the
/// buffer fails with [`ReadError::OutOfRange`] instead of touching memory it does not own.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Start reading at `offset`.
    ///
    /// An offset past the end is accepted; the first read will report it.
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    /// `true` once the offset sits exactly at (or beyond) the end of the buffer.
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.buf.len()
    }

    /// Consume `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(ReadError::OutOfRange {
                offset: self.offset,
                needed: n,
                len: self.buf.len(),
            })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Consume exactly `N` bytes into a fixed-size array.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Move the offset to the end of the buffer, discarding whatever is left.
    pub fn skip_to_end(&mut self) {
        self.offset = self.buf.len();
    }
}

/// Decode a single `T` from `buf` starting at `offset`.
///
/// Returns the value together with the offset directly behind it.
pub fn read_at<T: ReadType>(buf: &[u8], offset: usize) -> Result<(T, usize), ReadError> {
    let mut cursor = ByteCursor::at(buf, offset);
    let value = T::read(&mut cursor)?;
    Ok((value, cursor.offset()))
}

/// Capacity to reserve for `count` wire elements of at least `min_element_size` bytes each.
///
/// Counts come straight from the wire, so the reservation is capped by what the rest of the buffer could possibly
/// hold. A bogus count then fails on the first out-of-range read instead of on the allocation.
pub(crate) fn bounded_capacity(count: usize, remaining: usize, min_element_size: usize) -> usize {
    count.min(remaining / min_element_size.max(1))
}
