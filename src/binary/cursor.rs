//! Cursor-based reader over an in-memory PUZ byte buffer.

use byteorder::{ByteOrder, LittleEndian};

use super::FormatError;
use crate::encoding::Encoding;

/// A borrowed byte buffer plus a read position.
///
/// Every sized read returns a `Result` so truncation surfaces as a
/// format error carrying the offending offset and field, never a panic.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    encoding: Encoding,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8], encoding: Encoding, pos: usize) -> Self {
        Cursor { buf, pos, encoding }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn has_bytes_left(&self) -> bool {
        self.pos < self.buf.len()
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(FormatError::UnexpectedEof {
                offset: self.pos,
                field,
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, FormatError> {
        Ok(self.read_bytes(1, field)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, FormatError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2, field)?))
    }

    /// Read `len` bytes and decode them with the file's encoding.
    pub fn read_string(&mut self, len: usize, field: &'static str) -> Result<String, FormatError> {
        Ok(self.encoding.decode(self.read_bytes(len, field)?))
    }

    /// Read a zstring: the bytes up to (not including) the next NUL,
    /// consuming the NUL itself.  With no NUL left, reads to the end of
    /// the buffer.  Returns `None` when the region is empty — absent
    /// and empty fields are indistinguishable on the wire.
    pub fn read_zstring(&mut self) -> Option<String> {
        let next_nul = self.buf[self.pos.min(self.buf.len())..]
            .iter()
            .position(|&b| b == 0)
            .map(|i| self.pos + i);
        let end = next_nul.unwrap_or_else(|| self.buf.len().saturating_sub(1));
        let value = if end > self.pos {
            Some(self.encoding.decode(&self.buf[self.pos..end]))
        } else {
            None
        };
        self.pos = self.pos.max(end) + 1;
        value
    }
}
