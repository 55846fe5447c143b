//! Low-level BinObject byte reader.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::types::Tag;

/// Reader decodes BinObject primitives from a binary buffer.
///
/// Every read checks that `position + width <= len` first, so a truncated
/// buffer fails with [`Error::TruncatedBuffer`] instead of returning bytes
/// that were never written.
pub struct Reader<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            pos: 0,
        }
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.pos)
    }

    /// Returns true if there is more data to read.
    pub fn has_more(&self) -> bool {
        self.pos < self.buffer.len()
    }

    /// Returns true if the whole buffer has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos == self.buffer.len()
    }

    /// Checks if there are enough bytes available.
    fn check_available(&self, needed: usize) -> Result<()> {
        let end = self.pos.checked_add(needed);
        if end.map_or(true, |end| end > self.buffer.len()) {
            tracing::debug!(
                position = self.pos,
                needed,
                available = self.remaining(),
                "read past end of buffer"
            );
            return Err(Error::truncated(needed, self.remaining()));
        }
        Ok(())
    }

    /// Reads a raw byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        self.check_available(1)?;
        let value = self.buffer[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Reads raw bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        self.check_available(length)?;
        let bytes = &self.buffer[self.pos..self.pos + length];
        self.pos += length;
        Ok(bytes)
    }

    /// Reads a boolean payload byte. Only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidBoolean(other)),
        }
    }

    pub fn read_int8(&mut self) -> Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_uint8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    pub fn read_int16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_uint16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_int32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_uint32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Reads a 64-bit float (IEEE 754, little-endian).
    pub fn read_float64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    /// Reads the payload of a numeric tag that has already been consumed.
    pub fn read_number_payload(&mut self, tag: Tag) -> Result<f64> {
        let n = match tag {
            Tag::Int8 => self.read_int8()? as f64,
            Tag::UInt8 => self.read_uint8()? as f64,
            Tag::Int16 => self.read_int16()? as f64,
            Tag::UInt16 => self.read_uint16()? as f64,
            Tag::Int32 => self.read_int32()? as f64,
            Tag::UInt32 => self.read_uint32()? as f64,
            Tag::Double => self.read_float64()?,
            other => return Err(Error::malformed_tag(other as u8, "number")),
        };
        Ok(n)
    }

    /// Reads a tagged integer.
    pub fn read_integer(&mut self) -> Result<i64> {
        let byte = self.read_byte()?;
        match Tag::from_u8(byte) {
            Some(tag) if tag.is_integer() => Ok(self.read_number_payload(tag)? as i64),
            _ => Err(Error::malformed_tag(byte, "integer")),
        }
    }

    /// Reads a tagged length or count field.
    pub fn read_length(&mut self) -> Result<usize> {
        let n = self.read_integer()?;
        usize::try_from(n).map_err(|_| Error::InvalidLength(n as f64))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let length = self.read_length()?;
        let bytes = self.read_bytes(length)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// Reads length-prefixed bytes.
    pub fn read_length_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let length = self.read_length()?;
        self.read_bytes(length)
    }
}
