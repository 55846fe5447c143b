//! Low-level BinObject byte writer.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::types::{integer_tag, is_integral, Tag};

const INITIAL_CAPACITY: usize = 256;

/// Writer appends tagged primitives to a binary buffer.
///
/// Numbers written through [`Writer::write_number`] and lengths written
/// through [`Writer::write_length`] carry their own tag byte; the fixed-width
/// `write_*` helpers write payload bytes only.
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    /// Creates a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the current length of the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the encoded bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Takes the encoded bytes, leaving the writer empty for reuse.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Resets the writer for reuse.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Writes a tag byte.
    pub fn write_tag(&mut self, tag: Tag) {
        self.buffer.push(tag as u8);
    }

    /// Writes a raw byte.
    pub fn write_byte(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Writes a boolean payload byte.
    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(if value { 1 } else { 0 })
    }

    pub fn write_int8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    pub fn write_uint8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_int16(&mut self, value: i16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_uint16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_int32(&mut self, value: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn write_uint32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    /// Writes a 64-bit float (IEEE 754, little-endian).
    pub fn write_float64(&mut self, value: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    /// Writes a number with the narrowest tag that represents it.
    ///
    /// NaN is written as a `Null` tag. Non-integral and non-finite numbers
    /// are written as `Double`. Integral numbers outside the 32-bit ranges
    /// fail with [`Error::IntegerOverflow`].
    pub fn write_number(&mut self, value: f64) -> Result<()> {
        if value.is_nan() {
            self.write_tag(Tag::Null);
            return Ok(());
        }
        if !is_integral(value) {
            self.write_tag(Tag::Double);
            self.write_float64(value);
            return Ok(());
        }
        // Saturating cast; anything that saturates is out of range anyway.
        self.write_integer(value as i64)
            .map_err(|_| Error::IntegerOverflow(value))
    }

    /// Writes an integer with the narrowest of the six integer tags.
    pub fn write_integer(&mut self, value: i64) -> Result<()> {
        match integer_tag(value) {
            Some(Tag::Int8) => {
                self.write_tag(Tag::Int8);
                self.write_int8(value as i8);
            }
            Some(Tag::UInt8) => {
                self.write_tag(Tag::UInt8);
                self.write_uint8(value as u8);
            }
            Some(Tag::Int16) => {
                self.write_tag(Tag::Int16);
                self.write_int16(value as i16);
            }
            Some(Tag::UInt16) => {
                self.write_tag(Tag::UInt16);
                self.write_uint16(value as u16);
            }
            Some(Tag::Int32) => {
                self.write_tag(Tag::Int32);
                self.write_int32(value as i32);
            }
            Some(Tag::UInt32) => {
                self.write_tag(Tag::UInt32);
                self.write_uint32(value as u32);
            }
            _ => return Err(Error::IntegerOverflow(value as f64)),
        }
        Ok(())
    }

    /// Writes a length or count field.
    pub fn write_length(&mut self, length: usize) -> Result<()> {
        let length = i64::try_from(length).map_err(|_| Error::IntegerOverflow(length as f64))?;
        self.write_integer(length)
    }

    /// Writes a length-prefixed UTF-8 string (no tag).
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_length(value.len())?;
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes length-prefixed bytes (no tag).
    pub fn write_length_prefixed_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.write_length(data.len())?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_bytes(value: f64) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_number(value).unwrap();
        writer.into_bytes()
    }

    #[test]
    fn test_write_number_minimal_width() {
        assert_eq!(number_bytes(127.0), vec![Tag::Int8 as u8, 0x7f]);
        assert_eq!(number_bytes(-1.0), vec![Tag::Int8 as u8, 0xff]);
        assert_eq!(number_bytes(200.0), vec![Tag::UInt8 as u8, 200]);
        assert_eq!(number_bytes(300.0), vec![Tag::UInt16 as u8, 0x2c, 0x01]);
        assert_eq!(number_bytes(-300.0), vec![Tag::Int16 as u8, 0xd4, 0xfe]);
        assert_eq!(
            number_bytes(70000.0),
            vec![Tag::UInt32 as u8, 0x70, 0x11, 0x01, 0x00]
        );
        assert_eq!(
            number_bytes(-40000.0),
            vec![Tag::Int32 as u8, 0xc0, 0x63, 0xff, 0xff]
        );
    }

    #[test]
    fn test_write_number_double() {
        let mut expected = vec![Tag::Double as u8];
        expected.extend_from_slice(&1.5f64.to_le_bytes());
        assert_eq!(number_bytes(1.5), expected);

        let mut expected = vec![Tag::Double as u8];
        expected.extend_from_slice(&f64::INFINITY.to_le_bytes());
        assert_eq!(number_bytes(f64::INFINITY), expected);
    }

    #[test]
    fn test_write_number_nan_is_null() {
        assert_eq!(number_bytes(f64::NAN), vec![Tag::Null as u8]);
    }

    #[test]
    fn test_write_number_overflow() {
        let mut writer = Writer::new();
        let err = writer.write_number(4294967296.0).unwrap_err();
        assert!(matches!(err, Error::IntegerOverflow(n) if n == 4294967296.0));

        let err = writer.write_number(1e300).unwrap_err();
        assert!(matches!(err, Error::IntegerOverflow(_)));
    }

    #[test]
    fn test_write_string() {
        let mut writer = Writer::new();
        writer.write_string("hello").unwrap();
        assert_eq!(
            writer.as_bytes(),
            &[Tag::Int8 as u8, 5, b'h', b'e', b'l', b'l', b'o']
        );
    }

    #[test]
    fn test_take_bytes_resets() {
        let mut writer = Writer::new();
        writer.write_tag(Tag::Null);
        assert_eq!(writer.take_bytes(), vec![Tag::Null as u8]);
        assert!(writer.is_empty());
    }
}
