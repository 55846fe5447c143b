//! Value tree decoder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::map::Entry;
use tracing::{debug, trace};

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::registry::Registry;
use crate::types::Tag;
use crate::value::{Object, Value, ValueMap};

/// Decoder reconstructs value trees from a buffer produced by an
/// [`Encoder`](crate::Encoder).
///
/// A buffer may hold several root values back to back; call
/// [`Decoder::decode`] until [`Decoder::eof`] returns true. After any error
/// the read position is unspecified and the decoder should be discarded.
pub struct Decoder<'a> {
    reader: Reader<'a>,
    registry: Arc<Registry>,
    limits: Limits,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder with no custom types.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_registry(data, Arc::new(Registry::new()))
    }

    /// Creates a decoder that resolves custom tags through the registry.
    pub fn with_registry(data: &'a [u8], registry: Arc<Registry>) -> Self {
        Self {
            reader: Reader::new(data),
            registry,
            limits: Limits::default(),
        }
    }

    /// Replaces the resource limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Returns true if the read position is exactly at the end of the buffer.
    pub fn eof(&self) -> bool {
        self.reader.is_eof()
    }

    /// Decodes the next root value, which must be an object or an array.
    pub fn decode(&mut self) -> Result<Value> {
        let start = self.reader.position();
        let byte = self.reader.read_byte()?;
        let value = match Tag::from_u8(byte) {
            Some(Tag::Object) => Value::Object(self.decode_object(1)?),
            Some(Tag::Array) => Value::Array(self.decode_array(1)?),
            _ => {
                debug!(tag = byte, position = start, "invalid leading tag");
                return Err(Error::malformed_tag(byte, "object or array"));
            }
        };
        trace!(bytes = self.reader.position() - start, "decoded value");
        Ok(value)
    }

    /// Decodes one value inside a container at the given depth.
    fn decode_value(&mut self, depth: usize) -> Result<Value> {
        let byte = self.reader.read_byte()?;
        let tag = match Tag::from_u8(byte) {
            Some(tag) => tag,
            None => return self.decode_custom(byte),
        };

        let value = match tag {
            Tag::Null => Value::Null,
            Tag::Undefined => Value::Undefined,
            Tag::Object => Value::Object(self.decode_object(depth + 1)?),
            Tag::String => Value::String(self.read_string()?),
            Tag::Date => self.decode_date()?,
            Tag::Boolean => Value::Bool(self.reader.read_bool()?),
            Tag::Array => Value::Array(self.decode_array(depth + 1)?),
            Tag::Map => Value::Map(self.decode_map(depth + 1)?),
            Tag::Buffer => Value::Buffer(self.read_blob()?.to_vec()),
            Tag::ArrayBuffer => Value::ArrayBuffer(self.read_blob()?.to_vec()),
            Tag::Int8
            | Tag::UInt8
            | Tag::Int16
            | Tag::UInt16
            | Tag::Int32
            | Tag::UInt32
            | Tag::Double => Value::Number(self.reader.read_number_payload(tag)?),
            Tag::Int64 | Tag::UInt64 => {
                debug!(tag = byte, "64-bit integer tags are not supported");
                return Err(Error::malformed_tag(byte, "32-bit integer or double"));
            }
        };
        Ok(value)
    }

    /// Reads a length or count field and checks it against the limits.
    fn read_count(&mut self) -> Result<usize> {
        let count = self.reader.read_length()?;
        self.limits.check_length(count)?;
        Ok(count)
    }

    fn read_blob(&mut self) -> Result<&'a [u8]> {
        let length = self.read_count()?;
        self.reader.read_bytes(length)
    }

    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_blob()?;
        let s = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
        Ok(s.to_owned())
    }

    /// Capacity hint that never exceeds what the buffer could hold.
    fn capacity_for(&self, count: usize) -> usize {
        count.min(self.reader.remaining())
    }

    fn decode_object(&mut self, depth: usize) -> Result<Object> {
        self.limits.check_depth(depth)?;
        let count = self.read_count()?;
        let mut obj = Object::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            let key = self.read_string()?;
            let value = self.decode_value(depth)?;
            match obj.entry(key) {
                Entry::Occupied(entry) => return Err(duplicate_key(entry.key())),
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }
        Ok(obj)
    }

    fn decode_array(&mut self, depth: usize) -> Result<Vec<Value>> {
        self.limits.check_depth(depth)?;
        let count = self.read_count()?;
        let mut items = Vec::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            items.push(self.decode_value(depth)?);
        }
        Ok(items)
    }

    fn decode_map(&mut self, depth: usize) -> Result<ValueMap> {
        self.limits.check_depth(depth)?;
        let count = self.read_count()?;
        let mut map = ValueMap::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            let key = self.decode_value(depth)?;
            let value = self.decode_value(depth)?;
            match map.entry(key) {
                Entry::Occupied(entry) => return Err(duplicate_key(entry.key())),
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }
        Ok(map)
    }

    fn decode_date(&mut self) -> Result<Value> {
        let millis = self.reader.read_float64()?;
        if !millis.is_finite() {
            return Err(Error::InvalidDate(millis));
        }
        DateTime::<Utc>::from_timestamp_millis(millis.trunc() as i64)
            .map(Value::Date)
            .ok_or(Error::InvalidDate(millis))
    }

    fn decode_custom(&mut self, byte: u8) -> Result<Value> {
        let registry = Arc::clone(&self.registry);
        let entry = registry.get(byte).ok_or_else(|| {
            debug!(tag = byte, position = self.reader.position() - 1, "unrecognized tag");
            Error::malformed_tag(byte, "registered custom type")
        })?;
        let payload = self.read_blob()?;
        debug!(tag = byte, len = payload.len(), "decoding custom value");
        entry.processor().decode(payload)
    }
}

fn duplicate_key(key: &impl std::fmt::Debug) -> Error {
    debug!(key = ?key, "duplicate key");
    Error::DuplicateKey(format!("{:?}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    #[rustfmt::skip]
    #[test]
    fn test_decode_simple_object() {
        let data = [
            Tag::Object as u8, Tag::Int8 as u8, 1,
            Tag::Int8 as u8, 2, b'i', b'd',
            Tag::Int8 as u8, 10,
        ];
        let mut decoder = Decoder::new(&data);
        let value = decoder.decode().unwrap();
        assert_eq!(value, Value::object([("id", Value::from(10))]));
        assert!(decoder.eof());

        // Exhausted decoder must not produce a phantom value.
        assert!(matches!(
            decoder.decode(),
            Err(Error::TruncatedBuffer { needed: 1, available: 0 })
        ));
    }

    #[test]
    fn test_decode_rejects_non_container_root() {
        let data = [Tag::Int8 as u8, 1];
        let mut decoder = Decoder::new(&data);
        assert!(matches!(
            decoder.decode(),
            Err(Error::MalformedTag { tag: 6, .. })
        ));
    }

    #[test]
    fn test_decode_unknown_tag() {
        let data = [Tag::Array as u8, Tag::Int8 as u8, 1, 200, Tag::Int8 as u8, 0];
        let mut decoder = Decoder::new(&data);
        assert!(matches!(
            decoder.decode(),
            Err(Error::MalformedTag { tag: 200, .. })
        ));
    }

    #[test]
    fn test_decode_int64_tag_rejected() {
        let data = [Tag::Array as u8, Tag::Int8 as u8, 1, Tag::Int64 as u8, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut decoder = Decoder::new(&data);
        assert!(matches!(
            decoder.decode(),
            Err(Error::MalformedTag { tag: 12, .. })
        ));
    }

    #[test]
    fn test_decode_invalid_boolean() {
        let data = [Tag::Array as u8, Tag::Int8 as u8, 1, Tag::Boolean as u8, 2];
        let mut decoder = Decoder::new(&data);
        assert!(matches!(decoder.decode(), Err(Error::InvalidBoolean(2))));
    }

    #[test]
    fn test_decode_invalid_date() {
        let mut data = vec![Tag::Array as u8, Tag::Int8 as u8, 1, Tag::Date as u8];
        data.extend_from_slice(&f64::NAN.to_le_bytes());
        let mut decoder = Decoder::new(&data);
        assert!(matches!(decoder.decode(), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_decode_truncated_everywhere() {
        let value = Value::object([
            ("name", Value::from("Cristóvão Galvão")),
            ("ratio", Value::from(0.25)),
            ("blob", Value::Buffer(vec![1, 2, 3, 4])),
            ("list", Value::Array(vec![Value::from(70000), Value::from(true)])),
        ]);
        let data = Encoder::new().encode(&value).unwrap();

        for len in 0..data.len() {
            let mut decoder = Decoder::new(&data[..len]);
            assert!(
                matches!(decoder.decode(), Err(Error::TruncatedBuffer { .. })),
                "prefix of {} bytes should be truncated",
                len
            );
        }
        assert_eq!(Decoder::new(&data).decode().unwrap(), value);
    }

    #[test]
    fn test_decode_length_limit() {
        let value = Value::Array(vec![Value::from("a fairly long string")]);
        let data = Encoder::new().encode(&value).unwrap();

        let mut decoder = Decoder::new(&data).with_limits(Limits::new().max_length(8));
        assert!(matches!(
            decoder.decode(),
            Err(Error::LengthLimitExceeded { length: 20, limit: 8 })
        ));
    }

    #[test]
    fn test_decode_huge_count_does_not_preallocate() {
        // Claims 4294967295 elements but holds none.
        let data = [Tag::Array as u8, Tag::UInt32 as u8, 0xff, 0xff, 0xff, 0xff];
        let mut decoder = Decoder::new(&data).with_limits(Limits::new().max_length(usize::MAX));
        assert!(matches!(
            decoder.decode(),
            Err(Error::TruncatedBuffer { .. })
        ));
    }

    #[test]
    fn test_decode_depth_limit() {
        let mut data = Vec::new();
        for _ in 0..10 {
            data.extend_from_slice(&[Tag::Array as u8, Tag::Int8 as u8, 1]);
        }
        let mut decoder = Decoder::new(&data).with_limits(Limits::new().max_depth(3));
        assert!(matches!(
            decoder.decode(),
            Err(Error::DepthLimitExceeded(3))
        ));
    }

    #[rustfmt::skip]
    #[test]
    fn test_decode_duplicate_object_key() {
        let data = [
            Tag::Object as u8, Tag::Int8 as u8, 2,
            Tag::Int8 as u8, 1, b'a', Tag::Null as u8,
            Tag::Int8 as u8, 1, b'a', Tag::Undefined as u8,
        ];
        let mut decoder = Decoder::new(&data);
        assert!(matches!(
            decoder.decode(),
            Err(Error::DuplicateKey(key)) if key == "\"a\""
        ));
    }

    #[test]
    fn test_decode_map_nan_and_null_keys_collide() {
        // NaN is written as Null, so both keys arrive as Null.
        let value = Value::Array(vec![Value::map([
            (Value::Number(f64::NAN), Value::from(1)),
            (Value::Null, Value::from(2)),
        ])]);
        let data = Encoder::new().encode(&value).unwrap();

        let mut decoder = Decoder::new(&data);
        assert!(matches!(
            decoder.decode(),
            Err(Error::DuplicateKey(key)) if key == "Null"
        ));
    }

    #[test]
    fn test_decode_multiple_roots() {
        let mut encoder = Encoder::new();
        let mut data = encoder.encode(&Value::Array(vec![Value::from(1)])).unwrap();
        data.extend(encoder.encode(&Value::object([("a", Value::Null)])).unwrap());

        let mut decoder = Decoder::new(&data);
        assert_eq!(decoder.decode().unwrap(), Value::Array(vec![Value::from(1)]));
        assert!(!decoder.eof());
        assert_eq!(decoder.decode().unwrap(), Value::object([("a", Value::Null)]));
        assert!(decoder.eof());
        assert_eq!(decoder.remaining(), 0);
    }
}
