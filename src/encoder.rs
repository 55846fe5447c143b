//! Value tree encoder.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::types::Tag;
use crate::value::{Custom, Object, Value, ValueMap};
use crate::writer::Writer;

/// Encoder serializes a root array or object into a single byte buffer.
///
/// The scratch buffer is reset at the start of every call, so an encoder
/// can be reused for any number of values. It must not be shared between
/// threads without synchronization; the registry it holds can be.
pub struct Encoder {
    writer: Writer,
    registry: Arc<Registry>,
    limits: Limits,
}

impl Encoder {
    /// Creates an encoder with no custom types.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Creates an encoder that falls back to the given custom types.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            writer: Writer::new(),
            registry,
            limits: Limits::default(),
        }
    }

    /// Replaces the resource limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the custom type registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Encodes a root value.
    ///
    /// The root must be an array or an object; anything else fails with
    /// [`Error::UnsupportedType`].
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>> {
        self.writer.reset();
        match value {
            Value::Array(items) => self.encode_array(items, 1)?,
            Value::Object(obj) => self.encode_object(obj, 1)?,
            other => {
                return Err(Error::UnsupportedType(format!(
                    "{} at top level, expected array or object",
                    other.type_name()
                )))
            }
        }
        let bytes = self.writer.take_bytes();
        trace!(bytes = bytes.len(), "encoded value");
        Ok(bytes)
    }

    /// Encodes one value at the given container depth.
    fn encode_value(&mut self, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Null => self.writer.write_tag(Tag::Null),
            Value::Undefined => self.writer.write_tag(Tag::Undefined),
            Value::Buffer(bytes) => self.encode_blob(Tag::Buffer, bytes)?,
            Value::ArrayBuffer(bytes) => self.encode_blob(Tag::ArrayBuffer, bytes)?,
            Value::Map(map) => self.encode_map(map, depth + 1)?,
            Value::Date(date) => {
                self.writer.write_tag(Tag::Date);
                self.writer.write_float64(date.timestamp_millis() as f64);
            }
            Value::String(s) => {
                self.writer.write_tag(Tag::String);
                self.writer.write_string(s)?;
            }
            Value::Array(items) => self.encode_array(items, depth + 1)?,
            Value::Bool(b) => {
                self.writer.write_tag(Tag::Boolean);
                self.writer.write_bool(*b);
            }
            Value::Number(n) => self.writer.write_number(*n)?,
            Value::Object(obj) => self.encode_object(obj, depth + 1)?,
            Value::Custom(custom) => self.encode_custom(custom)?,
        }
        Ok(())
    }

    fn encode_blob(&mut self, tag: Tag, bytes: &[u8]) -> Result<()> {
        self.writer.write_tag(tag);
        self.writer.write_length_prefixed_bytes(bytes)
    }

    fn encode_array(&mut self, items: &[Value], depth: usize) -> Result<()> {
        self.limits.check_depth(depth)?;
        self.writer.write_tag(Tag::Array);
        self.writer.write_length(items.len())?;
        for item in items {
            self.encode_value(item, depth)?;
        }
        Ok(())
    }

    fn encode_object(&mut self, obj: &Object, depth: usize) -> Result<()> {
        self.limits.check_depth(depth)?;
        self.writer.write_tag(Tag::Object);
        self.writer.write_length(obj.len())?;
        for (key, value) in obj {
            self.writer.write_string(key)?;
            self.encode_value(value, depth)?;
        }
        Ok(())
    }

    fn encode_map(&mut self, map: &ValueMap, depth: usize) -> Result<()> {
        self.limits.check_depth(depth)?;
        self.writer.write_tag(Tag::Map);
        self.writer.write_length(map.len())?;
        for (key, value) in map {
            self.encode_value(key, depth)?;
            self.encode_value(value, depth)?;
        }
        Ok(())
    }

    fn encode_custom(&mut self, custom: &Custom) -> Result<()> {
        let entry = self
            .registry
            .find(custom)
            .ok_or_else(|| Error::UnsupportedType(custom.type_name().to_string()))?;
        let payload = entry.processor().encode(custom)?;
        debug!(
            tag = entry.tag(),
            type_name = custom.type_name(),
            len = payload.len(),
            "encoded custom value"
        );
        self.writer.write_byte(entry.tag());
        self.writer.write_length_prefixed_bytes(&payload)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn encode(value: &Value) -> Result<Vec<u8>> {
        Encoder::new().encode(value)
    }

    #[rustfmt::skip]
    #[test]
    fn test_encode_simple_object() {
        let value = Value::object([("id", Value::from(10))]);
        assert_eq!(
            encode(&value).unwrap(),
            vec![
                Tag::Object as u8, Tag::Int8 as u8, 1,
                Tag::Int8 as u8, 2, b'i', b'd',
                Tag::Int8 as u8, 10,
            ]
        );
    }

    #[test]
    fn test_encode_root_must_be_container() {
        for value in [Value::from(1), Value::from("x"), Value::Null, Value::Map(ValueMap::new())] {
            assert!(matches!(encode(&value), Err(Error::UnsupportedType(_))));
        }
    }

    #[test]
    fn test_encode_null_undefined_distinct() {
        let value = Value::Array(vec![Value::Null, Value::Undefined]);
        assert_eq!(
            encode(&value).unwrap(),
            vec![Tag::Array as u8, Tag::Int8 as u8, 2, Tag::Null as u8, Tag::Undefined as u8]
        );
    }

    #[test]
    fn test_encode_date_fixed_width() {
        let date = Utc.timestamp_millis_opt(1524001014033).unwrap();
        let bytes = encode(&Value::Array(vec![Value::Date(date)])).unwrap();

        let mut expected = vec![Tag::Array as u8, Tag::Int8 as u8, 1, Tag::Date as u8];
        expected.extend_from_slice(&1524001014033f64.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[rustfmt::skip]
    #[test]
    fn test_encode_blobs_keep_kind() {
        let value = Value::Array(vec![
            Value::Buffer(vec![0xde, 0xad]),
            Value::ArrayBuffer(vec![0xbe]),
        ]);
        assert_eq!(
            encode(&value).unwrap(),
            vec![
                Tag::Array as u8, Tag::Int8 as u8, 2,
                Tag::Buffer as u8, Tag::Int8 as u8, 2, 0xde, 0xad,
                Tag::ArrayBuffer as u8, Tag::Int8 as u8, 1, 0xbe,
            ]
        );
    }

    #[test]
    fn test_encode_integer_overflow() {
        let value = Value::object([("big", Value::from(4294967296u64))]);
        assert!(matches!(encode(&value), Err(Error::IntegerOverflow(_))));
    }

    #[test]
    fn test_encode_unregistered_custom() {
        let value = Value::Array(vec![Value::custom(7u8)]);
        let err = encode(&value).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(name) if name == "u8"));
    }

    #[test]
    fn test_encoder_reusable_after_error() {
        let mut encoder = Encoder::new();
        assert!(encoder
            .encode(&Value::Array(vec![Value::from(1e12)]))
            .is_err());
        assert_eq!(
            encoder.encode(&Value::Array(vec![])).unwrap(),
            vec![Tag::Array as u8, Tag::Int8 as u8, 0]
        );
    }

    #[test]
    fn test_encode_depth_limit() {
        let mut value = Value::Array(vec![]);
        for _ in 0..4 {
            value = Value::Array(vec![value]);
        }
        let mut encoder = Encoder::new().with_limits(Limits::new().max_depth(4));
        assert!(matches!(
            encoder.encode(&value),
            Err(Error::DepthLimitExceeded(4))
        ));

        let mut encoder = Encoder::new().with_limits(Limits::new().max_depth(5));
        assert!(encoder.encode(&value).is_ok());
    }
}
