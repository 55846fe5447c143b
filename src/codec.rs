//! Codec facade.

use std::sync::Arc;

use crate::config::Limits;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::registry::Registry;
use crate::value::Value;

/// A complete encode/decode implementation.
///
/// Call sites that depend on `Codec` rather than a concrete type can switch
/// between interchangeable backends without changing.
pub trait Codec {
    /// Encodes a root array or object.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decodes the first root value in the buffer.
    fn decode(&self, data: &[u8]) -> Result<Value>;
}

/// BinaryObject bundles a registry and limits behind one encode/decode pair.
///
/// Each call builds a fresh [`Encoder`] or [`Decoder`], so a single
/// `BinaryObject` can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct BinaryObject {
    registry: Arc<Registry>,
    limits: Limits,
}

impl BinaryObject {
    /// Creates a codec with no custom types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec using the given custom types.
    pub fn with_registry(registry: impl Into<Arc<Registry>>) -> Self {
        Self {
            registry: registry.into(),
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

    /// Returns the resource limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Creates an encoder sharing this codec's registry and limits.
    pub fn encoder(&self) -> Encoder {
        Encoder::with_registry(Arc::clone(&self.registry)).with_limits(self.limits)
    }

    /// Creates a decoder over `data` sharing this codec's registry and limits.
    pub fn decoder<'a>(&self, data: &'a [u8]) -> Decoder<'a> {
        Decoder::with_registry(data, Arc::clone(&self.registry)).with_limits(self.limits)
    }

    /// Encodes several root values back to back into one buffer.
    pub fn encode_all(&self, values: &[Value]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder();
        let mut out = Vec::new();
        for value in values {
            out.extend(encoder.encode(value)?);
        }
        Ok(out)
    }

    /// Decodes root values until the buffer is exhausted.
    pub fn decode_all(&self, data: &[u8]) -> Result<Vec<Value>> {
        let mut decoder = self.decoder(data);
        let mut values = Vec::new();
        while !decoder.eof() {
            values.push(decoder.decode()?);
        }
        Ok(values)
    }
}

impl Codec for BinaryObject {
    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        self.encoder().encode(value)
    }

    fn decode(&self, data: &[u8]) -> Result<Value> {
        self.decoder(data).decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Tag;
    use crate::value::Custom;

    #[derive(Debug, PartialEq)]
    struct Tagged(u16);

    fn encode_tagged(value: &Tagged) -> Result<Vec<u8>> {
        Ok(value.0.to_le_bytes().to_vec())
    }

    fn decode_tagged(data: &[u8]) -> Result<Tagged> {
        crate::unmarshal(data, |reader| Ok(Tagged(reader.read_uint16()?)))
    }

    fn codec() -> BinaryObject {
        let mut registry = Registry::new();
        registry
            .register_type(150, encode_tagged, decode_tagged)
            .unwrap();
        BinaryObject::with_registry(registry)
    }

    #[test]
    fn test_codec_roundtrip_through_trait() {
        let codec: Box<dyn Codec> = Box::new(codec());
        let value = Value::object([
            ("tagged", Value::Custom(Custom::new(Tagged(513)))),
            ("plain", Value::from("text")),
        ]);

        let data = codec.encode(&value).unwrap();
        let decoded = codec.decode(&data).unwrap();

        assert_eq!(
            decoded.get("tagged").unwrap().downcast_custom::<Tagged>(),
            Some(&Tagged(513))
        );
        assert_eq!(decoded.get("plain"), Some(&Value::from("text")));
    }

    #[test]
    fn test_encode_all_decode_all() {
        let codec = codec();
        let values = vec![
            Value::Array(vec![Value::from(1)]),
            Value::object([("b", Value::Bool(false))]),
            Value::Array(vec![]),
        ];
        let data = codec.encode_all(&values).unwrap();
        assert_eq!(codec.decode_all(&data).unwrap(), values);
        assert!(codec.decode_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_all_trailing_garbage() {
        let codec = codec();
        let mut data = codec.encode(&Value::Array(vec![])).unwrap();
        data.push(Tag::Null as u8);
        assert!(matches!(
            codec.decode_all(&data),
            Err(Error::MalformedTag { tag: 5, .. })
        ));
    }

    #[test]
    fn test_limits_shared_with_encoder_and_decoder() {
        let codec = BinaryObject::new().with_limits(Limits::new().max_depth(1));
        let nested = Value::Array(vec![Value::Array(vec![])]);
        assert!(matches!(
            codec.encode(&nested),
            Err(Error::DepthLimitExceeded(1))
        ));

        let data = BinaryObject::new().encode(&nested).unwrap();
        assert!(matches!(
            codec.decode(&data),
            Err(Error::DepthLimitExceeded(1))
        ));
    }
}
