//! Custom type registry for application-defined value kinds.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Tag;
use crate::value::{Custom, Value};

/// Processor for one application-defined value kind.
///
/// On encode, processors are probed in registration order and the first
/// one whose `validate` returns true produces the payload. On decode the
/// tag byte selects the processor directly.
pub trait CustomTypeProcessor: Send + Sync {
    /// Returns true if this processor claims the value.
    fn validate(&self, value: &Custom) -> bool;

    /// Produces the payload bytes for a validated value.
    fn encode(&self, value: &Custom) -> Result<Vec<u8>>;

    /// Rebuilds a value from a payload produced by `encode`.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// Encoder function type.
pub type EncodeFn<T> = fn(&T) -> Result<Vec<u8>>;

/// Decoder function type.
pub type DecodeFn<T> = fn(&[u8]) -> Result<T>;

/// Processor built from a pair of typed functions; claims every `T`.
struct TypedProcessor<T> {
    encoder: EncodeFn<T>,
    decoder: DecodeFn<T>,
}

impl<T> CustomTypeProcessor for TypedProcessor<T>
where
    T: Any + Send + Sync,
{
    fn validate(&self, value: &Custom) -> bool {
        value.is::<T>()
    }

    fn encode(&self, value: &Custom) -> Result<Vec<u8>> {
        let typed = value.downcast_ref::<T>().ok_or_else(|| {
            Error::custom(format!(
                "type mismatch: expected {}, got {}",
                std::any::type_name::<T>(),
                value.type_name()
            ))
        })?;
        (self.encoder)(typed)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let value = (self.decoder)(bytes)?;
        Ok(Value::custom(value))
    }
}

/// A tag bound to its processor.
#[derive(Clone)]
pub struct Registration {
    tag: u8,
    processor: Arc<dyn CustomTypeProcessor>,
}

impl Registration {
    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn processor(&self) -> &dyn CustomTypeProcessor {
        &*self.processor
    }
}

/// Registry holds the custom types shared by an encoder and its decoder.
///
/// Tags are the coupling contract: a decoder needs a registry with the same
/// tag numbers as the encoder that produced the buffer, not the same
/// instance. Build it once, then share it read-only behind an `Arc`.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Vec<Registration>,
    by_tag: HashMap<u8, usize>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `(tag, processor)` pairs, in order.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, Arc<dyn CustomTypeProcessor>)>,
    {
        let mut registry = Self::new();
        for (tag, processor) in entries {
            registry.register_arc(tag, processor)?;
        }
        Ok(registry)
    }

    /// Registers a processor under a tag.
    ///
    /// Fails with [`Error::InvalidRegistry`] if the tag is reserved by the
    /// built-in vocabulary or already registered.
    pub fn register<P>(&mut self, tag: u8, processor: P) -> Result<&mut Self>
    where
        P: CustomTypeProcessor + 'static,
    {
        self.register_arc(tag, Arc::new(processor))
    }

    /// Registers a shared processor under a tag.
    pub fn register_arc(
        &mut self,
        tag: u8,
        processor: Arc<dyn CustomTypeProcessor>,
    ) -> Result<&mut Self> {
        if Tag::is_reserved(tag) {
            return Err(Error::InvalidRegistry(format!(
                "tag {} is reserved for built-in types",
                tag
            )));
        }
        if self.by_tag.contains_key(&tag) {
            return Err(Error::InvalidRegistry(format!(
                "tag {} is registered twice",
                tag
            )));
        }

        self.by_tag.insert(tag, self.entries.len());
        self.entries.push(Registration { tag, processor });
        Ok(self)
    }

    /// Registers a Rust type with typed encode/decode functions.
    ///
    /// The generated processor validates by downcasting, so it claims every
    /// [`Custom`] wrapping a `T`.
    pub fn register_type<T>(
        &mut self,
        tag: u8,
        encoder: EncodeFn<T>,
        decoder: DecodeFn<T>,
    ) -> Result<&mut Self>
    where
        T: Any + Send + Sync,
    {
        self.register(tag, TypedProcessor { encoder, decoder })
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks if a tag is registered.
    pub fn contains(&self, tag: u8) -> bool {
        self.by_tag.contains_key(&tag)
    }

    /// Looks up the registration for a tag.
    pub fn get(&self, tag: u8) -> Option<&Registration> {
        self.by_tag.get(&tag).map(|&index| &self.entries[index])
    }

    /// Returns the first registration, in order, whose processor claims the value.
    pub fn find(&self, value: &Custom) -> Option<&Registration> {
        self.entries
            .iter()
            .find(|entry| entry.processor.validate(value))
    }

    /// Iterates over registered tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().map(|entry| entry.tag)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags().collect::<Vec<_>>())
            .finish()
    }
}
