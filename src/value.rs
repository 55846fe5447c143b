//! Dynamically-typed value tree.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// String-keyed mapping, iterated in insertion order.
pub type Object = IndexMap<String, Value>;

/// Associative container with arbitrary key kinds, iterated in insertion order.
pub type ValueMap = IndexMap<Value, Value>;

/// A value that can be encoded.
///
/// Equality follows map-key semantics: numbers are equal when they have the
/// same value, with `NaN == NaN` and `0.0 == -0.0`; containers compare
/// structurally (objects ignore key order); custom values compare by
/// identity. This makes `Value` usable as a [`ValueMap`] key.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    /// "No value supplied", kept distinct from `Null` on the wire.
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    /// Millisecond-precision instant.
    Date(DateTime<Utc>),
    /// Byte blob with buffer-identity semantics.
    Buffer(Vec<u8>),
    /// Byte blob with generic-memory semantics.
    ArrayBuffer(Vec<u8>),
    Array(Vec<Value>),
    Object(Object),
    Map(ValueMap),
    /// Application-defined value handled by a registered processor.
    Custom(Custom),
}

/// Type-erased application value carried inside a [`Value`].
///
/// Cloning shares the underlying allocation, so clones are equal to each
/// other while separately constructed instances are not.
#[derive(Clone)]
pub struct Custom {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Custom {
    /// Wraps a host value.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared host value.
    pub fn from_arc<T>(value: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns true if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Custom) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Custom({})", self.type_name)
    }
}

impl PartialEq for Custom {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Custom {}

impl Hash for Custom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

/// Bit pattern used for hashing so that equal numbers hash equally.
fn number_key(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

fn same_value_zero(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => same_value_zero(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a == b,
            (Value::ArrayBuffer(a), Value::ArrayBuffer(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null | Value::Undefined => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => number_key(*n).hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Buffer(b) | Value::ArrayBuffer(b) => b.hash(state),
            Value::Array(items) => items.hash(state),
            // Equality ignores entry order, so only the size is hashed.
            Value::Object(obj) => obj.len().hash(state),
            Value::Map(map) => map.len().hash(state),
            Value::Custom(c) => c.hash(state),
        }
    }
}

impl Value {
    /// Wraps a host value as a custom value.
    pub fn custom<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Value::Custom(Custom::new(value))
    }

    /// Builds an object from key/value pairs, preserving order.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds an associative map from key/value pairs, preserving order.
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::Map(entries.into_iter().collect())
    }

    /// Returns the runtime type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Buffer(_) => "buffer",
            Value::ArrayBuffer(_) => "arraybuffer",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Custom(c) => c.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as an integer if it is integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if crate::types::is_integral(*n) => {
                if *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the bytes of either blob kind.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Buffer(b) | Value::ArrayBuffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&Custom> {
        match self {
            Value::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// Borrows a custom value as its concrete type.
    pub fn downcast_custom<T: Any>(&self) -> Option<&T> {
        self.as_custom().and_then(|c| c.downcast_ref::<T>())
    }

    /// Looks up a key in an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Number(v as f64)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Buffer(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

impl From<Custom> for Value {
    fn from(v: Custom) -> Self {
        Value::Custom(v)
    }
}
