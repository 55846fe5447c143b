//! BinObject - self-describing binary serialization for dynamically-typed values
//!
//! Values are trees of objects, arrays, maps, strings, numbers, dates and
//! byte blobs. Every value on the wire starts with a one-byte tag, and
//! integers are written at the narrowest width that holds them.
//! Application types plug in through a [`Registry`] of custom processors.
//!
//! # Example
//!
//! ```rust
//! use binobject::{Decoder, Encoder, Result, Value};
//!
//! fn main() -> Result<()> {
//!     let value = Value::object([
//!         ("id", Value::from(10)),
//!         ("name", Value::from("Cristóvão Galvão")),
//!         ("missing", Value::Undefined),
//!     ]);
//!
//!     // Encoding
//!     let data = Encoder::new().encode(&value)?;
//!
//!     // Decoding
//!     let mut decoder = Decoder::new(&data);
//!     assert_eq!(decoder.decode()?, value);
//!     assert!(decoder.eof());
//!     Ok(())
//! }
//! ```

mod codec;
mod config;
mod decoder;
mod encoder;
mod error;
pub mod json;
mod reader;
mod registry;
mod types;
mod value;
mod writer;

pub use codec::{BinaryObject, Codec};
pub use config::{Limits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LENGTH};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use reader::Reader;
pub use registry::{CustomTypeProcessor, DecodeFn, EncodeFn, Registration, Registry};
pub use types::{Tag, FIRST_USER_TAG, MAX_RESERVED_TAG};
pub use value::{Custom, Object, Value, ValueMap};
pub use writer::Writer;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encodes a root array or object with no custom types.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Encoder::new().encode(value)
}

/// Decodes the first root value in `data` with no custom types.
pub fn decode(data: &[u8]) -> Result<Value> {
    Decoder::new(data).decode()
}

/// Marshal builds a custom-type payload using a writer.
pub fn marshal<F>(build: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut Writer) -> Result<()>,
{
    let mut writer = Writer::new();
    build(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Unmarshal parses a custom-type payload using a reader.
pub fn unmarshal<T, F>(data: &[u8], parse: F) -> Result<T>
where
    F: FnOnce(&mut Reader) -> Result<T>,
{
    let mut reader = Reader::new(data);
    parse(&mut reader)
}
