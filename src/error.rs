//! Error types for BinObject operations.

use thiserror::Error;

/// Result type for BinObject operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for BinObject operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No built-in rule or registered processor can represent the value.
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    /// Integral number outside the 32-bit ranges.
    #[error("integer {0} does not fit in 32 bits")]
    IntegerOverflow(f64),

    /// Malformed custom-type registration.
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    /// Read past the end of the buffer.
    #[error("truncated buffer: needed {needed} bytes, only {available} available")]
    TruncatedBuffer { needed: usize, available: usize },

    /// Tag byte not valid at this position.
    #[error("malformed tag {tag}: expected {expected}")]
    MalformedTag { tag: u8, expected: &'static str },

    /// Negative length or count field.
    #[error("invalid length: {0}")]
    InvalidLength(f64),

    /// Boolean payload other than 0 or 1.
    #[error("invalid boolean byte: {0}")]
    InvalidBoolean(u8),

    /// Date payload that is not a representable instant.
    #[error("invalid date: {0} ms since epoch")]
    InvalidDate(f64),

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Object or map that repeats a key.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Container nesting deeper than the configured limit.
    #[error("nesting depth exceeds limit of {0}")]
    DepthLimitExceeded(usize),

    /// Declared length larger than the configured limit.
    #[error("length {length} exceeds limit of {limit}")]
    LengthLimitExceeded { length: usize, limit: usize },

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a truncated buffer error.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedBuffer { needed, available }
    }

    /// Creates a malformed tag error.
    pub fn malformed_tag(tag: u8, expected: &'static str) -> Self {
        Self::MalformedTag { tag, expected }
    }

    /// Creates a custom error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}
