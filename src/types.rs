//! Wire format tags and numeric width selection.

/// Tags used in the BinObject encoding format.
///
/// Every value on the wire starts with one of these bytes. Any byte outside
/// the reserved range is a custom-type tag resolved through the
/// [`Registry`](crate::Registry).
///
/// Note: `Int64` and `UInt64` keep their wire numbers but are never
/// written; decoding them is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// String-keyed mapping.
    Object = 1,
    /// UTF-8 text, length-prefixed.
    String = 2,
    /// Epoch milliseconds as a little-endian f64.
    Date = 3,
    /// Ordered sequence, count-prefixed.
    Array = 4,
    Null = 5,
    Int8 = 6,
    UInt8 = 7,
    Int16 = 8,
    UInt16 = 9,
    Int32 = 10,
    UInt32 = 11,
    Int64 = 12,
    UInt64 = 13,
    Boolean = 14,
    Undefined = 15,
    /// Associative container with arbitrary key kinds.
    Map = 16,
    /// Byte blob with buffer-identity semantics.
    Buffer = 17,
    /// Byte blob with generic-memory semantics.
    ArrayBuffer = 18,
    /// Little-endian IEEE 754 f64.
    Double = 19,
}

/// Highest reserved tag byte. Custom tags must be strictly greater.
pub const MAX_RESERVED_TAG: u8 = Tag::Double as u8;

/// Conventional first tag for user types.
pub const FIRST_USER_TAG: u8 = 128;

impl Tag {
    /// Converts a u8 to a Tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Tag::Object),
            2 => Some(Tag::String),
            3 => Some(Tag::Date),
            4 => Some(Tag::Array),
            5 => Some(Tag::Null),
            6 => Some(Tag::Int8),
            7 => Some(Tag::UInt8),
            8 => Some(Tag::Int16),
            9 => Some(Tag::UInt16),
            10 => Some(Tag::Int32),
            11 => Some(Tag::UInt32),
            12 => Some(Tag::Int64),
            13 => Some(Tag::UInt64),
            14 => Some(Tag::Boolean),
            15 => Some(Tag::Undefined),
            16 => Some(Tag::Map),
            17 => Some(Tag::Buffer),
            18 => Some(Tag::ArrayBuffer),
            19 => Some(Tag::Double),
            _ => None,
        }
    }

    /// Returns true if the byte belongs to the built-in vocabulary
    /// (including 0, which is never a valid tag).
    #[inline]
    pub fn is_reserved(value: u8) -> bool {
        value <= MAX_RESERVED_TAG
    }

    /// Returns true for the six fixed-width integer tags.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Tag::Int8 | Tag::UInt8 | Tag::Int16 | Tag::UInt16 | Tag::Int32 | Tag::UInt32
        )
    }
}

/// Selects the narrowest integer tag for an integral value.
///
/// Ranges are tested in a fixed order that is part of the wire contract:
/// i8, u8, u16, i16, u32, i32. Returns `None` when the value needs more
/// than 32 bits.
pub fn integer_tag(value: i64) -> Option<Tag> {
    if (-0x80..=0x7f).contains(&value) {
        Some(Tag::Int8)
    } else if (0..=0xff).contains(&value) {
        Some(Tag::UInt8)
    } else if (0..=0xffff).contains(&value) {
        Some(Tag::UInt16)
    } else if (-0x8000..=0x7fff).contains(&value) {
        Some(Tag::Int16)
    } else if (0..=0xffff_ffff).contains(&value) {
        Some(Tag::UInt32)
    } else if (-0x8000_0000..=0x7fff_ffff).contains(&value) {
        Some(Tag::Int32)
    } else {
        None
    }
}

/// Returns true if the number has no fractional part and is finite.
#[inline]
pub fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}
