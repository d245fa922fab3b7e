//! Compact error type for protobuf decoding.
//!
//! All bit manipulation in this module is intentional for packing error info
//! into a single 64-bit value for register returns.

#![allow(clippy::as_conversions)]

use core::fmt;
use core::num::NonZeroU64;

/// Decode error type packed into 8 bytes.
///
/// # Layout
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────┐
/// │ 63       56 │ 55                                              0 │
/// │   kind (8)  │              context (56 bits)                    │
/// └─────────────────────────────────────────────────────────────────┘
/// ```
///
/// - Bits 56-63: Error kind discriminant (1-255, 0 reserved for niche)
/// - Bits 0-55: Context data (interpretation depends on kind)
///
/// This error type is exactly 8 bytes ([`NonZeroU64`]) which enables
/// `Result<T, DecodeError>` to be returned entirely in registers.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct DecodeError(NonZeroU64);

crate::util::assert_eq_size!(Result<u64, DecodeError>, [u8; 16]);
crate::util::assert_eq_size!(Option<DecodeError>, DecodeError);

/// Error kind discriminants (stored in upper 8 bits).
///
/// Values start at 1 because 0 is reserved for niche optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    InvalidWireType = 1,
    InvalidKey = 2,
    InvalidVarInt = 3,
    UnexpectedEndOfBuffer = 4,
    DeprecatedGroupEncoding = 5,
    LengthOverflow = 6,
    TypeMismatch = 7,
    NotSingular = 8,
    NotRepeated = 9,
    InvalidMapEntry = 10,
    EmptyMapElems = 11,
    InvalidPackedLength = 12,
}

/// Reason codes for [`ErrorKind::InvalidKey`] errors (stored in context bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InvalidKeyReason {
    EmptyBuffer = 1,
    TagOutOfRange = 2,
}

/// Reason codes for [`ErrorKind::InvalidMapEntry`] errors (stored in context bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InvalidMapEntryReason {
    UnknownTag = 1,
    OutOfOrder = 2,
}

const KIND_SHIFT: u32 = 56;
const CONTEXT_MASK: u64 = (1 << KIND_SHIFT) - 1;

impl DecodeError {
    #[inline(always)]
    const fn new(kind: ErrorKind, context: u64) -> Self {
        let value = ((kind as u64) << KIND_SHIFT) | (context & CONTEXT_MASK);
        // SAFETY: kind is always >= 1, so the upper byte is never 0
        Self(unsafe { NonZeroU64::new_unchecked(value) })
    }

    #[inline(always)]
    const fn new_simple(kind: ErrorKind) -> Self {
        Self::new(kind, 0)
    }

    /// Extracts the [`ErrorKind`].
    #[inline(always)]
    pub const fn kind(&self) -> ErrorKind {
        let kind_byte = (self.0.get() >> KIND_SHIFT) as u8;
        // SAFETY: We only construct with valid ErrorKind values
        unsafe { core::mem::transmute::<u8, ErrorKind>(kind_byte) }
    }

    #[inline(always)]
    const fn context(&self) -> u64 {
        self.0.get() & CONTEXT_MASK
    }

    /// Construct an "invalid wire type" error with the provided value as context.
    #[cold]
    #[inline(never)]
    pub const fn invalid_wire_type(value: u8) -> Self {
        Self::new(ErrorKind::InvalidWireType, value as u64)
    }

    /// Construct an "invalid key" error with [`InvalidKeyReason`] as context.
    #[cold]
    #[inline(never)]
    pub const fn invalid_key(reason: InvalidKeyReason) -> Self {
        Self::new(ErrorKind::InvalidKey, reason as u64)
    }

    /// Encountered an invalid varint.
    #[cold]
    #[inline(never)]
    pub const fn invalid_varint() -> Self {
        Self::new_simple(ErrorKind::InvalidVarInt)
    }

    /// Unexpectedly reached the end of a buffer.
    #[cold]
    #[inline(never)]
    pub const fn unexpected_end_of_buffer() -> Self {
        Self::new_simple(ErrorKind::UnexpectedEndOfBuffer)
    }

    /// A deprecated group encoding encountered.
    #[cold]
    #[inline(never)]
    pub const fn deprecated_group_encoding() -> Self {
        Self::new_simple(ErrorKind::DeprecatedGroupEncoding)
    }

    /// Length prefix exceeds platform addressable memory.
    #[cold]
    #[inline(never)]
    pub const fn length_overflow(value: u64) -> Self {
        Self::new(ErrorKind::LengthOverflow, value)
    }

    /// A field's wire type doesn't match the projection being applied to it.
    #[cold]
    #[inline(never)]
    pub const fn type_mismatch() -> Self {
        Self::new_simple(ErrorKind::TypeMismatch)
    }

    /// `get_singular` found two or more records for a tag.
    #[cold]
    #[inline(never)]
    pub const fn not_singular(tag: u32) -> Self {
        Self::new(ErrorKind::NotSingular, tag as u64)
    }

    /// `get_repeated` found exactly one record for a tag.
    #[cold]
    #[inline(never)]
    pub const fn not_repeated(tag: u32) -> Self {
        Self::new(ErrorKind::NotRepeated, tag as u64)
    }

    /// A map entry sub-message carried an inner tag other than 1 or 2, or
    /// carried them out of order.
    #[cold]
    #[inline(never)]
    pub const fn invalid_map_entry(reason: InvalidMapEntryReason) -> Self {
        Self::new(ErrorKind::InvalidMapEntry, reason as u64)
    }

    /// Attempted to materialize a map from zero entries.
    #[cold]
    #[inline(never)]
    pub const fn empty_map_elems() -> Self {
        Self::new_simple(ErrorKind::EmptyMapElems)
    }

    /// Invalid packed field length.
    #[cold]
    #[inline(never)]
    pub const fn invalid_packed_length(expected_multiple: u8, actual: u32) -> Self {
        let context = ((expected_multiple as u64) << 32) | (actual as u64);
        Self::new(ErrorKind::InvalidPackedLength, context)
    }

    /// Get the context for an [`ErrorKind::InvalidWireType`] error.
    pub(crate) const fn wire_type_value(&self) -> Option<u8> {
        if matches!(self.kind(), ErrorKind::InvalidWireType) {
            Some(self.context() as u8)
        } else {
            None
        }
    }

    /// Get the context for an [`ErrorKind::InvalidKey`] error.
    pub(crate) const fn invalid_key_reason(&self) -> Option<InvalidKeyReason> {
        if matches!(self.kind(), ErrorKind::InvalidKey) {
            let reason = self.context() as u8;
            // SAFETY: We only store valid InvalidKeyReason values
            Some(unsafe { core::mem::transmute::<u8, InvalidKeyReason>(reason) })
        } else {
            None
        }
    }

    /// Get the context for an [`ErrorKind::LengthOverflow`] error.
    pub(crate) const fn overflow_value(&self) -> Option<u64> {
        if matches!(self.kind(), ErrorKind::LengthOverflow) {
            Some(self.context())
        } else {
            None
        }
    }

    /// Get the context for an [`ErrorKind::NotSingular`] error.
    pub(crate) const fn not_singular_tag(&self) -> Option<u32> {
        if matches!(self.kind(), ErrorKind::NotSingular) {
            Some(self.context() as u32)
        } else {
            None
        }
    }

    /// Get the context for an [`ErrorKind::NotRepeated`] error.
    pub(crate) const fn not_repeated_tag(&self) -> Option<u32> {
        if matches!(self.kind(), ErrorKind::NotRepeated) {
            Some(self.context() as u32)
        } else {
            None
        }
    }

    /// Get the context for an [`ErrorKind::InvalidMapEntry`] error.
    pub(crate) const fn invalid_map_entry_reason(&self) -> Option<InvalidMapEntryReason> {
        if matches!(self.kind(), ErrorKind::InvalidMapEntry) {
            let reason = self.context() as u8;
            Some(unsafe { core::mem::transmute::<u8, InvalidMapEntryReason>(reason) })
        } else {
            None
        }
    }

    /// Get the context for an [`ErrorKind::InvalidPackedLength`] error.
    pub(crate) const fn packed_length_values(&self) -> Option<(u8, u32)> {
        if matches!(self.kind(), ErrorKind::InvalidPackedLength) {
            let ctx = self.context();
            let expected = (ctx >> 32) as u8;
            let actual = ctx as u32;
            Some((expected, actual))
        } else {
            None
        }
    }
}

impl fmt::Debug for DecodeError {
    #[cold]
    #[inline(never)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("DecodeError");
        d.field("kind", &self.kind());

        match self.kind() {
            ErrorKind::InvalidWireType => {
                d.field("value", &self.wire_type_value().unwrap());
            }
            ErrorKind::InvalidKey => {
                d.field("reason", &self.invalid_key_reason().unwrap());
            }
            ErrorKind::LengthOverflow => {
                d.field("value", &self.overflow_value().unwrap());
            }
            ErrorKind::NotSingular => {
                d.field("tag", &self.not_singular_tag().unwrap());
            }
            ErrorKind::NotRepeated => {
                d.field("tag", &self.not_repeated_tag().unwrap());
            }
            ErrorKind::InvalidMapEntry => {
                d.field("reason", &self.invalid_map_entry_reason().unwrap());
            }
            ErrorKind::InvalidPackedLength => {
                let (mult, actual) = self.packed_length_values().unwrap();
                d.field("expected_multiple", &mult);
                d.field("actual", &actual);
            }
            _ => {}
        }

        d.finish()
    }
}

impl fmt::Display for DecodeError {
    #[cold]
    #[inline(never)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ErrorKind::InvalidWireType => {
                write!(f, "invalid wire type value: {}", self.context() as u8)
            }
            ErrorKind::InvalidKey => {
                let reason = match self.invalid_key_reason() {
                    Some(InvalidKeyReason::EmptyBuffer) => "empty buffer",
                    Some(InvalidKeyReason::TagOutOfRange) => "tag out of range",
                    None => "unknown",
                };
                write!(f, "invalid key: {reason}")
            }
            ErrorKind::InvalidVarInt => {
                write!(f, "invalid leb128 varint")
            }
            ErrorKind::UnexpectedEndOfBuffer => {
                write!(f, "unexpected end of buffer")
            }
            ErrorKind::DeprecatedGroupEncoding => {
                write!(f, "deprecated group encoding not supported")
            }
            ErrorKind::LengthOverflow => {
                write!(
                    f,
                    "length prefix {} exceeds platform addressable memory",
                    self.context()
                )
            }
            ErrorKind::TypeMismatch => {
                write!(f, "field's wire type does not match the requested projection")
            }
            ErrorKind::NotSingular => {
                write!(
                    f,
                    "tag {} has more than one record but was read as singular",
                    self.not_singular_tag().unwrap()
                )
            }
            ErrorKind::NotRepeated => {
                write!(
                    f,
                    "tag {} has exactly one record but was read as repeated",
                    self.not_repeated_tag().unwrap()
                )
            }
            ErrorKind::InvalidMapEntry => {
                let reason = match self.invalid_map_entry_reason() {
                    Some(InvalidMapEntryReason::UnknownTag) => "tag other than 1 or 2",
                    Some(InvalidMapEntryReason::OutOfOrder) => "value (tag 2) before key (tag 1)",
                    None => "unknown",
                };
                write!(f, "invalid map entry: {reason}")
            }
            ErrorKind::EmptyMapElems => {
                write!(f, "cannot materialize a map from zero entries")
            }
            ErrorKind::InvalidPackedLength => {
                let (mult, actual) = self.packed_length_values().unwrap();
                write!(
                    f,
                    "invalid packed field length: {actual} is not a multiple of {mult}"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
