//! The generic, schemaless representation of a single decoded protobuf record.

use bytes::Bytes;

use crate::wire::WireType;

/// The raw payload of a decoded field, before any caller-supplied projection
/// is applied.
///
/// [`RawValue::Bytes`] is a zero-copy slice of the original input: cloning a
/// [`bytes::Bytes`] only bumps a reference count, it never copies the
/// underlying storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Payload of a [`WireType::Varint`] field.
    Varint(u64),
    /// Payload of a [`WireType::I32`] field.
    Fixed32(u32),
    /// Payload of a [`WireType::I64`] field.
    Fixed64(u64),
    /// Payload of a [`WireType::Len`] field.
    Bytes(Bytes),
}

/// A single decoded record: the tag and wire type read from the key, paired
/// with the raw payload that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub tag: u32,
    pub wire_type: WireType,
    pub raw: RawValue,
}

impl Value {
    #[inline]
    pub(crate) fn new(tag: u32, wire_type: WireType, raw: RawValue) -> Self {
        Value {
            tag,
            wire_type,
            raw,
        }
    }
}
