//! Scalar projection decoders.
//!
//! Each function here projects a single [`Value`] (or its absence) onto the
//! Rust type the caller expects for that protobuf scalar type, applying the
//! Proto3 default when the field wasn't present and erring on a wire-type
//! mismatch. None of these functions consult a schema; the caller picks
//! which one to call based on what they already know the field's type to be.

use bytes::Bytes;

use crate::error::DecodeError;
use crate::message::{decode, Message, SortPolicy};
use crate::util::{ReinterpretCastFrom, TruncatingCastFrom};
use crate::value::{RawValue, Value};
use crate::wire::{zigzag_decode_32, zigzag_decode_64};

#[inline]
fn varint(value: Option<&Value>) -> Result<u64, DecodeError> {
    match value.map(|v| &v.raw) {
        None => Ok(0),
        Some(RawValue::Varint(v)) => Ok(*v),
        Some(_) => Err(DecodeError::type_mismatch()),
    }
}

#[inline]
fn fixed32(value: Option<&Value>) -> Result<u32, DecodeError> {
    match value.map(|v| &v.raw) {
        None => Ok(0),
        Some(RawValue::Fixed32(v)) => Ok(*v),
        Some(_) => Err(DecodeError::type_mismatch()),
    }
}

#[inline]
fn fixed64(value: Option<&Value>) -> Result<u64, DecodeError> {
    match value.map(|v| &v.raw) {
        None => Ok(0),
        Some(RawValue::Fixed64(v)) => Ok(*v),
        Some(_) => Err(DecodeError::type_mismatch()),
    }
}

#[inline]
fn bytes_payload(value: Option<&Value>) -> Result<Bytes, DecodeError> {
    match value.map(|v| &v.raw) {
        None => Ok(Bytes::new()),
        Some(RawValue::Bytes(b)) => Ok(b.clone()),
        Some(_) => Err(DecodeError::type_mismatch()),
    }
}

/// Projects a `uint64` field.
pub fn uint64(value: Option<&Value>) -> Result<u64, DecodeError> {
    varint(value)
}

/// Projects a `uint32` field, truncating the underlying varint to 32 bits.
pub fn uint32(value: Option<&Value>) -> Result<u32, DecodeError> {
    Ok(u32::truncating_cast_from(varint(value)?))
}

/// Projects an `int64` field.
///
/// Truncation here is a no-op (the wire varint is already 64 bits) but the
/// cast is explicit for symmetry with [`int32`].
pub fn int64(value: Option<&Value>) -> Result<i64, DecodeError> {
    Ok(i64::reinterpret_cast_from(varint(value)?))
}

/// Projects an `int32` field by truncating the 64-bit varint payload to 32
/// bits.
///
/// A conformant encoder never produces an int32 field whose varint payload
/// doesn't fit in 32 bits once sign-extended, but a plain truncating cast
/// (rather than an overflow check) is the wire-correct behavior for
/// adversarial input too, matching how every major protobuf runtime treats
/// this field.
pub fn int32(value: Option<&Value>) -> Result<i32, DecodeError> {
    let v = i64::reinterpret_cast_from(varint(value)?);
    Ok(i32::truncating_cast_from(v))
}

/// Projects a `sint32` field (ZigZag-encoded signed 32-bit integer).
pub fn sint32(value: Option<&Value>) -> Result<i32, DecodeError> {
    #[allow(clippy::as_conversions)]
    Ok(zigzag_decode_32(varint(value)? as u32))
}

/// Projects a `sint64` field (ZigZag-encoded signed 64-bit integer).
pub fn sint64(value: Option<&Value>) -> Result<i64, DecodeError> {
    Ok(zigzag_decode_64(varint(value)?))
}

/// Projects a `bool` field: any non-zero varint is `true`.
pub fn bool_(value: Option<&Value>) -> Result<bool, DecodeError> {
    Ok(varint(value)? != 0)
}

/// Projects an `enum` field. Protobuf enums are always encoded as the
/// underlying `int32`.
pub fn enum_value(value: Option<&Value>) -> Result<i32, DecodeError> {
    int32(value)
}

/// Projects a `fixed32` field.
pub fn fixed32_value(value: Option<&Value>) -> Result<u32, DecodeError> {
    fixed32(value)
}

/// Projects a `fixed64` field.
pub fn fixed64_value(value: Option<&Value>) -> Result<u64, DecodeError> {
    fixed64(value)
}

/// Projects an `sfixed32` field.
///
/// Goes through an explicit signed bit-reinterpretation rather than reading
/// the payload as unsigned and handing it to a narrowing numeric cast, so
/// the top bit is always treated as sign rather than magnitude.
pub fn sfixed32(value: Option<&Value>) -> Result<i32, DecodeError> {
    Ok(i32::reinterpret_cast_from(fixed32(value)?))
}

/// Projects an `sfixed64` field, via explicit signed bit-reinterpretation.
pub fn sfixed64(value: Option<&Value>) -> Result<i64, DecodeError> {
    Ok(i64::reinterpret_cast_from(fixed64(value)?))
}

/// Projects a `float` field.
pub fn float(value: Option<&Value>) -> Result<f32, DecodeError> {
    Ok(f32::from_bits(fixed32(value)?))
}

/// Projects a `double` field.
pub fn double(value: Option<&Value>) -> Result<f64, DecodeError> {
    Ok(f64::from_bits(fixed64(value)?))
}

/// Projects a `bytes` field, zero-copy.
pub fn bytes(value: Option<&Value>) -> Result<Bytes, DecodeError> {
    bytes_payload(value)
}

/// Projects a `string` field.
///
/// Does not validate UTF-8: the wire format gives no guarantee the bytes are
/// valid UTF-8, and a schemaless decoder has no schema-level "this must be a
/// valid string" invariant to enforce. Use [`ProtoStr::to_str`] if the
/// caller wants that check performed explicitly.
pub fn string(value: Option<&Value>) -> Result<ProtoStr, DecodeError> {
    Ok(ProtoStr(bytes_payload(value)?))
}

/// Projects a singular embedded-message field, recursively decoding its
/// payload with the given [`SortPolicy`].
pub fn message(value: Option<&Value>, sort_policy: SortPolicy) -> Result<Message, DecodeError> {
    decode(bytes_payload(value)?, sort_policy)
}

/// A `string` field's raw bytes, not validated as UTF-8 at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtoStr(Bytes);

impl ProtoStr {
    /// Returns the raw bytes backing this string field.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Validates the bytes as UTF-8 and returns them as a `&str`.
    pub fn to_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::value::Value;
    use crate::wire::WireType;

    fn varint_value(tag: u32, v: u64) -> Value {
        Value::new(tag, WireType::Varint, RawValue::Varint(v))
    }

    #[test]
    fn test_defaults_on_absence() {
        assert_eq!(uint64(None).unwrap(), 0);
        assert_eq!(int32(None).unwrap(), 0);
        assert!(!bool_(None).unwrap());
        assert_eq!(float(None).unwrap(), 0.0);
        assert_eq!(bytes(None).unwrap(), Bytes::new());
        assert_eq!(string(None).unwrap().as_bytes(), b"");
    }

    #[test]
    fn test_type_mismatch() {
        let v = varint_value(1, 5);
        assert!(fixed32_value(Some(&v)).is_err());
        assert!(bytes(Some(&v)).is_err());
    }

    #[test]
    fn test_int32_truncates_rather_than_errors() {
        // A varint whose sign-extended i64 value doesn't fit in i32 still
        // decodes, truncated, rather than erroring.
        let v = varint_value(1, u64::MAX);
        assert_eq!(int32(Some(&v)).unwrap(), -1);
    }

    #[test]
    fn test_zigzag_projection() {
        let v = varint_value(1, 1);
        assert_eq!(sint32(Some(&v)).unwrap(), -1);
        assert_eq!(sint64(Some(&v)).unwrap(), -1);
    }

    #[test]
    fn test_sfixed_sign_reinterpretation() {
        let v = Value::new(1, WireType::I32, RawValue::Fixed32(u32::MAX));
        assert_eq!(sfixed32(Some(&v)).unwrap(), -1);

        let v = Value::new(1, WireType::I64, RawValue::Fixed64(u64::MAX));
        assert_eq!(sfixed64(Some(&v)).unwrap(), -1);
    }

    #[test]
    fn test_string_does_not_validate_utf8() {
        let invalid = vec![0xFFu8, 0xFE];
        let v = Value::new(
            1,
            WireType::Len,
            RawValue::Bytes(Bytes::from(invalid.clone())),
        );
        let s = string(Some(&v)).unwrap();
        assert_eq!(s.as_bytes(), &invalid[..]);
        assert!(s.to_str().is_err());
    }
}
