//! Packed-repeated decoders.
//!
//! A packed repeated field is encoded as a single [`WireType::Len`] record
//! whose payload is the concatenation of each element's raw (non-tagged)
//! encoding. For fixed-size types, batched pointer reads enable
//! auto-vectorization; for varint types, a fast/slow path split avoids
//! bounds-checking every element.

use alloc::vec::Vec;

use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::util::{ReinterpretCastFrom, TruncatingCastFrom};
use crate::value::{RawValue, Value};
use crate::wire::{zigzag_decode_32, zigzag_decode_64};

#[inline]
fn payload(value: Option<&Value>) -> Result<&[u8], DecodeError> {
    match value.map(|v| &v.raw) {
        None => Ok(&[]),
        Some(RawValue::Bytes(b)) => Ok(b.as_ref()),
        Some(_) => Err(DecodeError::type_mismatch()),
    }
}

trait PackedElement: Sized + Copy {
    unsafe fn read_le(ptr: *const u8) -> Self;
}

macro_rules! impl_4byte {
    ($ty:ty, $read:expr) => {
        impl PackedElement for $ty {
            #[inline(always)]
            unsafe fn read_le(ptr: *const u8) -> Self {
                $read(ptr)
            }
        }
    };
}

macro_rules! impl_8byte {
    ($ty:ty, $read:expr) => {
        impl PackedElement for $ty {
            #[inline(always)]
            unsafe fn read_le(ptr: *const u8) -> Self {
                $read(ptr)
            }
        }
    };
}

#[inline(always)]
unsafe fn read_u32_le(ptr: *const u8) -> u32 {
    u32::from_le((ptr as *const u32).read_unaligned())
}

#[inline(always)]
unsafe fn read_u64_le(ptr: *const u8) -> u64 {
    u64::from_le((ptr as *const u64).read_unaligned())
}

impl_4byte!(u32, |ptr| read_u32_le(ptr));
impl_4byte!(f32, |ptr| f32::from_bits(read_u32_le(ptr)));
impl_8byte!(u64, |ptr| read_u64_le(ptr));
impl_8byte!(f64, |ptr| f64::from_bits(read_u64_le(ptr)));

/// Decode packed 4-byte elements with a loop structure that enables
/// auto-vectorization.
fn decode_packed_4byte<T: PackedElement>(data: &[u8]) -> Result<Vec<T>, DecodeError> {
    let len = data.len();
    if !len.is_multiple_of(4) {
        return Err(DecodeError::invalid_packed_length(4, len as u32));
    }

    let count = len / 4;
    let mut dst = Vec::with_capacity(count);

    let mut ptr = data.as_ptr();
    let chunks = len / 16;

    for _ in 0..chunks {
        unsafe {
            dst.push(T::read_le(ptr));
            dst.push(T::read_le(ptr.add(4)));
            dst.push(T::read_le(ptr.add(8)));
            dst.push(T::read_le(ptr.add(12)));
            ptr = ptr.add(16);
        }
    }

    for _ in 0..(count - chunks * 4) {
        unsafe {
            dst.push(T::read_le(ptr));
            ptr = ptr.add(4);
        }
    }

    Ok(dst)
}

/// Decode packed 8-byte elements with a loop structure that enables
/// auto-vectorization.
fn decode_packed_8byte<T: PackedElement>(data: &[u8]) -> Result<Vec<T>, DecodeError> {
    let len = data.len();
    if !len.is_multiple_of(8) {
        return Err(DecodeError::invalid_packed_length(8, len as u32));
    }

    let count = len / 8;
    let mut dst = Vec::with_capacity(count);

    let mut ptr = data.as_ptr();
    let chunks = len / 16;

    for _ in 0..chunks {
        unsafe {
            dst.push(T::read_le(ptr));
            dst.push(T::read_le(ptr.add(8)));
            ptr = ptr.add(16);
        }
    }

    if count > chunks * 2 {
        unsafe {
            dst.push(T::read_le(ptr));
        }
    }

    Ok(dst)
}

/// Generic varint decoder with a fast/slow path split.
fn decode_packed_varint<T, L: LebCodec, F: Fn(L) -> T>(
    data: &[u8],
    convert: F,
) -> Result<Vec<T>, DecodeError> {
    let mut dst = Vec::new();
    let mut offset = 0;
    let len = data.len();

    // Fast path: enough bytes remain for an unchecked wide read.
    while offset + L::MAX_LEB_BYTES as usize <= len {
        let (value, bytes_read) = unsafe { L::decode_leb128(&data[offset..])? };
        dst.push(convert(value));
        offset += bytes_read;
    }

    // Slow path for the final, possibly-short, elements.
    while offset < len {
        let (value, bytes_read) = L::decode_leb128_safe(&data[offset..])?;
        dst.push(convert(value));
        offset += bytes_read;
    }
    Ok(dst)
}

/// Packed `uint32` repeated field.
pub fn uint32(value: Option<&Value>) -> Result<Vec<u32>, DecodeError> {
    decode_packed_varint::<u32, u32, _>(payload(value)?, |v| v)
}

/// Packed `uint64` repeated field.
pub fn uint64(value: Option<&Value>) -> Result<Vec<u64>, DecodeError> {
    decode_packed_varint::<u64, u64, _>(payload(value)?, |v| v)
}

/// Packed `int32` repeated field (truncating, see [`crate::scalar::int32`]).
pub fn int32(value: Option<&Value>) -> Result<Vec<i32>, DecodeError> {
    decode_packed_varint::<i32, u64, _>(payload(value)?, |v| {
        i32::truncating_cast_from(i64::reinterpret_cast_from(v))
    })
}

/// Packed `int64` repeated field.
pub fn int64(value: Option<&Value>) -> Result<Vec<i64>, DecodeError> {
    decode_packed_varint::<i64, u64, _>(payload(value)?, i64::reinterpret_cast_from)
}

/// Packed `sint32` repeated field.
pub fn sint32(value: Option<&Value>) -> Result<Vec<i32>, DecodeError> {
    decode_packed_varint::<i32, u32, _>(payload(value)?, zigzag_decode_32)
}

/// Packed `sint64` repeated field.
pub fn sint64(value: Option<&Value>) -> Result<Vec<i64>, DecodeError> {
    decode_packed_varint::<i64, u64, _>(payload(value)?, zigzag_decode_64)
}

/// Packed `bool` repeated field.
pub fn bool_(value: Option<&Value>) -> Result<Vec<bool>, DecodeError> {
    decode_packed_varint::<bool, u64, _>(payload(value)?, |v| v != 0)
}

/// Packed `enum` repeated field.
pub fn enum_value(value: Option<&Value>) -> Result<Vec<i32>, DecodeError> {
    int32(value)
}

/// Packed `fixed32` repeated field.
pub fn fixed32(value: Option<&Value>) -> Result<Vec<u32>, DecodeError> {
    decode_packed_4byte(payload(value)?)
}

/// Packed `fixed64` repeated field.
pub fn fixed64(value: Option<&Value>) -> Result<Vec<u64>, DecodeError> {
    decode_packed_8byte(payload(value)?)
}

/// Packed `sfixed32` repeated field.
///
/// Reads each element as `u32` then reinterprets the bits as `i32` instead
/// of collecting as unsigned and narrowing, so out-of-range top bits are
/// never lost to a numeric (rather than bitwise) cast.
pub fn sfixed32(value: Option<&Value>) -> Result<Vec<i32>, DecodeError> {
    let raw: Vec<u32> = decode_packed_4byte(payload(value)?)?;
    Ok(raw.into_iter().map(i32::reinterpret_cast_from).collect())
}

/// Packed `sfixed64` repeated field, via explicit signed bit-reinterpretation.
pub fn sfixed64(value: Option<&Value>) -> Result<Vec<i64>, DecodeError> {
    let raw: Vec<u64> = decode_packed_8byte(payload(value)?)?;
    Ok(raw.into_iter().map(i64::reinterpret_cast_from).collect())
}

/// Packed `float` repeated field.
pub fn float(value: Option<&Value>) -> Result<Vec<f32>, DecodeError> {
    decode_packed_4byte(payload(value)?)
}

/// Packed `double` repeated field.
pub fn double(value: Option<&Value>) -> Result<Vec<f64>, DecodeError> {
    decode_packed_8byte(payload(value)?)
}
