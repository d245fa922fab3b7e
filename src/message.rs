//! The schemaless decoder: turns a byte stream into an ordered [`Message`] of
//! [`Value`] records, plus the lookup API callers use to apply their own
//! per-field projections.

use alloc::vec::Vec;

use bytes::{Buf, Bytes};

use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::value::{RawValue, Value};
use crate::wire::{self, WireType};

/// Controls whether [`decode`] preserves wire order or sorts the resulting
/// records by tag.
///
/// Sorting unlocks binary-search lookups in [`Message::get_singular`] and
/// [`Message::get_repeated`] at the cost of an upfront sort; `AsEncoded` is
/// cheaper to produce but falls back to a linear scan on lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPolicy {
    /// Preserve the order fields were encountered on the wire.
    AsEncoded,
    /// Stable-sort records by ascending tag.
    AscendingByTag,
    /// Stable-sort records by descending tag.
    DescendingByTag,
}

/// An ordered collection of decoded [`Value`] records.
///
/// Every field present in the input is represented here regardless of
/// whether the caller has a projection for its tag — this is what makes the
/// decoder schemaless: unknown fields are simply records nobody has asked
/// for yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    values: Vec<Value>,
    sort_policy: SortPolicy,
}

impl Message {
    /// Returns every decoded record, in the order established by this
    /// message's [`SortPolicy`].
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns this message's [`SortPolicy`].
    #[inline]
    pub fn sort_policy(&self) -> SortPolicy {
        self.sort_policy
    }

    /// Looks up the single record for `tag`.
    ///
    /// Returns `Ok(None)` if no record matches. Errors with
    /// [`DecodeError::not_singular`] if two or more records match — a
    /// repeated field with exactly one element is indistinguishable from a
    /// singular field on the wire, so a caller that expects a singular field
    /// but receives a multiply-occurring tag has a genuine schema mismatch.
    pub fn get_singular(&self, tag: u32) -> Result<Option<&Value>, DecodeError> {
        match self.sort_policy {
            SortPolicy::AsEncoded => {
                let mut found: Option<&Value> = None;
                for value in &self.values {
                    if value.tag == tag {
                        if found.is_some() {
                            return Err(DecodeError::not_singular(tag));
                        }
                        found = Some(value);
                    }
                }
                Ok(found)
            }
            SortPolicy::AscendingByTag | SortPolicy::DescendingByTag => {
                let ascending = matches!(self.sort_policy, SortPolicy::AscendingByTag);
                let idx = match self.values.binary_search_by(|v| {
                    if ascending {
                        v.tag.cmp(&tag)
                    } else {
                        tag.cmp(&v.tag)
                    }
                }) {
                    Ok(idx) => idx,
                    Err(_) => return Ok(None),
                };

                // The found index may be anywhere within a run of equal tags;
                // scan outward in both directions while the tag matches so a
                // three-or-more-way duplicate is still caught (a single
                // `idx + 1` check misses duplicates further along the run).
                let mut lo = idx;
                while lo > 0 && self.values[lo - 1].tag == tag {
                    lo -= 1;
                }
                let mut hi = idx;
                while hi + 1 < self.values.len() && self.values[hi + 1].tag == tag {
                    hi += 1;
                }

                if hi > lo {
                    Err(DecodeError::not_singular(tag))
                } else {
                    Ok(Some(&self.values[idx]))
                }
            }
        }
    }

    /// Looks up every record for `tag`, returning their indices into
    /// [`Message::values`].
    ///
    /// Errors with [`DecodeError::not_repeated`] if exactly one record
    /// matches, mirroring [`Message::get_singular`]'s strictness: a caller
    /// asking for a repeated field that instead decodes as singular-or-absent
    /// has a genuine schema mismatch, not a zero-or-one-element repeated
    /// field (which is a normal, valid outcome and returns 0 or 2+ indices
    /// through the same call, never exactly 1).
    pub fn get_repeated(&self, tag: u32) -> Result<Vec<usize>, DecodeError> {
        let indices: Vec<usize> = match self.sort_policy {
            SortPolicy::AsEncoded => self
                .values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.tag == tag)
                .map(|(i, _)| i)
                .collect(),
            SortPolicy::AscendingByTag | SortPolicy::DescendingByTag => {
                let ascending = matches!(self.sort_policy, SortPolicy::AscendingByTag);
                match self.values.binary_search_by(|v| {
                    if ascending {
                        v.tag.cmp(&tag)
                    } else {
                        tag.cmp(&v.tag)
                    }
                }) {
                    Ok(idx) => {
                        let mut lo = idx;
                        while lo > 0 && self.values[lo - 1].tag == tag {
                            lo -= 1;
                        }
                        let mut hi = idx;
                        while hi + 1 < self.values.len() && self.values[hi + 1].tag == tag {
                            hi += 1;
                        }
                        (lo..=hi).collect()
                    }
                    Err(_) => Vec::new(),
                }
            }
        };

        if indices.len() == 1 {
            Err(DecodeError::not_repeated(tag))
        } else {
            Ok(indices)
        }
    }
}

/// Decodes a protobuf wire-format message into an ordered [`Message`].
///
/// Every field is captured regardless of whether it's recognized by any
/// caller. Wire types 3 (`SGroup`) and 4 (`EGroup`), the deprecated group
/// encoding, are rejected rather than skipped.
pub fn decode(input: Bytes, sort_policy: SortPolicy) -> Result<Message, DecodeError> {
    let mut buf = input;
    let mut values = Vec::new();

    while buf.has_remaining() {
        let key = wire::decode_key(&mut buf)?;
        let (wire_type, tag) = key.into_parts();

        let raw = match wire_type {
            WireType::Varint => {
                let (value, _) = u64::decode_leb128_buf(&mut buf)?;
                RawValue::Varint(value)
            }
            WireType::I32 => RawValue::Fixed32(wire::decode_fixed32(&mut buf)?),
            WireType::I64 => RawValue::Fixed64(wire::decode_fixed64(&mut buf)?),
            WireType::Len => {
                let len = wire::decode_len(&mut buf)?;
                RawValue::Bytes(wire::decode_bytes(&mut buf, len)?)
            }
            WireType::SGroup | WireType::EGroup => {
                return Err(DecodeError::deprecated_group_encoding());
            }
        };

        values.push(Value::new(tag, wire_type, raw));
    }

    match sort_policy {
        SortPolicy::AsEncoded => {}
        SortPolicy::AscendingByTag => values.sort_by_key(|v| v.tag),
        SortPolicy::DescendingByTag => values.sort_by_key(|v| core::cmp::Reverse(v.tag)),
    }

    Ok(Message {
        values,
        sort_policy,
    })
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn varint_field(tag: u32, value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut key = tag << 3;
        loop {
            let byte = (key & 0x7f) as u8;
            key >>= 7;
            if key == 0 {
                buf.push(byte);
                break;
            }
            buf.push(byte | 0x80);
        }
        let mut v = value;
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                buf.push(byte);
                break;
            }
            buf.push(byte | 0x80);
        }
        buf
    }

    #[test]
    fn test_decode_as_encoded_preserves_order() {
        let mut bytes = Vec::new();
        bytes.extend(varint_field(3, 1));
        bytes.extend(varint_field(1, 2));
        bytes.extend(varint_field(3, 3));

        let msg = decode(Bytes::from(bytes), SortPolicy::AsEncoded).unwrap();
        let tags: Vec<u32> = msg.values().iter().map(|v| v.tag).collect();
        assert_eq!(tags, vec![3, 1, 3]);
    }

    #[test]
    fn test_decode_sorts_ascending() {
        let mut bytes = Vec::new();
        bytes.extend(varint_field(3, 1));
        bytes.extend(varint_field(1, 2));
        bytes.extend(varint_field(2, 3));

        let msg = decode(Bytes::from(bytes), SortPolicy::AscendingByTag).unwrap();
        let tags: Vec<u32> = msg.values().iter().map(|v| v.tag).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_sorts_descending() {
        let mut bytes = Vec::new();
        bytes.extend(varint_field(1, 1));
        bytes.extend(varint_field(3, 2));
        bytes.extend(varint_field(2, 3));

        let msg = decode(Bytes::from(bytes), SortPolicy::DescendingByTag).unwrap();
        let tags: Vec<u32> = msg.values().iter().map(|v| v.tag).collect();
        assert_eq!(tags, vec![3, 2, 1]);
    }

    #[test]
    fn test_get_singular_absent() {
        let msg = decode(Bytes::new(), SortPolicy::AsEncoded).unwrap();
        assert_eq!(msg.get_singular(1).unwrap(), None);
    }

    #[test]
    fn test_get_singular_one_match() {
        let bytes = varint_field(5, 42);
        let msg = decode(Bytes::from(bytes), SortPolicy::AsEncoded).unwrap();
        let value = msg.get_singular(5).unwrap().unwrap();
        assert_eq!(value.raw, RawValue::Varint(42));
    }

    #[test]
    fn test_get_singular_errors_on_duplicate_as_encoded() {
        let mut bytes = Vec::new();
        bytes.extend(varint_field(5, 1));
        bytes.extend(varint_field(5, 2));
        let msg = decode(Bytes::from(bytes), SortPolicy::AsEncoded).unwrap();
        assert!(msg.get_singular(5).is_err());
    }

    #[test]
    fn test_get_singular_errors_on_triplicate_sorted() {
        // Regression test for the "idx + 1 only" bug: three identical tags
        // in a row must still be detected as NotSingular regardless of which
        // slot the binary search happens to land on.
        let mut bytes = Vec::new();
        bytes.extend(varint_field(5, 1));
        bytes.extend(varint_field(5, 2));
        bytes.extend(varint_field(5, 3));
        let msg = decode(Bytes::from(bytes), SortPolicy::AscendingByTag).unwrap();
        assert!(msg.get_singular(5).is_err());
    }

    #[test]
    fn test_get_repeated_zero_or_many_ok_one_errors() {
        let msg = decode(Bytes::new(), SortPolicy::AsEncoded).unwrap();
        assert_eq!(msg.get_repeated(7).unwrap(), Vec::<usize>::new());

        let bytes = varint_field(7, 1);
        let msg = decode(Bytes::from(bytes), SortPolicy::AsEncoded).unwrap();
        assert!(msg.get_repeated(7).is_err());

        let mut bytes = Vec::new();
        bytes.extend(varint_field(7, 1));
        bytes.extend(varint_field(7, 2));
        let msg = decode(Bytes::from(bytes), SortPolicy::AscendingByTag).unwrap();
        assert_eq!(msg.get_repeated(7).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_decode_rejects_group_encoding() {
        // Tag 1, wire type 3 (SGroup): key byte is (1 << 3) | 3 = 0x0B.
        let bytes = alloc::vec![0x0Bu8];
        assert!(decode(Bytes::from(bytes), SortPolicy::AsEncoded).is_err());
    }
}
