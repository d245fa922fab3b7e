//! Map-field decoders.
//!
//! Protobuf maps are syntactic sugar for a repeated synthetic message with
//! two fields: `key = 1`, `value = 2`. This module exposes that synthetic
//! message as a plain key/value pair and a helper to collect the elements of
//! a decoded map field into an actual map type.

use alloc::vec::Vec;
use alloc::collections::BTreeMap;

#[cfg(feature = "std")]
use core::hash::Hash;
#[cfg(feature = "std")]
use std::collections::HashMap;

use crate::error::{DecodeError, InvalidMapEntryReason};
use crate::message::{decode, Message, SortPolicy};
use crate::value::Value;

/// A single decoded map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoMapElem<K, V> {
    pub key: K,
    pub value: V,
}

/// Decodes every map-entry record for `tag` into key/value pairs.
///
/// Each record's payload is itself a tiny message carrying the entry's key
/// (tag 1) and value (tag 2). Proto3 lets an encoder omit either side when it
/// holds the default value, so a missing tag is not an error here; it's
/// passed to `key_decode`/`value_decode` as `None`, same as any other absent
/// field. A tag other than 1 or 2 inside the entry, or tag 2 preceding tag 1,
/// means the payload isn't a well-formed map entry.
pub fn map_entries<K, V>(
    msg: &Message,
    tag: u32,
    key_decode: impl Fn(Option<&Value>) -> Result<K, DecodeError>,
    value_decode: impl Fn(Option<&Value>) -> Result<V, DecodeError>,
) -> Result<Vec<ProtoMapElem<K, V>>, DecodeError> {
    // A map field with exactly one entry is an ordinary, common case, unlike
    // a scalar/message field where a lone record is ambiguous with a
    // singular field. So entries are gathered directly rather than through
    // `Message::get_repeated`, which would reject that case.
    let matches: Vec<&Value> = msg.values().iter().filter(|v| v.tag == tag).collect();
    let mut out = Vec::with_capacity(matches.len());

    for value in matches {
        let entry = match &value.raw {
            crate::value::RawValue::Bytes(b) => decode(b.clone(), SortPolicy::AsEncoded)?,
            _ => return Err(DecodeError::type_mismatch()),
        };

        let mut key_value = None;
        let mut value_value = None;
        let mut seen_value_tag = false;

        for entry_value in entry.values() {
            match entry_value.tag {
                1 => {
                    if seen_value_tag {
                        return Err(DecodeError::invalid_map_entry(
                            InvalidMapEntryReason::OutOfOrder,
                        ));
                    }
                    key_value = Some(entry_value);
                }
                2 => {
                    seen_value_tag = true;
                    value_value = Some(entry_value);
                }
                _ => {
                    return Err(DecodeError::invalid_map_entry(
                        InvalidMapEntryReason::UnknownTag,
                    ))
                }
            }
        }

        out.push(ProtoMapElem {
            key: key_decode(key_value)?,
            value: value_decode(value_value)?,
        });
    }

    Ok(out)
}

/// Materializes decoded map elements into a [`BTreeMap`], last entry wins on
/// key collision.
///
/// Errors with [`DecodeError::empty_map_elems`] on an empty slice: an absent
/// map field and an empty map are indistinguishable once materialized, so
/// the caller must handle "absent" before calling this rather than receiving
/// a silently-empty map back.
pub fn materialize_map<K: Ord, V>(
    elems: Vec<ProtoMapElem<K, V>>,
) -> Result<BTreeMap<K, V>, DecodeError> {
    if elems.is_empty() {
        return Err(DecodeError::empty_map_elems());
    }
    let mut map = BTreeMap::new();
    for elem in elems {
        map.insert(elem.key, elem.value);
    }
    Ok(map)
}

/// Materializes decoded map elements into a [`HashMap`], last entry wins on
/// key collision. See [`materialize_map`] for the empty-input error policy.
#[cfg(feature = "std")]
pub fn materialize_map_hash<K: Hash + Eq, V>(
    elems: Vec<ProtoMapElem<K, V>>,
) -> Result<HashMap<K, V>, DecodeError> {
    if elems.is_empty() {
        return Err(DecodeError::empty_map_elems());
    }
    let mut map = HashMap::new();
    for elem in elems {
        map.insert(elem.key, elem.value);
    }
    Ok(map)
}
