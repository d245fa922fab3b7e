//! Unpacked-repeated decoders.
//!
//! An unpacked repeated field appears on the wire as one `<tag><value>` record
//! per element, interleaved with whatever other fields the message contains.
//! Each function here gathers every record for a tag out of a already-decoded
//! [`Message`] and projects it with the matching scalar decoder from
//! [`crate::scalar`].

use alloc::vec::Vec;

use bytes::Bytes;

use crate::error::DecodeError;
use crate::message::{Message, SortPolicy};
use crate::scalar::{self, ProtoStr};

/// Gathers every record for `tag` directly, rather than through
/// [`Message::get_repeated`]: that lookup's "exactly one match is an error"
/// cardinality policy exists to catch a schema mismatch on an ordinary
/// singular-vs-repeated field, but it would make a one-element repeated
/// field indistinguishable from an error, which packed decoding never does
/// for the same field.
#[inline]
fn values(msg: &Message, tag: u32) -> Result<Vec<Option<&crate::value::Value>>, DecodeError> {
    Ok(msg
        .values()
        .iter()
        .filter(|v| v.tag == tag)
        .map(Some)
        .collect())
}

macro_rules! repeated_decoder {
    ($name:ident, $elem:ty, $project:path) => {
        /// Gathers every record for `tag`, projecting each with the matching
        /// scalar decoder.
        pub fn $name(msg: &Message, tag: u32) -> Result<Vec<$elem>, DecodeError> {
            values(msg, tag)?.into_iter().map($project).collect()
        }
    };
}

repeated_decoder!(uint64, u64, scalar::uint64);
repeated_decoder!(uint32, u32, scalar::uint32);
repeated_decoder!(int64, i64, scalar::int64);
repeated_decoder!(int32, i32, scalar::int32);
repeated_decoder!(sint32, i32, scalar::sint32);
repeated_decoder!(sint64, i64, scalar::sint64);
repeated_decoder!(bool_, bool, scalar::bool_);
repeated_decoder!(enum_value, i32, scalar::enum_value);
repeated_decoder!(fixed32, u32, scalar::fixed32_value);
repeated_decoder!(fixed64, u64, scalar::fixed64_value);
repeated_decoder!(sfixed32, i32, scalar::sfixed32);
repeated_decoder!(sfixed64, i64, scalar::sfixed64);
repeated_decoder!(float, f32, scalar::float);
repeated_decoder!(double, f64, scalar::double);
repeated_decoder!(bytes, Bytes, scalar::bytes);
repeated_decoder!(string, ProtoStr, scalar::string);

/// Gathers every embedded-message record for `tag`, recursively decoding each
/// with the given [`SortPolicy`].
pub fn message(msg: &Message, tag: u32, sort_policy: SortPolicy) -> Result<Vec<Message>, DecodeError> {
    values(msg, tag)?
        .into_iter()
        .map(|v| scalar::message(v, sort_policy))
        .collect()
}
