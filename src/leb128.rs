//! LEB128 variable-length integer decoding.

// This module uses `as` casts which have been thoroughly reviewed for correctness.
#![allow(clippy::as_conversions)]

use crate::error::DecodeError;

/// Types that can be decoded from a LEB128 encoded integer.
pub trait LebCodec: Sized {
    const MAX_LEB_BYTES: u32;

    /// Decode a LEB128 variable length integer from the provided pointer.
    ///
    /// Returns a tuple of the decoded value and the number of bytes read to
    /// decode said value.
    ///
    /// # Safety
    ///
    /// * __ValidRead__: The caller must ensure that `data` is valid for
    ///   `Self::MAX_LEB_BYTES` bytes to be read from the slice or that the last
    ///   byte is < `0x80` which signifies the end of the varint.
    ///
    /// See [`LebCodec::decode_leb128_safe`] for a version of this function
    /// that ensures the above safety variant.
    unsafe fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Decode a LEB128 variable, buffering short inputs to a safe read length.
    fn decode_leb128_safe(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        // Fast path: if the input is long enough, we can decode directly.
        if data.len() >= Self::MAX_LEB_BYTES as usize {
            return unsafe { Self::decode_leb128(data) };
        }

        // Slow path: copy to a buffer that we know is safe to read from. The
        // buffer is zero-padded past `len`, so a short, mid-varint input
        // decodes without tripping the unsafe-read precondition — but it
        // must not be mistaken for a valid short varint: reject it if the
        // decode consumed more bytes than `data` actually had.
        let mut buffer = [0u8; 16];
        let len = data.len().min(16);
        buffer[..len].copy_from_slice(&data[..len]);

        let (value, bytes_read) = unsafe { Self::decode_leb128(&buffer[..])? };
        if bytes_read > len {
            return Err(DecodeError::invalid_varint());
        }
        Ok((value, bytes_read))
    }

    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<(Self, usize), DecodeError> {
        let chunk = buf.chunk();

        // Fast path: current chunk has enough bytes for direct decode.
        if chunk.len() >= Self::MAX_LEB_BYTES as usize {
            let (value, bytes_read) = unsafe { Self::decode_leb128(chunk)? };
            buf.advance(bytes_read);
            return Ok((value, bytes_read));
        }

        // Slow path: read byte by byte.
        let mut buffer = [0u8; 16];
        for i in 0..Self::MAX_LEB_BYTES as usize {
            if !buf.has_remaining() {
                return Err(DecodeError::invalid_varint());
            }
            buffer[i] = buf.get_u8();
            if buffer[i] < 0x80 {
                return unsafe { Self::decode_leb128(&buffer[..]) };
            }
        }
        Err(DecodeError::invalid_varint())
    }
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: u32 = 10;

    #[inline(always)]
    unsafe fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        // Byte 1.
        let mut b: u8 = unsafe { *data.get_unchecked(0) };
        let mut value = b as u64;
        if b < 0x80 {
            return Ok((value, 1));
        };
        value -= 0x80;

        // Byte 2.
        b = unsafe { *data.get_unchecked(1) };
        value += (b as u64) << 7;
        if b < 0x80 {
            return Ok((value, 2));
        };
        value -= 0x80 << 7;

        // Byte 3.
        b = unsafe { *data.get_unchecked(2) };
        value += (b as u64) << 14;
        if b < 0x80 {
            return Ok((value, 3));
        };
        value -= 0x80 << 14;

        // Byte 4.
        b = unsafe { *data.get_unchecked(3) };
        value += (b as u64) << 21;
        if b < 0x80 {
            return Ok((value, 4));
        };
        value -= 0x80 << 21;

        // Byte 5.
        b = unsafe { *data.get_unchecked(4) };
        value += (b as u64) << 28;
        if b < 0x80 {
            return Ok((value, 5));
        };
        value -= 0x80 << 28;

        // Byte 6.
        b = unsafe { *data.get_unchecked(5) };
        value += (b as u64) << 35;
        if b < 0x80 {
            return Ok((value, 6));
        };
        value -= 0x80 << 35;

        // Byte 7.
        b = unsafe { *data.get_unchecked(6) };
        value += (b as u64) << 42;
        if b < 0x80 {
            return Ok((value, 7));
        };
        value -= 0x80 << 42;

        // Byte 8.
        b = unsafe { *data.get_unchecked(7) };
        value += (b as u64) << 49;
        if b < 0x80 {
            return Ok((value, 8));
        };
        value -= 0x80 << 49;

        // Byte 9.
        b = unsafe { *data.get_unchecked(8) };
        value += (b as u64) << 56;
        if b < 0x80 {
            return Ok((value, 9));
        };
        value -= 0x80 << 56;

        // Byte 10.
        b = unsafe { *data.get_unchecked(9) };
        value += (b as u64) << 63;
        if b < 0x02 {
            return Ok((value, 10));
        };

        // Uh oh! We've read 10 bytes and either didn't find the final byte or
        // we overflowed u64::MAX.
        Err(DecodeError::invalid_varint())
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: u32 = 5;

    #[inline]
    unsafe fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        // Byte 1.
        let mut b: u8 = unsafe { *data.get_unchecked(0) };
        let mut value = b as u32;
        if b < 0x80 {
            return Ok((value, 1));
        };
        value -= 0x80;

        // Byte 2.
        b = unsafe { *data.get_unchecked(1) };
        value += (b as u32) << 7;
        if b < 0x80 {
            return Ok((value, 2));
        };
        value -= 0x80 << 7;

        // Byte 3.
        b = unsafe { *data.get_unchecked(2) };
        value += (b as u32) << 14;
        if b < 0x80 {
            return Ok((value, 3));
        };
        value -= 0x80 << 14;

        // Byte 4.
        b = unsafe { *data.get_unchecked(3) };
        value += (b as u32) << 21;
        if b < 0x80 {
            return Ok((value, 4));
        };
        value -= 0x80 << 21;

        // Byte 5.
        b = unsafe { *data.get_unchecked(4) };
        value += (b as u32) << 28;
        if b < 0x20 {
            return Ok((value, 5));
        };

        // Uh oh! We've read 5 bytes and either didn't find the final byte or
        // we overflowed u32::MAX.
        Err(DecodeError::invalid_varint())
    }
}
