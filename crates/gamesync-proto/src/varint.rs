//! Unsigned LEB128-style variable-length integers.
//!
//! Each byte carries 7 bits of value, low-order group first, with the high
//! bit set on every byte except the last (continuation bit). Values `< 0x80`
//! encode as a single byte.

use bytes::{Buf, BufMut};

use crate::error::DecodeError;

/// Largest value [`encode`]/[`decode`] will move in a single call.
///
/// The wire format places no hard ceiling below `u64::MAX`, but tags and
/// lengths in this protocol never need more than this; bounding the decode
/// loop at 10 bytes (`ceil(64/7)`) keeps a corrupt continuation bit from
/// spinning past the end of a reasonable buffer.
const MAX_VARINT_BYTES: usize = 10;

/// Appends `value` to `dst` as an unsigned varint.
pub fn encode(mut value: u64, dst: &mut impl BufMut) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            dst.put_u8(byte);
            return;
        }
        dst.put_u8(byte | 0x80);
    }
}

/// Number of bytes [`encode`] would write for `value`.
#[must_use]
pub fn encoded_len(value: u64) -> usize {
    let mut len = 1;
    let mut value = value >> 7;
    while value != 0 {
        len += 1;
        value >>= 7;
    }
    len
}

/// Reads an unsigned varint from the front of `src`, advancing it past the
/// bytes consumed.
///
/// # Errors
///
/// Returns [`DecodeError::TruncatedVarint`] if `src` is exhausted before a
/// terminating (non-continuation) byte is read, and
/// [`DecodeError::VarintOverflow`] if the encoded value does not fit a
/// `u64` within [`MAX_VARINT_BYTES`] groups.
pub fn decode(src: &mut impl Buf) -> Result<u64, DecodeError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for _ in 0..MAX_VARINT_BYTES {
        if !src.has_remaining() {
            return Err(DecodeError::TruncatedVarint);
        }
        let byte = src.get_u8();
        let group = u64::from(byte & 0x7f);
        value |= group
            .checked_shl(shift)
            .filter(|shifted| (*shifted >> shift) == group)
            .ok_or(DecodeError::VarintOverflow)?;

        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(DecodeError::VarintOverflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_byte_boundary() {
        let mut buf = BytesMut::new();
        encode(0x7f, &mut buf);
        assert_eq!(buf.as_ref(), &[0x7f]);

        let mut buf = BytesMut::new();
        encode(0x80, &mut buf);
        assert_eq!(buf.as_ref(), &[0x80, 0x01]);
    }

    #[test]
    fn encoded_len_matches_actual_output() {
        for value in [0u64, 1, 0x7f, 0x80, 0x3fff, 0x4000, u64::MAX] {
            let mut buf = BytesMut::new();
            encode(value, &mut buf);
            assert_eq!(buf.len(), encoded_len(value), "value={value:#x}");
        }
    }

    #[test]
    fn truncated_varint_errors() {
        let mut buf = bytes::Bytes::from_static(&[0x80, 0x80]);
        assert_eq!(decode(&mut buf), Err(DecodeError::TruncatedVarint));
    }

    #[test]
    fn overflow_errors() {
        let mut bytes = vec![0xffu8; 10];
        bytes[9] = 0x02; // forces the value past u64::MAX once fully shifted
        let mut buf = bytes::Bytes::from(bytes);
        assert_eq!(decode(&mut buf), Err(DecodeError::VarintOverflow));
    }

    proptest! {
        #[test]
        fn round_trip(value in any::<u64>()) {
            let mut buf = BytesMut::new();
            encode(value, &mut buf);
            let mut read = buf.freeze();
            let decoded = decode(&mut read).expect("should decode");
            prop_assert_eq!(decoded, value);
            prop_assert!(!read.has_remaining());
        }
    }
}
