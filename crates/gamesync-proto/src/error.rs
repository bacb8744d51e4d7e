//! Error types for the wire codec.
//!
//! One enum for decode failures, one for encode failures — mirrors the way
//! the protocol layer below this crate separates "frame parsing" errors from
//! "frame construction" errors rather than folding both into a single type.

use thiserror::Error;

use crate::object::Tag;

/// Errors produced while decoding a byte buffer into a [`crate::GSObject`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended in the middle of a varint (continuation bit set on
    /// the last available byte).
    #[error("truncated varint")]
    TruncatedVarint,

    /// A varint encoded a value that does not fit in the target integer
    /// width (tags and lengths are read as `u64` then range-checked).
    #[error("varint overflow")]
    VarintOverflow,

    /// The buffer ended before a variant's fixed-size body was fully read.
    #[error("truncated body: tag {tag} expected {expected} bytes, had {available}")]
    TruncatedBody {
        /// Wire tag of the variant being decoded.
        tag: Tag,
        /// Bytes the variant's body requires.
        expected: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },

    /// A count-prefixed array (Mesh1's vertex/normal/texture/triangle lists)
    /// declared more elements than the remaining buffer could possibly hold.
    #[error("malformed array in tag {tag}: count {count} exceeds remaining buffer")]
    MalformedArray {
        /// Wire tag of the variant being decoded.
        tag: Tag,
        /// Declared element count.
        count: u64,
    },

    /// A reserved/malformed tag shape was encountered (e.g. a tag in
    /// `1..0x20` not in `1..=6`).
    #[error("reserved or malformed tag: {0}")]
    ReservedTag(Tag),
}

/// Errors produced while encoding a [`crate::GSObject`] into a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The destination buffer does not have enough remaining capacity for
    /// this frame; the buffer is left unchanged.
    #[error("encoder buffer full: need {needed} bytes, {available} available")]
    Full {
        /// Bytes the frame would have required.
        needed: usize,
        /// Bytes actually free in the destination buffer.
        available: usize,
    },
}
