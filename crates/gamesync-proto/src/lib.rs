//! Wire codec and tagged-union object model for the GameSync protocol.
//!
//! This crate owns everything needed to turn a [`GSObject`] into bytes and
//! back: the tagged-union object model (§3/§4.2), the frame codec
//! (§4.1), and the small numeric building blocks (varint, half-float,
//! `time16` expansion) the codec is built from. It has no notion of a
//! transceiver, a manager, or a transport — those live in `gamesync-core`,
//! which depends on this crate rather than the other way around.

mod codec;
mod error;
mod geometry;
mod half_float;
mod object;
mod timestamp;
mod varint;

pub use codec::{Decoder, Encoder, DEFAULT_BUFFER_SIZE};
pub use error::{DecodeError, EncodeError};
pub use geometry::{Loc1, Loc2, Norm1, Rot1, Rot2, TextureUV1, Transform1};
pub use object::{
    GSObject, Hand1, Hand2, Head1, HeadIPD1, Mesh1, Object1, ObjectId, Tag, UnknownObject,
    TAG_HAND1, TAG_HAND2, TAG_HEAD1, TAG_HEAD_IPD1, TAG_MESH1, TAG_OBJECT1, TAG_UNKNOWN_FLOOR,
};
pub use timestamp::{expand_time16, DateTimeMs, TIME16_PERIOD_MS};

// Re-exported so downstream crates can construct `UnknownObject` bodies and
// `EncodedMessage` payloads without adding their own `bytes` dependency.
pub use bytes::Bytes;
