//! Transceiver state machine and multiplexing Manager for the GameSync
//! protocol.
//!
//! Built on top of `gamesync-proto`'s wire codec and object model: this
//! crate owns reconciliation (§4.3), multiplexing and dispatch (§4.4), and
//! the small ambient pieces (a [`clock::Clock`] abstraction, an error
//! taxonomy, a `tracing`-backed log stream) those two need to be testable
//! and host-embeddable without pulling in an actual transport or async
//! runtime (§1 Out-of-scope).

mod clock;
mod error;
mod identity;
mod log;
mod manager;
mod message;
mod slot;
mod transceiver;
mod transport;

pub use clock::{Clock, SystemClock, TestClock};
pub use error::{RegisterError, RetransmitReason, SetLocalError, SetRemoteError};
pub use identity::Identity;
pub use log::{LogLevel, LogSink};
pub use manager::{Manager, TimedManager, TimedManagerConfig};
pub use message::AuthoredObject;
pub use transceiver::{Algorithm, Mode, Transceiver, TransceiverConfig};
pub use transport::{EncodedMessage, Transport, TransportError};

// Re-exported so downstream crates can construct `GSObject` payloads and
// drive the wire codec directly without adding their own `gamesync-proto`
// dependency.
pub use gamesync_proto::{
    DecodeError, Decoder, EncodeError, Encoder, GSObject, Hand1, Hand2, Head1, HeadIPD1, Loc1,
    Loc2, Mesh1, Norm1, Object1, ObjectId, Rot1, Rot2, Tag, TextureUV1, Transform1, UnknownObject,
    TAG_HAND1, TAG_HAND2, TAG_HEAD1, TAG_HEAD_IPD1, TAG_MESH1, TAG_OBJECT1, TAG_UNKNOWN_FLOOR,
};
