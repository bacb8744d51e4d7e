//! The abstract transport boundary (spec §6), generalized from the
//! teacher's implicit `ConnectionAction::SendFrame` (driven by a host loop
//! in `lockframe-core/src/connection.rs`) into an explicit trait: this
//! spec's transport is an external collaborator (§1 Out-of-scope), not an
//! in-workspace QUIC stack, so the Manager depends on a trait rather than a
//! concrete connection type.

use bytes::Bytes;
use thiserror::Error;

/// An encoded frame ready to hand to the transport, or one the transport
/// just delivered (§6).
#[derive(Debug, Clone)]
pub struct EncodedMessage {
    /// The encoded bytes (a single frame — the Manager encodes and sends
    /// one object per `message_to_send` event, §4.4).
    pub bytes: Bytes,
    /// The peer identifier stamped on this frame.
    pub author: u32,
}

impl EncodedMessage {
    /// Bytes together with an author.
    #[must_use]
    pub fn new(bytes: Bytes, author: u32) -> Self {
        Self { bytes, author }
    }
}

/// Raised when a [`Transport::send`] fails (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transport send failed: {0}")]
pub struct TransportError(pub String);

/// What the Manager needs from a concrete transport (§6): best-effort send,
/// and the peer identifier this process stamps on outbound frames. Inbound
/// delivery is not part of the trait — the host wires its transport's
/// arrival callback directly to [`crate::manager::Manager::on_message_received`]
/// rather than the Manager polling the transport.
pub trait Transport: Send + Sync + 'static {
    /// Best-effort send; the transport may drop this message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the send could not be attempted at
    /// all (e.g. the underlying socket is gone). The Manager logs this and
    /// never propagates it back to the transceiver that produced the
    /// message (§7).
    fn send(&self, message: EncodedMessage) -> Result<(), TransportError>;

    /// The author id this process stamps on outbound frames.
    fn local_identifier(&self) -> u32;
}
