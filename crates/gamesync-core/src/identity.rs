//! Host-facing registration identity, and the string-derivation helper from
//! spec §6/§9.

use gamesync_proto::ObjectId;

/// A registration key for the Manager's `by_id` map.
///
/// Distinct from [`ObjectId`] only in that it is the type hosts construct
/// registrations with; every `Identity` converts losslessly to/from an
/// `ObjectId` since both are, underneath, a 64-bit routing key (§3: "Identity
/// is routing-only; it is not a sequence number").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub u64);

impl Identity {
    /// The null identity. `Manager::register` rejects it (§4.4).
    pub const NULL: Identity = Identity(0);

    /// Whether this is the null identity.
    #[must_use]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Derives an identity from an ASCII string, per spec §6's "String
    /// identity helper": the string's bytes, left-padded with zeros to 8
    /// bytes, read as a little-endian `u64`.
    ///
    /// Strings longer than 8 bytes are silently truncated to their first 8
    /// bytes (spec §9's open question, resolved in favor of preserving this
    /// behavior for compatibility rather than rejecting long input).
    #[must_use]
    pub fn from_str_bytes(s: &str) -> Self {
        let bytes = s.as_bytes();
        let take = bytes.len().min(8);
        let mut buf = [0u8; 8];
        // Left-pad with zeros: the string's bytes occupy the high-index
        // (most-significant, under little-endian) tail of the array.
        buf[8 - take..].copy_from_slice(&bytes[..take]);
        Self(u64::from_le_bytes(buf))
    }
}

impl From<ObjectId> for Identity {
    fn from(id: ObjectId) -> Self {
        Self(id.0)
    }
}

impl From<Identity> for ObjectId {
    fn from(identity: Identity) -> Self {
        Self(identity.0)
    }
}
