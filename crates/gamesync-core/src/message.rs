//! The unit of data crossing a transceiver boundary (spec §3 "Authored
//! update").

use gamesync_proto::GSObject;

/// An object update paired with the peer that produced it.
///
/// The author is opaque to the core: it is stamped on encode and compared
/// for equality on receive, never interpreted further (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredObject {
    /// The object update itself.
    pub object: GSObject,
    /// The peer identifier the transport assigned to whoever produced this
    /// update.
    pub author: u32,
}

impl AuthoredObject {
    /// Pairs an object with its author.
    #[must_use]
    pub fn new(object: GSObject, author: u32) -> Self {
        Self { object, author }
    }
}
