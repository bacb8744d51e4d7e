//! Error taxonomy for the Transceiver and Manager (spec §7).
//!
//! Split the same way the teacher splits `ConnectionError` from transport/
//! protocol errors (`lockframe-core/src/error.rs`): one enum per layer,
//! `thiserror`-derived, no panics. Setter rejections are values, never
//! exceptions — the Manager is the only place a listener's panic is ever
//! caught and converted to a log line (§10.1).

use thiserror::Error;

use gamesync_proto::{DateTimeMs, Tag};

use crate::identity::Identity;

/// Rejections from [`crate::transceiver::Transceiver::set_local`] (§4.3.3).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLocalError {
    /// The transceiver is `ReceiveOnly`; it never accepts local updates.
    #[error("set_local rejected: transceiver is ReceiveOnly")]
    ModeViolation,

    /// `timestamp` is strictly after the clock's current time.
    #[error("set_local rejected: timestamp {timestamp:?} is after now {now:?}")]
    FutureTimestamp {
        /// The rejected update's timestamp.
        timestamp: DateTimeMs,
        /// The clock's time at rejection.
        now: DateTimeMs,
    },

    /// `timestamp` precedes the last timestamp this transceiver accepted.
    #[error("set_local rejected: timestamp {timestamp:?} precedes last accepted {last:?}")]
    NonMonotonic {
        /// The rejected update's timestamp.
        timestamp: DateTimeMs,
        /// The last timestamp this transceiver accepted.
        last: DateTimeMs,
    },
}

/// Rejections from [`crate::transceiver::Transceiver::set_remote`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRemoteError {
    /// The transceiver is `SendOnly`; it never accepts remote updates.
    #[error("set_remote rejected: transceiver is SendOnly")]
    ModeViolation,
}

/// Rejections from [`crate::manager::Manager`] registration.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// Registration was attempted with the null identity.
    #[error("cannot register the null identity")]
    NullIdentity,

    /// An identity is already registered; registration is exclusive (§3
    /// invariant 5).
    #[error("identity {0:?} is already registered")]
    DuplicateIdentity(Identity),

    /// A raw tag is already registered; registration is exclusive.
    #[error("tag {0} is already registered")]
    DuplicateTag(Tag),
}

/// The branch taken by [`crate::transceiver::Transceiver::retransmit`]
/// (§4.3.2), reported to an optional `retransmit_reasons` sink.
///
/// Only branches 5 through 8 of §4.3.2 are represented — the two early-return
/// branches (`ReceiveOnly`-always-false, and the first-tick grace period) are
/// not "reasons" the spec names, so they never reach the sink (§11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetransmitReason {
    /// The remote owner went silent; its last known value was promoted into
    /// the local slot and retransmitted on its behalf.
    ExpiredRemote,
    /// There is no local value to retransmit.
    NoLocal,
    /// There is a local value and no remote value yet.
    NoRemote,
    /// The local value is strictly newer than the remote value.
    NewerLocal,
    /// The remote value is at least as new as the local value.
    RecentRemote,
}
