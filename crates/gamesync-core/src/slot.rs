//! The local/remote slot bookkeeping a [`crate::transceiver::Transceiver`]
//! is built from (§3 "Transceiver slots").
//!
//! Each side (local, remote) keeps the same three pieces of state — an
//! unread current value, the most recent value ever set, and that value's
//! logical time — so this is factored into one small generic type rather
//! than duplicated. The surrounding `Mutex` per side, and the fixed
//! local-then-remote acquisition order, live in `transceiver.rs`; this type
//! itself holds no lock.

use gamesync_proto::DateTimeMs;

/// One side's worth of slot state: an unread current value, the last value
/// ever set (retained past consumption, for retransmission), and that
/// value's logical time.
#[derive(Debug, Clone)]
pub(crate) struct Slot<T> {
    current: Option<T>,
    last: Option<T>,
    last_time: Option<DateTimeMs>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            current: None,
            last: None,
            last_time: None,
        }
    }
}

impl<T: Clone> Slot<T> {
    /// Records a new value as both the current and last value, at `time`.
    pub(crate) fn set(&mut self, value: T, time: DateTimeMs) {
        self.current = Some(value.clone());
        self.last = Some(value);
        self.last_time = Some(time);
    }

    /// Takes (and clears) the current value, leaving `last`/`last_time`
    /// intact. This is `render()`'s destructive-consumption step (§3
    /// invariant 3).
    pub(crate) fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    /// The unread current value, if any.
    pub(crate) fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// The last value ever set, retained past consumption.
    pub(crate) fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }

    /// The logical time of the last value ever set.
    pub(crate) fn last_time(&self) -> Option<DateTimeMs> {
        self.last_time
    }

    /// Clears `last`/`last_time` (used by retransmit takeover, which moves
    /// the remote side's last value into the local side and starts the
    /// remote side fresh).
    pub(crate) fn clear_last(&mut self) {
        self.last = None;
        self.last_time = None;
    }
}
