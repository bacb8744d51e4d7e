//! The per-object Transceiver state machine (spec §4.3).
//!
//! Holds local/remote slots behind two independent locks acquired in a fixed
//! order (local, then remote — §5), reconciles them into a single renderable
//! value on `render()`, and decides on `retransmit()` whether it must speak
//! on a silent owner's behalf. The decision shape (a stateful type that
//! inspects its own history and returns an action) follows
//! `kalandra-core/src/sequencer.rs`'s `Sequencer::process_frame`; the
//! two-lock, `Arc`-shared, clone-shares-state concurrency pattern follows
//! `lockframe-server/src/key_package_registry.rs`.

#![allow(clippy::expect_used, reason = "mutex poisoning should cause a panic")]

use std::sync::{Arc, Mutex};

use gamesync_proto::{DateTimeMs, GSObject};

use crate::clock::Clock;
use crate::error::{RetransmitReason, SetLocalError, SetRemoteError};
use crate::message::AuthoredObject;
use crate::slot::Slot;

/// Which conflict-resolution rule a Transceiver uses to compare local and
/// remote updates (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Compare the message-carried `timestamp()` of local vs. remote. The
    /// default for timestamped variants.
    ///
    /// If fed an untimed variant (Mesh1, `HeadIPD1`, `UnknownObject`) — which
    /// the spec says only `Latest` meaningfully supports — the update's
    /// arrival time is used as its ordering key instead of a message
    /// timestamp it doesn't have, rather than panicking or rejecting it.
    Timestamp,
    /// Compare wall-clock arrival time: when `set_local` was called, and
    /// when `set_remote` was called. The only algorithm meaningful for
    /// untimed variants.
    Latest,
}

/// Which direction(s) a Transceiver accepts updates from (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Accepts both `set_local` and `set_remote`; reconciles between them.
    Bidirectional,
    /// Rejects `set_local`; `render()` always returns the remote value.
    ReceiveOnly,
    /// Rejects `set_remote`; `render()` always returns the local value.
    SendOnly,
}

/// Constructor parameters for a [`Transceiver`] (§6, §10.3).
///
/// A plain `Default`-deriving struct with named fields, matching the
/// teacher's `ConnectionConfig` pattern rather than a fluent builder.
#[derive(Debug, Clone, Copy)]
pub struct TransceiverConfig {
    /// How long (in milliseconds) a silent remote owner is tolerated before
    /// its last known value is eligible for takeover (§4.3.2).
    pub expiry_ms: u64,
    /// The conflict-resolution rule.
    pub algorithm: Algorithm,
    /// Raises internal logging from `debug` to `trace` detail.
    pub debugging: bool,
    /// Which direction(s) this transceiver accepts updates from.
    pub mode: Mode,
    /// When `true`, `render()` suppresses a local-value win: the local
    /// producer already drew its own frame and does not need it surfaced
    /// again (§4.3.1).
    pub prerendered: bool,
}

impl Default for TransceiverConfig {
    fn default() -> Self {
        Self {
            expiry_ms: 5_000,
            algorithm: Algorithm::Timestamp,
            debugging: false,
            mode: Mode::Bidirectional,
            prerendered: false,
        }
    }
}

type SendListener = Box<dyn Fn(AuthoredObject) + Send + Sync>;
type ReasonSink = Box<dyn Fn(RetransmitReason) + Send + Sync>;

/// Local-side state, guarded by `local_lock`. `last_retransmit_check` lives
/// here rather than behind a third lock since every caller that needs it
/// (`retransmit`) already holds this lock first.
struct LocalState {
    slot: Slot<AuthoredObject>,
    last_retransmit_check: Option<DateTimeMs>,
}

impl Default for LocalState {
    fn default() -> Self {
        Self {
            slot: Slot::default(),
            last_retransmit_check: None,
        }
    }
}

/// Remote-side state, guarded by `remote_lock`.
struct RemoteState {
    slot: Slot<AuthoredObject>,
    /// Wall-clock instant `set_remote` last ran, independent of the
    /// message's own (possibly algorithm-dependent) ordering key — this is
    /// specifically the staleness clock retransmit's takeover rule (§4.3.2)
    /// measures against.
    last_update_received: Option<DateTimeMs>,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self {
            slot: Slot::default(),
            last_update_received: None,
        }
    }
}

/// The per-object reconciliation state machine (§4.3).
pub struct Transceiver {
    config: TransceiverConfig,
    clock: Arc<dyn Clock>,
    local: Mutex<LocalState>,
    remote: Mutex<RemoteState>,
    send_listener: Mutex<Option<SendListener>>,
    retransmit_reasons: Option<ReasonSink>,
}

impl Transceiver {
    /// Creates a transceiver with the given configuration and clock.
    #[must_use]
    pub fn new(config: TransceiverConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            local: Mutex::new(LocalState::default()),
            remote: Mutex::new(RemoteState::default()),
            send_listener: Mutex::new(None),
            retransmit_reasons: None,
        }
    }

    /// Creates a transceiver that also reports each `retransmit()` branch
    /// taken to `sink` (§11 "`retransmit_reasons` sink").
    #[must_use]
    pub fn with_retransmit_reasons(
        config: TransceiverConfig,
        clock: Arc<dyn Clock>,
        sink: ReasonSink,
    ) -> Self {
        Self {
            retransmit_reasons: Some(sink),
            ..Self::new(config, clock)
        }
    }

    /// This transceiver's configured mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Installs the callback invoked synchronously whenever this
    /// transceiver emits a `message_to_send` event (§4.3). Overwrites any
    /// previously installed listener.
    pub(crate) fn set_send_listener(&self, listener: SendListener) {
        *self.send_listener.lock().expect("send listener mutex poisoned") = Some(listener);
    }

    /// Detaches the send listener (§4.4 "Disposal detaches transceivers
    /// from the manager's send routing").
    pub(crate) fn clear_send_listener(&self) {
        *self.send_listener.lock().expect("send listener mutex poisoned") = None;
    }

    fn emit(&self, object: AuthoredObject) {
        let listener = self.send_listener.lock().expect("send listener mutex poisoned");
        if let Some(listener) = listener.as_ref() {
            listener(object);
        }
    }

    fn record_reason(&self, reason: RetransmitReason) {
        if let Some(sink) = &self.retransmit_reasons {
            sink(reason);
        }
    }

    /// The ordering key this transceiver's algorithm assigns an object: its
    /// message-carried timestamp under `Algorithm::Timestamp` (falling back
    /// to `now` if the variant carries none), or simply `now` under
    /// `Algorithm::Latest`.
    fn order_key(&self, object: &GSObject, now: DateTimeMs) -> DateTimeMs {
        match self.config.algorithm {
            Algorithm::Timestamp => object.timestamp().unwrap_or(now),
            Algorithm::Latest => now,
        }
    }

    /// Validates and stores a local update, emitting a `message_to_send`
    /// event on success (§4.3, §4.3.3).
    ///
    /// # Errors
    ///
    /// Returns [`SetLocalError::ModeViolation`] in `ReceiveOnly` mode,
    /// [`SetLocalError::FutureTimestamp`] if the update's ordering key is
    /// after the current time, or [`SetLocalError::NonMonotonic`] if it
    /// precedes the last accepted ordering key (§3 invariants 1, 2).
    pub fn set_local(&self, update: AuthoredObject) -> Result<(), SetLocalError> {
        if matches!(self.config.mode, Mode::ReceiveOnly) {
            return Err(SetLocalError::ModeViolation);
        }

        let now = self.clock.now_ms();
        let time = self.order_key(&update.object, now);

        let mut local = self.local.lock().expect("local slot mutex poisoned");
        if time > now {
            return Err(SetLocalError::FutureTimestamp { timestamp: time, now });
        }
        if let Some(last) = local.slot.last_time() {
            if time < last {
                return Err(SetLocalError::NonMonotonic { timestamp: time, last });
            }
        }
        local.slot.set(update.clone(), time);
        drop(local);

        self.emit(update);
        Ok(())
    }

    /// Records a remote update (§4.3). `ReceiveOnly`/`Bidirectional`
    /// transceivers always accept; `SendOnly` transceivers never do.
    ///
    /// # Errors
    ///
    /// Returns [`SetRemoteError::ModeViolation`] in `SendOnly` mode.
    pub fn set_remote(&self, update: AuthoredObject) -> Result<(), SetRemoteError> {
        if matches!(self.config.mode, Mode::SendOnly) {
            return Err(SetRemoteError::ModeViolation);
        }

        let now = self.clock.now_ms();
        let time = self.order_key(&update.object, now);

        let mut remote = self.remote.lock().expect("remote slot mutex poisoned");
        remote.slot.set(update, time);
        remote.last_update_received = Some(now);
        Ok(())
    }

    /// Produces the chosen renderable value, consuming the current local and
    /// remote slots (§4.3.1). Returns `None` if there is nothing to render,
    /// or if `prerendered` suppressed a local win.
    #[must_use]
    pub fn render(&self) -> Option<AuthoredObject> {
        let mut local = self.local.lock().expect("local slot mutex poisoned");
        let mut remote = self.remote.lock().expect("remote slot mutex poisoned");

        let (winner, winner_is_local) = match self.config.mode {
            Mode::SendOnly => (local.slot.current().cloned(), true),
            Mode::ReceiveOnly => (remote.slot.current().cloned(), false),
            Mode::Bidirectional => Self::bidirectional_winner(&local.slot, &remote.slot),
        };

        local.slot.take_current();
        remote.slot.take_current();
        drop(local);
        drop(remote);

        if winner_is_local && self.config.prerendered && winner.is_some() {
            return None;
        }
        winner
    }

    /// Implements §4.3.1 steps 1-4 for `Bidirectional` transceivers. Does
    /// not touch the slots; the caller is responsible for clearing them
    /// (step 5).
    fn bidirectional_winner(
        local: &Slot<AuthoredObject>,
        remote: &Slot<AuthoredObject>,
    ) -> (Option<AuthoredObject>, bool) {
        match (local.current(), remote.current()) {
            (None, None) => (None, false),
            (Some(l), None) => {
                if let Some(remote_time) = remote.last_time() {
                    let local_time = local.last_time().unwrap_or(DateTimeMs(0));
                    if local_time < remote_time {
                        return (None, false);
                    }
                }
                (Some(l.clone()), true)
            },
            (None, Some(r)) => {
                if let Some(local_time) = local.last_time() {
                    let remote_time = remote.last_time().unwrap_or(DateTimeMs(0));
                    if remote_time < local_time {
                        return (None, false);
                    }
                }
                (Some(r.clone()), false)
            },
            (Some(l), Some(r)) => {
                let local_time = local.last_time().unwrap_or(DateTimeMs(0));
                let remote_time = remote.last_time().unwrap_or(DateTimeMs(0));
                if local_time >= remote_time {
                    (Some(l.clone()), true)
                } else {
                    (Some(r.clone()), false)
                }
            },
        }
    }

    /// Decides whether this transceiver must retransmit on a tick (§4.3.2).
    /// Returns whether a `message_to_send` event was emitted — except in
    /// `SendOnly` mode, which always returns `true` per §4.3.2 step 2, even
    /// on a tick with no `last_local` to emit.
    pub fn retransmit(&self) -> bool {
        match self.config.mode {
            Mode::ReceiveOnly => false,
            Mode::SendOnly => self.retransmit_send_only(),
            Mode::Bidirectional => self.retransmit_bidirectional(),
        }
    }

    fn retransmit_send_only(&self) -> bool {
        let local = self.local.lock().expect("local slot mutex poisoned");
        let last_local = local.slot.last().cloned();
        drop(local);
        if let Some(last_local) = last_local {
            self.emit(last_local);
        }
        // §4.3.2 step 2: SendOnly "emits last_local (if any) and returns
        // true" — unconditionally, even with nothing yet to emit.
        true
    }

    #[allow(clippy::too_many_lines)]
    fn retransmit_bidirectional(&self) -> bool {
        let now = self.clock.now_ms();
        let mut local = self.local.lock().expect("local slot mutex poisoned");
        let mut remote = self.remote.lock().expect("remote slot mutex poisoned");

        if local.last_retransmit_check.is_none() {
            local.last_retransmit_check = Some(now);
            return false;
        }
        local.last_retransmit_check = Some(now);

        let expired_cutoff = DateTimeMs(now.0.saturating_sub(self.config.expiry_ms));

        if let Some(last_update) = remote.last_update_received {
            let local_time = local.slot.last_time();
            let takeover = last_update < expired_cutoff
                && local_time.is_none_or(|tl| tl < last_update);
            if takeover {
                if let Some(promoted) = remote.slot.last().cloned() {
                    let promoted_time = remote.slot.last_time().unwrap_or(now);
                    local.slot.set(promoted.clone(), promoted_time);
                    remote.slot.clear_last();
                    remote.last_update_received = None;
                    drop(local);
                    drop(remote);
                    self.record_reason(RetransmitReason::ExpiredRemote);
                    self.emit(promoted);
                    return true;
                }
            }
        }

        let Some(last_local) = local.slot.last().cloned() else {
            self.record_reason(RetransmitReason::NoLocal);
            return false;
        };

        if remote.slot.last().is_none() {
            drop(local);
            drop(remote);
            self.record_reason(RetransmitReason::NoRemote);
            self.emit(last_local);
            return true;
        }

        let local_time = local.slot.last_time().unwrap_or(DateTimeMs(0));
        let remote_time = remote.slot.last_time().unwrap_or(DateTimeMs(0));
        if local_time > remote_time {
            drop(local);
            drop(remote);
            self.record_reason(RetransmitReason::NewerLocal);
            self.emit(last_local);
            true
        } else {
            self.record_reason(RetransmitReason::RecentRemote);
            false
        }
    }
}
