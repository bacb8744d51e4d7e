//! The Manager: multiplexes one transport over many transceivers (§4.4).
//!
//! Structurally follows `kalandra-core/src/room_manager.rs`'s `RoomManager`
//! (a per-key map plus an action-returning `process_frame`) and
//! `lockframe-server/src/registry.rs`'s `ConnectionRegistry` (explicit
//! register/unregister over bidirectional maps, a `Debug` impl that hides
//! internals). Per-frame and per-tick work is isolated with
//! `catch_unwind` around every host-supplied callback (transport `send`,
//! the unregistered-event listeners, transceiver listeners reached via
//! `retransmit`) in addition to ordinary `Result` plumbing for codec
//! errors, so one misbehaving callback can never take the Manager down
//! (§7, §10.1).

#![allow(clippy::expect_used, reason = "mutex poisoning should cause a panic")]

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

use gamesync_proto::{Decoder, Encoder, GSObject, ObjectId, Tag, UnknownObject};

use crate::clock::Clock;
use crate::error::RegisterError;
use crate::identity::Identity;
use crate::log::{LogHub, LogLevel, LogSink};
use crate::message::AuthoredObject;
use crate::transceiver::Transceiver;
use crate::transport::{EncodedMessage, Transport};

type UnregisteredUpdateSink = Box<dyn Fn(GSObject) + Send + Sync>;
type UnregisteredUnknownSink = Box<dyn Fn(UnknownObject) + Send + Sync>;

struct IdEntry {
    tag: Tag,
    transceiver: Arc<Transceiver>,
}

struct Registry {
    by_id: Mutex<HashMap<ObjectId, IdEntry>>,
    by_tag: Mutex<HashMap<Tag, Arc<Transceiver>>>,
    all: Mutex<Vec<Arc<Transceiver>>>,
}

impl Registry {
    fn new() -> Self {
        Self {
            by_id: Mutex::new(HashMap::new()),
            by_tag: Mutex::new(HashMap::new()),
            all: Mutex::new(Vec::new()),
        }
    }

    fn push_all(&self, transceiver: &Arc<Transceiver>) {
        self.all.lock().expect("registry mutex poisoned").push(Arc::clone(transceiver));
    }

    fn remove_all(&self, transceiver: &Arc<Transceiver>) {
        self.all
            .lock()
            .expect("registry mutex poisoned")
            .retain(|t| !Arc::ptr_eq(t, transceiver));
    }
}

/// Multiplexes a single [`Transport`] over the set of registered
/// transceivers (§4.4).
pub struct Manager {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    debugging: bool,
    registry: Registry,
    log: LogHub,
    on_unregistered_update: Mutex<Option<UnregisteredUpdateSink>>,
    on_unregistered_unknown: Mutex<Option<UnregisteredUnknownSink>>,
}

impl Manager {
    /// Creates a manager over `transport`. `debugging` raises internal
    /// logging from `debug` to `trace` detail (§6, §10.2).
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, clock: Arc<dyn Clock>, debugging: bool) -> Self {
        Self {
            transport,
            clock,
            debugging,
            registry: Registry::new(),
            log: LogHub::default(),
            on_unregistered_update: Mutex::new(None),
            on_unregistered_unknown: Mutex::new(None),
        }
    }

    /// Installs (or removes, with `None`) the `log` event stream sink
    /// (§4.4, §6, §10.2).
    pub fn set_log_sink(&self, sink: Option<LogSink>) {
        self.log.set_sink(sink);
    }

    /// Installs (or removes, with `None`) the `on_unregistered_update`
    /// event stream, fired when a recognized-tag frame arrives for an
    /// `ObjectId` with no registered transceiver.
    pub fn set_on_unregistered_update(&self, sink: Option<UnregisteredUpdateSink>) {
        *self.on_unregistered_update.lock().expect("unregistered-update sink mutex poisoned") =
            sink;
    }

    /// Installs (or removes, with `None`) the `on_unregistered_unknown`
    /// event stream, fired when an unrecognized-tag frame arrives with no
    /// transceiver registered for that raw tag.
    pub fn set_on_unregistered_unknown(&self, sink: Option<UnregisteredUnknownSink>) {
        *self.on_unregistered_unknown.lock().expect("unregistered-unknown sink mutex poisoned") =
            sink;
    }

    fn debug_log(&self, message: impl Into<String>) {
        if self.debugging {
            self.log.emit(LogLevel::Debug, message);
        }
    }

    /// Registers `transceiver` under `identity`, expecting inbound frames
    /// tagged `tag` (§4.4, §6). Wires the transceiver's `message_to_send`
    /// event to this manager's transport.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::NullIdentity`] for the null identity, or
    /// [`RegisterError::DuplicateIdentity`] if `identity` is already
    /// registered (§3 invariant 5).
    pub fn register(
        &self,
        identity: Identity,
        tag: Tag,
        transceiver: Arc<Transceiver>,
    ) -> Result<(), RegisterError> {
        if identity.is_null() {
            return Err(RegisterError::NullIdentity);
        }
        let object_id: ObjectId = identity.into();

        let mut by_id = self.registry.by_id.lock().expect("by_id mutex poisoned");
        if by_id.contains_key(&object_id) {
            return Err(RegisterError::DuplicateIdentity(identity));
        }

        self.wire_send_listener(&transceiver);
        self.registry.push_all(&transceiver);
        by_id.insert(object_id, IdEntry { tag, transceiver });
        Ok(())
    }

    /// Registers `transceiver` to handle unrecognized frames carrying raw
    /// wire tag `tag` (§4.4, §6).
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::DuplicateTag`] if `tag` is already
    /// registered (§3 invariant 5).
    pub fn register_tag(&self, tag: Tag, transceiver: Arc<Transceiver>) -> Result<(), RegisterError> {
        let mut by_tag = self.registry.by_tag.lock().expect("by_tag mutex poisoned");
        if by_tag.contains_key(&tag) {
            return Err(RegisterError::DuplicateTag(tag));
        }

        self.wire_send_listener(&transceiver);
        self.registry.push_all(&transceiver);
        by_tag.insert(tag, transceiver);
        Ok(())
    }

    fn wire_send_listener(&self, transceiver: &Arc<Transceiver>) {
        let transport = Arc::clone(&self.transport);
        let log = self.log.clone();
        let debugging = self.debugging;
        transceiver.set_send_listener(Box::new(move |update: AuthoredObject| {
            let mut encoder = Encoder::new();
            if let Err(err) = encoder.encode(&update.object) {
                log.emit(LogLevel::Warn, format!("encode failed, frame dropped: {err}"));
                return;
            }
            let message = EncodedMessage::new(encoder.into_bytes(), transport.local_identifier());
            let send_result = std::panic::catch_unwind(AssertUnwindSafe(|| transport.send(message)));
            match send_result {
                Ok(Ok(())) => {
                    if debugging {
                        log.emit(LogLevel::Debug, "frame sent");
                    }
                },
                Ok(Err(err)) => log.emit(LogLevel::Warn, format!("transport send failed: {err}")),
                Err(_) => log.emit(LogLevel::Warn, "transport send panicked"),
            }
        }));
    }

    /// Unregisters the transceiver under `identity`, detaching its send
    /// routing. Returns the removed transceiver, if any (§4.4).
    pub fn unregister(&self, identity: Identity) -> Option<Arc<Transceiver>> {
        let object_id: ObjectId = identity.into();
        let entry = self.registry.by_id.lock().expect("by_id mutex poisoned").remove(&object_id)?;
        entry.transceiver.clear_send_listener();
        self.registry.remove_all(&entry.transceiver);
        Some(entry.transceiver)
    }

    /// Unregisters the transceiver handling raw tag `tag`. Returns the
    /// removed transceiver, if any.
    pub fn unregister_tag(&self, tag: Tag) -> Option<Arc<Transceiver>> {
        let transceiver = self.registry.by_tag.lock().expect("by_tag mutex poisoned").remove(&tag)?;
        transceiver.clear_send_listener();
        self.registry.remove_all(&transceiver);
        Some(transceiver)
    }

    /// Detaches every registered transceiver from send routing and clears
    /// all registrations (§4.4 "Disposal detaches transceivers from the
    /// manager's send routing").
    pub fn dispose(&self) {
        for transceiver in self.registry.all.lock().expect("registry mutex poisoned").drain(..) {
            transceiver.clear_send_listener();
        }
        self.registry.by_id.lock().expect("by_id mutex poisoned").clear();
        self.registry.by_tag.lock().expect("by_tag mutex poisoned").clear();
    }

    /// Decodes and routes a single inbound frame (§4.4).
    ///
    /// A decode error or an empty buffer is logged and the frame dropped;
    /// neither ever propagates as a `Result` to the caller, matching §7's
    /// "decode errors never bring down the manager."
    pub fn on_message_received(&self, message: EncodedMessage) {
        let mut decoder = Decoder::new(message.bytes, self.clock.now_ms().0);
        let decoded = match decoder.decode() {
            Ok(Some(object)) => object,
            Ok(None) => {
                self.log.emit(LogLevel::Warn, "received empty frame, dropped");
                return;
            },
            Err(err) => {
                self.log.emit(LogLevel::Warn, format!("decode failed, frame dropped: {err}"));
                return;
            },
        };

        self.debug_log(format!("decoded tag={} author={}", decoded.tag(), message.author));

        match decoded {
            GSObject::UnknownObject(unknown) => self.route_unknown(unknown, message.author),
            recognized => self.route_recognized(recognized, message.author),
        }
    }

    fn route_recognized(&self, object: GSObject, author: u32) {
        let Some(id) = object.id() else {
            self.log.emit(LogLevel::Warn, "recognized object carried no id, dropped");
            return;
        };
        let tag = object.tag();

        let by_id = self.registry.by_id.lock().expect("by_id mutex poisoned");
        let Some(entry) = by_id.get(&id) else {
            drop(by_id);
            self.fire_unregistered_update(object);
            return;
        };
        if entry.tag != tag {
            let transceiver_tag = entry.tag;
            drop(by_id);
            self.log.emit(
                LogLevel::Warn,
                format!("tag mismatch for id {id:?}: registered {transceiver_tag}, got {tag}"),
            );
            self.fire_unregistered_update(object);
            return;
        }

        let transceiver = Arc::clone(&entry.transceiver);
        drop(by_id);
        if let Err(err) = transceiver.set_remote(AuthoredObject::new(object, author)) {
            self.log.emit(LogLevel::Warn, format!("set_remote rejected: {err}"));
        }
    }

    fn route_unknown(&self, unknown: UnknownObject, author: u32) {
        let tag = unknown.tag;
        let by_tag = self.registry.by_tag.lock().expect("by_tag mutex poisoned");
        let Some(transceiver) = by_tag.get(&tag).cloned() else {
            drop(by_tag);
            self.fire_unregistered_unknown(unknown);
            return;
        };
        drop(by_tag);
        let object = GSObject::UnknownObject(unknown);
        if let Err(err) = transceiver.set_remote(AuthoredObject::new(object, author)) {
            self.log.emit(LogLevel::Warn, format!("set_remote rejected: {err}"));
        }
    }

    fn fire_unregistered_update(&self, object: GSObject) {
        self.debug_log("unregistered update");
        let guard = self.on_unregistered_update.lock().expect("unregistered-update sink mutex poisoned");
        let Some(sink) = guard.as_ref() else {
            return;
        };
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| sink(object)));
        drop(guard);
        if result.is_err() {
            self.log.emit(LogLevel::Warn, "on_unregistered_update listener panicked");
        }
    }

    fn fire_unregistered_unknown(&self, unknown: UnknownObject) {
        self.debug_log("unregistered unknown tag");
        let guard =
            self.on_unregistered_unknown.lock().expect("unregistered-unknown sink mutex poisoned");
        let Some(sink) = guard.as_ref() else {
            return;
        };
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| sink(unknown)));
        drop(guard);
        if result.is_err() {
            self.log.emit(LogLevel::Warn, "on_unregistered_unknown listener panicked");
        }
    }

    /// Calls `retransmit()` on every registered transceiver (§4.4). A
    /// single transceiver's panic is isolated and logged; the rest still
    /// run.
    pub fn retransmit_all(&self) {
        let transceivers = self.registry.all.lock().expect("registry mutex poisoned").clone();
        for transceiver in transceivers {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| transceiver.retransmit()));
            if result.is_err() {
                self.log.emit(LogLevel::Warn, "retransmit panicked, transceiver skipped");
            }
        }
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self.registry.all.lock().expect("registry mutex poisoned").len();
        f.debug_struct("Manager").field("registered", &registered).field("debugging", &self.debugging).finish()
    }
}

/// Constructor parameters for a [`TimedManager`]'s jittered retransmit loop
/// (§4.4, §10.3).
///
/// A plain `Default`-deriving struct with named fields, matching
/// [`crate::transceiver::TransceiverConfig`]'s builder style.
#[derive(Debug, Clone, Copy)]
pub struct TimedManagerConfig {
    /// Lower bound, in milliseconds, of the randomized retransmit period.
    pub min_interval_ms: u64,
    /// Upper bound, in milliseconds, of the randomized retransmit period.
    pub max_interval_ms: u64,
}

impl Default for TimedManagerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 500,
            max_interval_ms: 1_500,
        }
    }
}

/// Wraps a [`Manager`] with a dedicated scheduler thread that drives
/// `retransmit_all` on a timer whose period is chosen uniformly at random in
/// `[min_interval_ms, max_interval_ms]` on every tick (§4.4, §5) — jitter to
/// keep a fleet of peers from retransmitting in lockstep.
///
/// The core itself takes no dependency on a clock or scheduler for this
/// (§1 "Timer/scheduling wiring" is out of scope for the base `Manager`);
/// `TimedManager` is the one piece of this crate that owns a real
/// `std::thread` and calls `std::thread::sleep` directly, since its entire
/// job is to be that scheduler.
pub struct TimedManager {
    manager: Arc<Manager>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TimedManager {
    /// Spawns the scheduler thread and starts ticking `manager`.
    #[must_use]
    pub fn start(manager: Arc<Manager>, config: TimedManagerConfig) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let loop_manager = Arc::clone(&manager);
        let loop_shutdown = Arc::clone(&shutdown);

        let handle = thread::spawn(move || {
            while !loop_shutdown.load(Ordering::Relaxed) {
                let wait_ms = if config.max_interval_ms > config.min_interval_ms {
                    rand::thread_rng().gen_range(config.min_interval_ms..=config.max_interval_ms)
                } else {
                    config.min_interval_ms
                };
                thread::sleep(Duration::from_millis(wait_ms));
                if loop_shutdown.load(Ordering::Relaxed) {
                    break;
                }
                loop_manager.retransmit_all();
            }
        });

        Self {
            manager,
            shutdown,
            handle: Some(handle),
        }
    }

    /// The manager this timer drives.
    #[must_use]
    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    /// Signals the scheduler thread to stop and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TimedManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
