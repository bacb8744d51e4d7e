//! End-to-end scenarios driving the codec, Transceiver, and Manager together,
//! the way two peers would over a real transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gamesync_core::{
    Algorithm, AuthoredObject, Clock, DecodeError, Decoder, Encoder, EncodedMessage, GSObject,
    HeadIPD1, Identity, Manager, Mode, ObjectId, Tag, TestClock, Transceiver, TransceiverConfig,
    Transport, TransportError, UnknownObject,
};
use gamesync_proto::{Bytes, DateTimeMs, Head1, Loc2, Rot2, TAG_HEAD1, TAG_HEAD_IPD1};

/// A transport that just records every frame handed to it.
struct RecordingTransport {
    sent: Mutex<Vec<EncodedMessage>>,
    local_identifier: u32,
}

impl RecordingTransport {
    fn new(local_identifier: u32) -> Self {
        Self { sent: Mutex::new(Vec::new()), local_identifier }
    }
}

impl Transport for RecordingTransport {
    fn send(&self, message: EncodedMessage) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn local_identifier(&self) -> u32 {
        self.local_identifier
    }
}

fn head1(id: u64, time_ms: u64) -> AuthoredObject {
    AuthoredObject::new(
        GSObject::Head1(Head1 {
            id: ObjectId(id),
            time: DateTimeMs(time_ms),
            loc: Loc2 { x: 0.0, y: 0.0, z: 0.0, vx: 0.0, vy: 0.0, vz: 0.0 },
            rot: Rot2 { x: 0.0, y: 0.0, z: 0.0, vx: 0.0, vy: 0.0, vz: 0.0 },
            ipd: None,
        }),
        1,
    )
}

/// §8 scenario: a timestamped object round-trips through the wire codec and
/// reconciles correctly once it lands in a registered transceiver.
#[test]
fn head1_with_ipd_round_trips_through_manager() {
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new(60_000));
    let transport = Arc::new(RecordingTransport::new(1));
    let manager = Manager::new(Arc::clone(&transport) as Arc<dyn Transport>, Arc::clone(&clock), false);

    let transceiver = Arc::new(Transceiver::new(TransceiverConfig::default(), Arc::clone(&clock)));
    manager.register(Identity(42), TAG_HEAD1, Arc::clone(&transceiver)).unwrap();

    let sender_view = GSObject::Head1(Head1 {
        id: ObjectId(42),
        time: DateTimeMs(60_000),
        loc: Loc2 { x: 1.0, y: 2.0, z: 3.0, vx: 0.0, vy: 0.0, vz: 0.0 },
        rot: Rot2 { x: 0.0, y: 0.0, z: 0.0, vx: 0.0, vy: 0.0, vz: 0.0 },
        ipd: Some(3.140625),
    });
    let mut encoder = Encoder::new();
    encoder.encode(&sender_view).unwrap();
    let wire = encoder.into_bytes();

    manager.on_message_received(EncodedMessage::new(wire, 7));

    let rendered = transceiver.render().expect("remote update should have rendered");
    assert_eq!(rendered.object, sender_view);
    assert_eq!(rendered.author, 7);

    // Destructive consumption: a second render sees nothing new.
    assert_eq!(transceiver.render(), None);
}

/// §8 scenario: a frame for an id nobody registered surfaces through
/// `on_unregistered_update` instead of being silently dropped.
#[test]
fn unregistered_identity_surfaces_as_event() {
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new(1_000));
    let transport = Arc::new(RecordingTransport::new(1));
    let manager = Manager::new(Arc::clone(&transport) as Arc<dyn Transport>, clock, false);

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = Arc::clone(&seen);
    manager.set_on_unregistered_update(Some(Box::new(move |object| {
        assert_eq!(object.id(), Some(ObjectId(99)));
        seen_clone.fetch_add(1, Ordering::SeqCst);
    })));

    let mut encoder = Encoder::new();
    encoder.encode(&head1(99, 1_000).object).unwrap();
    manager.on_message_received(EncodedMessage::new(encoder.into_bytes(), 2));

    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

/// §8 scenario: an unrecognized tag nobody registered a handler for
/// surfaces through `on_unregistered_unknown`, not a decode error.
#[test]
fn unregistered_unknown_tag_surfaces_as_event() {
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new(0));
    let transport = Arc::new(RecordingTransport::new(1));
    let manager = Manager::new(Arc::clone(&transport) as Arc<dyn Transport>, clock, false);

    let seen: Arc<Mutex<Option<Tag>>> = Arc::new(Mutex::new(None));
    let seen_clone = Arc::clone(&seen);
    manager.set_on_unregistered_unknown(Some(Box::new(move |unknown: UnknownObject| {
        *seen_clone.lock().unwrap() = Some(unknown.tag);
    })));

    let mut encoder = Encoder::new();
    let obj = GSObject::UnknownObject(UnknownObject {
        tag: 0x42,
        bytes: Bytes::from_static(&[0x01, 0x02]),
    });
    encoder.encode(&obj).unwrap();
    manager.on_message_received(EncodedMessage::new(encoder.into_bytes(), 3));

    assert_eq!(*seen.lock().unwrap(), Some(0x42));
}

/// §8 scenario: retransmit takeover promotes a silent remote owner's last
/// value into the local slot and resends it on their behalf.
#[test]
fn retransmit_takes_over_after_remote_goes_silent() {
    let clock = Arc::new(TestClock::new(0));
    let config = TransceiverConfig { expiry_ms: 2_000, ..Default::default() };
    let transceiver = Transceiver::new(config, Arc::clone(&clock) as Arc<dyn Clock>);

    clock.set(10_000);
    transceiver.set_remote(head1(5, 10_000)).unwrap();

    // First tick only arms the grace period; it never retransmits.
    assert!(!transceiver.retransmit());

    clock.advance(2_500);
    assert!(transceiver.retransmit());

    let rendered = transceiver.render().expect("promoted remote renders as local");
    assert_eq!(rendered.object.id(), Some(ObjectId(5)));
}

/// §8 scenario: a non-monotonic `set_local` is rejected and leaves the
/// previously accepted state exactly as it was.
#[test]
fn non_monotonic_local_update_is_rejected_without_side_effects() {
    let clock = Arc::new(TestClock::new(10_000));
    let transceiver = Transceiver::new(TransceiverConfig::default(), Arc::clone(&clock) as Arc<dyn Clock>);

    transceiver.set_local(head1(1, 10_000)).unwrap();
    let err = transceiver.set_local(head1(1, 1_000)).unwrap_err();
    assert!(matches!(err, gamesync_core::SetLocalError::NonMonotonic { .. }));

    let rendered = transceiver.render().unwrap();
    assert_eq!(rendered.object.timestamp(), Some(DateTimeMs(10_000)));
}

/// §8 scenario: `prerendered` suppresses a local win from reaching the host
/// render callback, even though the local value is genuinely newer.
#[test]
fn prerendered_transceiver_suppresses_local_win() {
    let clock = Arc::new(TestClock::new(60_000));
    let config = TransceiverConfig { prerendered: true, ..Default::default() };
    let transceiver = Transceiver::new(config, Arc::clone(&clock) as Arc<dyn Clock>);

    transceiver.set_remote(head1(1, 0)).unwrap();
    transceiver.set_local(head1(1, 60_000)).unwrap();

    assert_eq!(transceiver.render(), None);
}

/// A `SendOnly` transceiver ignores Latest-algorithm arrival ordering
/// entirely: whatever the host last set locally is always what renders and
/// retransmits, independent of what (if anything) arrives remotely.
#[test]
fn send_only_transceiver_ignores_remote_entirely() {
    let clock = Arc::new(TestClock::new(0));
    let config =
        TransceiverConfig { mode: Mode::SendOnly, algorithm: Algorithm::Latest, ..Default::default() };
    let transceiver = Transceiver::new(config, Arc::clone(&clock) as Arc<dyn Clock>);

    assert_eq!(
        transceiver.set_remote(head1(1, 0)),
        Err(gamesync_core::SetRemoteError::ModeViolation)
    );

    transceiver.set_local(head1(1, 0)).unwrap();
    let rendered = transceiver.render().unwrap();
    assert_eq!(rendered.object.id(), Some(ObjectId(1)));
}

/// Untimed variants (HeadIPD1) only make sense under `Algorithm::Latest`;
/// confirm an end-to-end exchange of one through the Manager still works.
#[test]
fn untimed_variant_routes_through_manager_under_latest() {
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new(1_000));
    let transport = Arc::new(RecordingTransport::new(1));
    let manager = Manager::new(Arc::clone(&transport) as Arc<dyn Transport>, Arc::clone(&clock), false);

    let config = TransceiverConfig { algorithm: Algorithm::Latest, ..Default::default() };
    let transceiver = Arc::new(Transceiver::new(config, clock));
    manager.register(Identity(1), TAG_HEAD_IPD1, Arc::clone(&transceiver)).unwrap();

    let obj = GSObject::HeadIPD1(HeadIPD1 { id: ObjectId(1), ipd: 0.125 });
    let mut encoder = Encoder::new();
    encoder.encode(&obj).unwrap();
    manager.on_message_received(EncodedMessage::new(encoder.into_bytes(), 4));

    let rendered = transceiver.render().unwrap();
    assert_eq!(rendered.object, obj);
}

/// A truncated frame is reported as a decode error rather than panicking,
/// and does not disturb a registered transceiver's existing state.
#[test]
fn truncated_frame_is_a_decode_error_not_a_panic() {
    let mut encoder = Encoder::new();
    encoder.encode(&head1(1, 0).object).unwrap();
    let full = encoder.into_bytes();
    let truncated = full.slice(0..full.len() - 1);

    let mut decoder = Decoder::new(truncated, 0);
    assert!(matches!(decoder.decode(), Err(DecodeError::TruncatedBody { .. })));
}
