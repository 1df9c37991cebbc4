//! Known-answer / scenario tests reproducing spec.md §8 S1–S6.
//!
//! The AEAD primitive is a black box (spec.md §1 non-goal: "the AEAD
//! primitive itself ... not (re)designed here"), so these check the
//! *structural* outputs the scenarios specify — sequence counters,
//! partial-IV encoding, external AAD bytes, where the envelope lands —
//! rather than fixed AES-CCM ciphertext bytes.

use oscore_core::coap_model::CoapMessage;
use oscore_core::context::ALG_AES_CCM_64_64_128;
use oscore_core::{config, ContextStore};

const SENDER_KEY: [u8; config::CONTEXT_KEY_LEN] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
];
const SENDER_IV: [u8; config::CONTEXT_INIT_VECT_LEN] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
const RECEIVER_KEY: [u8; config::CONTEXT_KEY_LEN] = [
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F,
];
const RECEIVER_IV: [u8; config::CONTEXT_INIT_VECT_LEN] = [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16];

/// One context per peer (each peer owns its own store), mirrored keys,
/// both bound to the wire context id `2` used throughout spec.md §8.
fn peers() -> (
    ContextStore,
    oscore_core::ContextHandle,
    ContextStore,
    oscore_core::ContextHandle,
) {
    let mut store_a = ContextStore::new();
    let a = store_a
        .new_context(2, SENDER_KEY, SENDER_IV, RECEIVER_KEY, RECEIVER_IV)
        .unwrap();

    let mut store_b = ContextStore::new();
    let b = store_b
        .new_context(2, RECEIVER_KEY, RECEIVER_IV, SENDER_KEY, SENDER_IV)
        .unwrap();

    (store_a, a, store_b, b)
}

#[test]
fn s1_request_protect_empty_payload() {
    let (mut store_a, a, _store_b, _b) = peers();

    let mut msg = CoapMessage::get();
    msg.token = vec![0x4A];
    msg.options.uri_path = Some("temp".into());
    msg.context = Some(a);

    let mut buf = [0u8; 256];
    oscore_core::pipeline::prepare_message(&mut msg, &mut store_a, &mut buf).unwrap();

    let ctx = store_a.get(a).unwrap();
    assert_eq!(ctx.sender_seq, 1);

    let external_aad = oscore_core::aad::request_aad(
        oscore_core::message::code::GET,
        ALG_AES_CCM_64_64_128,
    );
    assert_eq!(external_aad.as_slice(), &[0x40, 0x01, 0x0A]);

    assert!(!msg.object_security.is_empty());
    assert!(msg.payload.is_empty());
}

#[test]
fn s2_response_protect_non_empty_payload() {
    let (mut store_a, a, _store_b, _b) = peers();
    store_a.get_mut(a).unwrap().sender_seq = 7;

    let mut msg = CoapMessage::content();
    msg.token = vec![0x4A];
    msg.payload = b"{\"t\":23}".to_vec();
    msg.context = Some(a);

    let mut buf = [0u8; 256];
    oscore_core::pipeline::prepare_message(&mut msg, &mut store_a, &mut buf).unwrap();

    let ctx = store_a.get(a).unwrap();
    assert_eq!(ctx.sender_seq, 8);

    let external_aad = oscore_core::aad::response_aad(
        oscore_core::message::code::CONTENT,
        ALG_AES_CCM_64_64_128,
        &[0x02],
        &[0x08],
    );
    assert_eq!(external_aad.as_slice(), &[0x40, 0x45, 0x0A, 0x02, 0x08]);

    assert!(!msg.payload.is_empty());
    assert!(msg.object_security.is_empty());
}

#[test]
fn s3_receive_replay_rejection() {
    let (mut store_a, a, mut store_b, b) = peers();
    store_a.get_mut(a).unwrap().sender_seq = 4;
    store_b.get_mut(b).unwrap().receiver_seq = 4;

    let mut sent = CoapMessage::get();
    sent.context = Some(a);
    let mut buf = [0u8; 256];
    let n = oscore_core::pipeline::prepare_message(&mut sent, &mut store_a, &mut buf).unwrap();
    let decoded = oscore_core::outer::decode(&buf[..n]).unwrap();

    let mut first = CoapMessage::get();
    first.object_security = decoded.object_security.clone();
    let mut second = CoapMessage::get();
    second.object_security = decoded.object_security;

    oscore_core::pipeline::decode_packet(&mut first, &mut store_b).unwrap();
    assert_eq!(store_b.get(b).unwrap().receiver_seq, 5);

    let err = oscore_core::pipeline::decode_packet(&mut second, &mut store_b).unwrap_err();
    assert_eq!(err, oscore_core::UnprotectError::Replay);
    assert_eq!(store_b.get(b).unwrap().receiver_seq, 5);
}

#[test]
fn s4_receive_tampered_ciphertext() {
    let (mut store_a, a, mut store_b, b) = peers();

    let mut sent = CoapMessage::get();
    sent.context = Some(a);
    let mut buf = [0u8; 256];
    let n = oscore_core::pipeline::prepare_message(&mut sent, &mut store_a, &mut buf).unwrap();
    let decoded = oscore_core::outer::decode(&buf[..n]).unwrap();

    let mut tampered = decoded.object_security;
    let last = tampered.len() - 1;
    tampered[last] ^= 0xFF;

    let mut received = CoapMessage::get();
    received.object_security = tampered;

    let before = store_b.get(b).unwrap().receiver_seq;
    let err = oscore_core::pipeline::decode_packet(&mut received, &mut store_b).unwrap_err();
    assert_eq!(err, oscore_core::UnprotectError::AuthFail);
    assert_eq!(store_b.get(b).unwrap().receiver_seq, before);
}

#[test]
fn s5_unknown_kid() {
    let (_store_a, _a, mut store_b, _b) = peers();
    let envelope_bytes = oscore_core::envelope::encode(&[0xFF], &[0x01], &[0u8; 9]);

    let mut msg = CoapMessage::get();
    msg.object_security = envelope_bytes;

    let err = oscore_core::pipeline::decode_packet(&mut msg, &mut store_b).unwrap_err();
    assert_eq!(err, oscore_core::UnprotectError::NoContext);
}

#[test]
fn s6_round_trip_with_options() {
    let (mut store_a, a, mut store_b, b) = peers();

    let mut sent = CoapMessage::get();
    sent.token = vec![0x4A];
    sent.options.uri_path = Some("a/b".into());
    sent.options.content_format = Some(50);
    sent.options.accept = Some(50);
    sent.options.max_age = Some(60);
    sent.context = Some(a);

    let mut buf = [0u8; 256];
    let n = oscore_core::pipeline::prepare_message(&mut sent, &mut store_a, &mut buf).unwrap();

    // Max-Age is never placed in the inner message; it travels (or
    // doesn't) as an outer-only option and the sending side never
    // clears it from the pre-protect message's options.
    assert!(sent.options.max_age.is_some());
    assert!(sent.options.uri_path.is_none());

    let decoded = oscore_core::outer::decode(&buf[..n]).unwrap();
    let mut received = CoapMessage::get();
    received.token = decoded.token;
    received.options = decoded.options;
    received.object_security = decoded.object_security;
    received.payload = decoded.payload;

    oscore_core::pipeline::decode_packet(&mut received, &mut store_b).unwrap();

    assert_eq!(received.options.uri_path.as_deref(), Some("a/b"));
    assert_eq!(received.options.content_format, Some(50));
    assert_eq!(received.options.accept, Some(50));
    assert_eq!(received.context, Some(b));
}
