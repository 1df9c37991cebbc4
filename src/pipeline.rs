//! Protect / unprotect orchestration (spec.md §4.8, §4.9).
//!
//! `prepare_message` is the encrypt side: serialize the confidential
//! inner message, seal it, and splice the envelope back into the
//! message. `decode_packet` is the decrypt side: pull the envelope back
//! out, verify and decrypt it, and repopulate the message's options and
//! payload from the recovered plaintext. Neither function owns the
//! message or the store — both are borrowed for the duration of the
//! call, matching spec.md §5's "scoped buffers" model.

use alloc::vec::Vec;

use crate::aad;
use crate::aead;
use crate::codec;
use crate::config::OPTION_OBJECT_SECURITY;
use crate::context::ContextStore;
use crate::envelope;
use crate::error::{ProtectError, UnprotectError};
use crate::inner;
use crate::message::OuterMessage;
use crate::nonce;
use crate::outer;

/// Encrypt `message` in place and serialize the resulting outer message
/// into `out` (spec.md §4.8). Returns the number of bytes written.
///
/// Preconditions: `message.context()` must be set to a live handle in
/// `store`.
pub fn prepare_message(
    message: &mut impl OuterMessage,
    store: &mut ContextStore,
    out: &mut [u8],
) -> Result<usize, ProtectError> {
    let handle = message.context().ok_or(ProtectError::NoContext)?;
    let ctx = store.get_mut(handle).map_err(|_| ProtectError::NoContext)?;

    // Step 1: serialize the confidential subset before anything about
    // the context changes, so a failure here never burns a sequence
    // number.
    let plaintext = inner::encode(message)?;

    // Step 2/3: fix the algorithm, advance the sender counter.
    let alg_id = ctx.alg.id();
    let seq = ctx.increment_sender_seq()?;

    // Step 4: partial IV + nonce.
    let partial_iv = codec::to_bytes(seq);
    let nonce_bytes = nonce::build_nonce(&ctx.sender_iv, &partial_iv)
        .map_err(|_| ProtectError::AeadFail)?;

    // Step 5: kid is always the bound context's real id (spec.md §9,
    // REDESIGN FLAG 4 — never a hardcoded placeholder).
    let kid = codec::to_bytes(ctx.context_id);

    // Step 6/7: AAD.
    let external_aad = if aad::is_request_code(message.code()) {
        aad::request_aad(message.code(), alg_id)
    } else {
        aad::response_aad(message.code(), alg_id, &kid, &partial_iv)
    };
    let canonical_aad = envelope::build_aad(&external_aad);

    // Step 8: encrypt.
    let ciphertext = aead::seal(&ctx.sender_key, &nonce_bytes, &canonical_aad, &plaintext)?;

    log::trace!(
        "prepare_message: cid={} seq={} plaintext_len={} ciphertext_len={}",
        ctx.context_id,
        seq,
        plaintext.len(),
        ciphertext.len()
    );

    // Step 9: encode envelope.
    let envelope_bytes = envelope::encode(&kid, &partial_iv, &ciphertext);

    // Step 10: place the envelope, then step 11: clear confidential
    // options so they cannot also leak in the outer message.
    if !message.payload().is_empty() {
        message.set_payload(envelope_bytes);
        message.set_object_security(Vec::new());
    } else {
        message.set_object_security(envelope_bytes);
        message.set_payload(Vec::new());
    }
    message.options_mut().clear_confidential();

    // Step 12: serialize the outer message.
    outer::encode(message, out)
}

/// Decrypt `message` in place (spec.md §4.9). On success, the message's
/// options and payload are the recovered inner fields and
/// `message.context()` is set to the resolved context.
///
/// On `Replay` or `AuthFail`, `message` is left with whatever partial
/// mutation already happened to its Object-Security/payload slot (the
/// caller MUST drop the message either way) but `store` state is
/// unaffected beyond what spec.md §4.9 step 4 requires.
pub fn decode_packet(
    message: &mut impl OuterMessage,
    store: &mut ContextStore,
) -> Result<(), UnprotectError> {
    // Step 1: locate the envelope bytes.
    let carrier: Vec<u8> = if message.object_security().is_empty() {
        message.payload().to_vec()
    } else {
        message.object_security().to_vec()
    };

    // Step 2: decode the envelope.
    let view = envelope::decode(&carrier)?;
    let kid = view.kid.to_vec();
    let partial_iv = view.partial_iv.to_vec();
    let ciphertext = view.ciphertext.to_vec();

    // Step 3: lookup context by kid.
    let cid = codec::from_bytes(&kid);
    let handle = store.find_by_cid(cid).ok_or(UnprotectError::NoContext)?;
    let ctx = store.get_mut(handle).map_err(|_| UnprotectError::NoContext)?;

    // Step 4: replay check, before any decryption work. Read-only: an
    // attacker-forged envelope with a high partial-IV and a bogus tag
    // must not be able to advance `receiver_seq` on its own — only a
    // message that also passes AEAD verification below may do that.
    let incoming_seq = codec::from_bytes(&partial_iv);
    if incoming_seq <= ctx.receiver_seq {
        log::trace!("decode_packet: cid={} replay seq={}", cid, incoming_seq);
        return Err(UnprotectError::Replay);
    }

    // Step 5: nonce from the receiver's static IV and the *received*
    // partial IV.
    let nonce_bytes = nonce::build_nonce(&ctx.receiver_iv, &partial_iv)
        .map_err(|_| UnprotectError::NoEnvelope)?;

    // Step 6/7: AAD. Open Question 2 resolved: on receive, the
    // response AAD uses the received (kid, partial_iv) from the
    // envelope, never the receiver's own send-side counter.
    let alg_id = ctx.alg.id();
    let external_aad = if aad::is_request_code(message.code()) {
        aad::request_aad(message.code(), alg_id)
    } else {
        aad::response_aad(message.code(), alg_id, &kid, &partial_iv)
    };
    let canonical_aad = envelope::build_aad(&external_aad);

    // Step 8: decrypt and verify. Only a message that authenticates may
    // advance the receiver's high-water mark.
    let plaintext = aead::open(&ctx.receiver_key, &nonce_bytes, &canonical_aad, &ciphertext)?;
    ctx.receiver_seq = incoming_seq;

    log::trace!(
        "decode_packet: cid={} seq={} plaintext_len={}",
        cid,
        incoming_seq,
        plaintext.len()
    );

    // Step 9: re-parse the plaintext and merge it back into the
    // message, then attach the resolved context.
    let parsed = inner::decode(&plaintext, message.token().len())?;
    *message.options_mut() = parsed.options;
    message.set_payload(parsed.payload);
    message.set_object_security(Vec::new());
    message.set_context(Some(handle));

    Ok(())
}

/// The Object-Security option number this pipeline reads/writes,
/// exported for callers assembling their own outer codec (spec.md §6:
/// "number 21 in this family").
pub const OBJECT_SECURITY_OPTION: u16 = OPTION_OBJECT_SECURITY;
