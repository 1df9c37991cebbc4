//! COSE_Encrypt0-shaped envelope (spec.md §4.7).
//!
//! Wire layout (simple TLV, not full CBOR — this core treats the
//! envelope as the minimal carrier the original reference implements,
//! not a general-purpose COSE encoder):
//!
//! ```text
//! kid_len[1] || kid[kid_len] || piv_len[1] || partial_iv[piv_len] || ciphertext[..]
//! ```
//!
//! `alg` is never placed on the wire: both peers already fix it to
//! AES-CCM-64-64-128 (spec.md §6), so the protected header is implicit
//! rather than re-encoded on every message.
//!
//! The canonical AAD passed to the AEAD wraps the external AAD
//! (spec.md §4.4) in a small, versioned structure so a future AEAD
//! suite or header change cannot collide with today's byte layout.

use alloc::vec::Vec;

use crate::config::{CONTEXT_CID_LEN, CONTEXT_SEQ_LEN};
use crate::error::UnprotectError;

/// Context string identifying this AAD structure, analogous to COSE's
/// "Encrypt0" context string in `Sig_structure`/`Enc_structure`.
const AAD_CONTEXT: &[u8] = b"Encrypt0";

/// A decoded, borrowed view of an on-wire envelope.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeView<'a> {
    pub kid: &'a [u8],
    pub partial_iv: &'a [u8],
    pub ciphertext: &'a [u8],
}

/// Encode `(kid, partial_iv, ciphertext)` into the wire layout.
pub fn encode(kid: &[u8], partial_iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + kid.len() + partial_iv.len() + ciphertext.len());
    out.push(kid.len() as u8);
    out.extend_from_slice(kid);
    out.push(partial_iv.len() as u8);
    out.extend_from_slice(partial_iv);
    out.extend_from_slice(ciphertext);
    out
}

/// Decode an on-wire envelope. Returns `UnprotectError::NoEnvelope` on
/// any structural mismatch (too short, length fields overrunning the
/// buffer).
pub fn decode(data: &[u8]) -> Result<EnvelopeView<'_>, UnprotectError> {
    if data.is_empty() {
        return Err(UnprotectError::NoEnvelope);
    }

    let kid_len = data[0] as usize;
    if kid_len > CONTEXT_CID_LEN || data.len() < 1 + kid_len + 1 {
        return Err(UnprotectError::NoEnvelope);
    }
    let kid = &data[1..1 + kid_len];

    let piv_pos = 1 + kid_len;
    let piv_len = data[piv_pos] as usize;
    if piv_len > CONTEXT_SEQ_LEN || data.len() < piv_pos + 1 + piv_len {
        return Err(UnprotectError::NoEnvelope);
    }
    let partial_iv = &data[piv_pos + 1..piv_pos + 1 + piv_len];

    let ciphertext = &data[piv_pos + 1 + piv_len..];

    Ok(EnvelopeView {
        kid,
        partial_iv,
        ciphertext,
    })
}

/// Length the canonical AAD will occupy for a given `external_aad`.
pub fn aad_length(external_aad: &[u8]) -> usize {
    AAD_CONTEXT.len() + 2 + external_aad.len()
}

/// Build the canonical AAD string: context string, length-prefixed
/// external AAD.
pub fn build_aad(external_aad: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(aad_length(external_aad));
    out.extend_from_slice(AAD_CONTEXT);
    out.extend_from_slice(&(external_aad.len() as u16).to_be_bytes());
    out.extend_from_slice(external_aad);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let kid = [0x02];
        let piv = [0x08];
        let ct = [0xAA, 0xBB, 0xCC];
        let wire = encode(&kid, &piv, &ct);
        let view = decode(&wire).unwrap();
        assert_eq!(view.kid, &kid);
        assert_eq!(view.partial_iv, &piv);
        assert_eq!(view.ciphertext, &ct);
    }

    #[test]
    fn empty_buffer_has_no_envelope() {
        assert_eq!(decode(&[]), Err(UnprotectError::NoEnvelope));
    }

    #[test]
    fn truncated_buffer_has_no_envelope() {
        // kid_len says 4 bytes of kid but buffer only has 1.
        assert_eq!(decode(&[4, 1]), Err(UnprotectError::NoEnvelope));
    }

    #[test]
    fn build_aad_is_deterministic() {
        let external = [0x40, 0x01, 0x0A];
        let a = build_aad(&external);
        let b = build_aad(&external);
        assert_eq!(a, b);
        assert_eq!(a.len(), aad_length(&external));
    }
}
