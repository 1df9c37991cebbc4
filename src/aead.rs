//! AEAD boundary: AES-CCM-64-64-128 (spec.md §4.7, treated as a black
//! box oracle over `(key, nonce, aad, plaintext)`).
//!
//! Mirrors the teacher's `aead` module (AES-256-GCM there) but swaps in
//! `ccm`/`aes` for the COSE algorithm this spec names: a 128-bit key, a
//! 7-byte nonce, and a 64-bit (8-byte) tag.

use alloc::vec::Vec;

use aes::Aes128;
use ccm::aead::{Aead, KeyInit, Payload};
use ccm::consts::{U7, U8};
use ccm::Ccm;

use crate::config::{IV_LEN, KEY_LEN};
use crate::error::{ProtectError, UnprotectError};

/// AES-CCM-64-64-128: 128-bit key, 7-byte nonce, 8-byte tag.
type Aes128Ccm64_64 = Ccm<Aes128, U8, U7>;

/// Seal (encrypt) path. `ciphertext.len() == plaintext.len() + TAG_LEN`.
pub fn seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; IV_LEN],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, ProtectError> {
    let cipher = Aes128Ccm64_64::new_from_slice(key).map_err(|_| ProtectError::AeadFail)?;
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    cipher
        .encrypt(nonce.into(), payload)
        .map_err(|_| ProtectError::AeadFail)
}

/// Open (decrypt + verify) path. Tag mismatch surfaces as
/// `UnprotectError::AuthFail`, never anything more specific.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; IV_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, UnprotectError> {
    let cipher = Aes128Ccm64_64::new_from_slice(key).map_err(|_| UnprotectError::AuthFail)?;
    let payload = Payload {
        msg: ciphertext,
        aad,
    };
    cipher
        .decrypt(nonce.into(), payload)
        .map_err(|_| UnprotectError::AuthFail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F];
    const NONCE: [u8; IV_LEN] = [0; IV_LEN];

    #[test]
    fn seal_then_open_round_trips() {
        let ct = seal(&KEY, &NONCE, b"aad", b"hello").unwrap();
        assert_eq!(ct.len(), b"hello".len() + 8);
        let pt = open(&KEY, &NONCE, b"aad", &ct).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn wrong_aad_fails_open() {
        let ct = seal(&KEY, &NONCE, b"aad", b"hello").unwrap();
        assert_eq!(
            open(&KEY, &NONCE, b"other", &ct),
            Err(UnprotectError::AuthFail)
        );
    }

    #[test]
    fn tampered_ciphertext_fails_open() {
        let mut ct = seal(&KEY, &NONCE, b"aad", b"hello").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0xFF;
        assert_eq!(
            open(&KEY, &NONCE, b"aad", &ct),
            Err(UnprotectError::AuthFail)
        );
    }
}
