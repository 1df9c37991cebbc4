//! Inner-message serializer and parser (spec.md §4.5, §4.6).
//!
//! The inner message is the confidential subset of the outer message:
//! the token, a fixed set of options in ascending option-number order
//! using the standard CoAP option delta/length nibble encoding, and
//! (if present) a `0xFF` payload marker followed by the payload. This
//! is the plaintext that gets AEAD-sealed; §4.7/§4.8 never see option
//! numbers directly.

use alloc::vec::Vec;

use crate::config::REST_MAX_CHUNK_SIZE;
use crate::error::{InnerParseError, ProtectError};
use crate::message::{code, option_number as opt, BlockOption, OptionSet, OuterMessage};

/// Placeholder plaintext for an empty (code `0.00`) message — the
/// reference special-cases this rather than serializing an (absent)
/// option set.
const EMPTY_MESSAGE_PLACEHOLDER: [u8; 4] = [0, 0, 0, 0];

fn nibble_and_ext(v: u32) -> (u8, Vec<u8>) {
    if v < 13 {
        (v as u8, Vec::new())
    } else if v < 269 {
        (13, alloc::vec![(v - 13) as u8])
    } else {
        let rest = v - 269;
        (14, alloc::vec![(rest >> 8) as u8, (rest & 0xFF) as u8])
    }
}

pub(crate) fn write_option(out: &mut Vec<u8>, delta: u32, value: &[u8]) {
    let (delta_nibble, delta_ext) = nibble_and_ext(delta);
    let (len_nibble, len_ext) = nibble_and_ext(value.len() as u32);
    out.push((delta_nibble << 4) | len_nibble);
    out.extend_from_slice(&delta_ext);
    out.extend_from_slice(&len_ext);
    out.extend_from_slice(value);
}

/// Minimal big-endian encoding of a CoAP integer option: value `0`
/// encodes as zero bytes (distinct from `codec::to_bytes`, which is
/// for the AAD/nonce machinery, not CoAP option values).
pub(crate) fn encode_coap_uint(v: u32) -> Vec<u8> {
    if v == 0 {
        return Vec::new();
    }
    let full = v.to_be_bytes();
    let first_nonzero = full.iter().position(|&b| b != 0).unwrap_or(3);
    full[first_nonzero..].to_vec()
}

pub(crate) fn decode_coap_uint(bytes: &[u8]) -> u32 {
    let mut out = 0u32;
    for &b in bytes {
        out = (out << 8) | b as u32;
    }
    out
}

/// Ordered (by option number) (number, value) entries to serialize,
/// skipping options that are unset. Options MUST be included in the
/// inner plaintext when set (spec.md §4.5): If-Match, ETag,
/// If-None-Match, Observe, URI-Port, Location-Path, URI-Path,
/// Content-Format, URI-Query, Accept, Location-Query, Block1, Block2,
/// Size1, Size2, and URI-Host. Max-Age, Proxy-URI, Proxy-Scheme, and
/// Object-Security are never placed here.
fn confidential_entries(opts: &OptionSet) -> Vec<(u16, Vec<u8>)> {
    let mut entries = Vec::new();

    if let Some(v) = &opts.if_match {
        entries.push((opt::IF_MATCH, v.clone()));
    }
    if let Some(v) = &opts.uri_host {
        entries.push((opt::URI_HOST, v.as_bytes().to_vec()));
    }
    if let Some(v) = &opts.etag {
        entries.push((opt::ETAG, v.clone()));
    }
    if opts.if_none_match {
        entries.push((opt::IF_NONE_MATCH, Vec::new()));
    }
    if let Some(v) = opts.observe {
        entries.push((opt::OBSERVE, encode_coap_uint(v)));
    }
    if let Some(v) = opts.uri_port {
        entries.push((opt::URI_PORT, encode_coap_uint(v as u32)));
    }
    if let Some(v) = &opts.location_path {
        entries.push((opt::LOCATION_PATH, v.as_bytes().to_vec()));
    }
    if let Some(v) = &opts.uri_path {
        entries.push((opt::URI_PATH, v.as_bytes().to_vec()));
    }
    if let Some(v) = opts.content_format {
        entries.push((opt::CONTENT_FORMAT, encode_coap_uint(v as u32)));
    }
    if let Some(v) = &opts.uri_query {
        entries.push((opt::URI_QUERY, v.as_bytes().to_vec()));
    }
    if let Some(v) = opts.accept {
        entries.push((opt::ACCEPT, encode_coap_uint(v as u32)));
    }
    if let Some(v) = &opts.location_query {
        entries.push((opt::LOCATION_QUERY, v.as_bytes().to_vec()));
    }
    if let Some(v) = opts.block2 {
        entries.push((opt::BLOCK2, encode_coap_uint(v.to_u32())));
    }
    if let Some(v) = opts.block1 {
        entries.push((opt::BLOCK1, encode_coap_uint(v.to_u32())));
    }
    if let Some(v) = opts.size2 {
        entries.push((opt::SIZE2, encode_coap_uint(v)));
    }
    if let Some(v) = opts.size1 {
        entries.push((opt::SIZE1, encode_coap_uint(v)));
    }

    entries
}

/// Serialize token + confidential options + payload into the inner
/// plaintext (spec.md §4.5).
pub fn encode(message: &impl OuterMessage) -> Result<Vec<u8>, ProtectError> {
    if message.code() == code::EMPTY {
        return Ok(EMPTY_MESSAGE_PLACEHOLDER.to_vec());
    }

    let mut out = Vec::new();
    out.extend_from_slice(message.token());

    let entries = confidential_entries(message.options());
    let mut prev_number = 0u32;
    for (number, value) in &entries {
        let number = *number as u32;
        write_option(&mut out, number - prev_number, value);
        prev_number = number;

        if out.len() > crate::config::MAX_INNER_HEADER_BYTES {
            return Err(ProtectError::SerializationOverflow);
        }
    }

    let payload = message.payload();
    if !payload.is_empty() {
        if payload.len() > REST_MAX_CHUNK_SIZE {
            return Err(ProtectError::SerializationOverflow);
        }
        out.push(0xFF);
        out.extend_from_slice(payload);
    }

    Ok(out)
}

/// Result of parsing the decrypted inner plaintext back into message
/// fields (spec.md §4.6).
#[derive(Debug, Default)]
pub struct ParsedInner {
    pub token: Vec<u8>,
    pub options: OptionSet,
    pub payload: Vec<u8>,
}

/// Inverse of [`encode`]. The option bitmap (here: `OptionSet`) is
/// built fresh — spec.md §4.6 calls out clearing it first to avoid
/// carry-over from the outer message's own options.
///
/// This does not know where the token ends inside `plaintext` unless
/// the caller tells it (the inner message has no explicit token-length
/// field, matching the reference, which relies on the outer message's
/// already-known token length). Pass `token_len` from the outer
/// message's token.
pub fn decode(plaintext: &[u8], token_len: usize) -> Result<ParsedInner, InnerParseError> {
    if plaintext.len() < token_len {
        return Err(InnerParseError::Truncated);
    }

    let token = plaintext[..token_len].to_vec();
    let mut rest = &plaintext[token_len..];

    let mut options = OptionSet::default();
    let mut payload = Vec::new();
    let mut option_number: u32 = 0;

    while !rest.is_empty() {
        if (rest[0] & 0xF0) == 0xF0 {
            let body = &rest[1..];
            if body.len() > REST_MAX_CHUNK_SIZE {
                return Err(InnerParseError::PayloadTooLarge);
            }
            payload = body.to_vec();
            break;
        }

        let delta_nibble = rest[0] >> 4;
        let length_nibble = rest[0] & 0x0F;
        rest = &rest[1..];

        let delta = read_extended(&mut rest, delta_nibble as u32)?;
        let length = read_extended(&mut rest, length_nibble as u32)? as usize;

        if rest.len() < length {
            return Err(InnerParseError::Truncated);
        }
        let value = &rest[..length];
        rest = &rest[length..];

        option_number += delta;
        apply_option(&mut options, option_number, value)?;
    }

    Ok(ParsedInner {
        token,
        options,
        payload,
    })
}

/// Consume the 0/1/2-byte extension for a delta or length nibble,
/// returning the full value (spec.md §4.6: 13 → +byte; 14 → +255 + two
/// bytes).
pub(crate) fn read_extended(rest: &mut &[u8], nibble: u32) -> Result<u32, InnerParseError> {
    match nibble {
        13 => {
            let b = *rest.first().ok_or(InnerParseError::Truncated)?;
            *rest = &rest[1..];
            Ok(13 + b as u32)
        }
        14 => {
            let b0 = *rest.first().ok_or(InnerParseError::Truncated)?;
            let b1 = *rest.get(1).ok_or(InnerParseError::Truncated)?;
            *rest = &rest[2..];
            Ok(269 + ((b0 as u32) << 8) + b1 as u32)
        }
        n => Ok(n),
    }
}

fn apply_option(options: &mut OptionSet, number: u32, value: &[u8]) -> Result<(), InnerParseError> {
    match number as u16 {
        opt::IF_MATCH => options.if_match = Some(value.to_vec()),
        opt::URI_HOST => options.uri_host = Some(String::from_utf8_lossy(value).into_owned()),
        opt::ETAG => options.etag = Some(value.to_vec()),
        opt::IF_NONE_MATCH => options.if_none_match = true,
        opt::OBSERVE => options.observe = Some(decode_coap_uint(value)),
        opt::URI_PORT => options.uri_port = Some(decode_coap_uint(value) as u16),
        opt::LOCATION_PATH => {
            options.location_path = Some(String::from_utf8_lossy(value).into_owned())
        }
        opt::URI_PATH => options.uri_path = Some(String::from_utf8_lossy(value).into_owned()),
        opt::CONTENT_FORMAT => options.content_format = Some(decode_coap_uint(value) as u16),
        opt::URI_QUERY => options.uri_query = Some(String::from_utf8_lossy(value).into_owned()),
        opt::ACCEPT => options.accept = Some(decode_coap_uint(value) as u16),
        opt::LOCATION_QUERY => {
            options.location_query = Some(String::from_utf8_lossy(value).into_owned())
        }
        opt::BLOCK2 => options.block2 = Some(BlockOption::from_u32(decode_coap_uint(value))),
        opt::BLOCK1 => options.block1 = Some(BlockOption::from_u32(decode_coap_uint(value))),
        opt::SIZE2 => options.size2 = Some(decode_coap_uint(value)),
        opt::SIZE1 => options.size1 = Some(decode_coap_uint(value)),
        _ => {
            if number % 2 == 1 {
                return Err(InnerParseError::UnsupportedCriticalOption(number));
            }
        }
    }
    Ok(())
}

use alloc::string::String;
