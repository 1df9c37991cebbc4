//! Minimal outer-message (de)serializer.
//!
//! spec.md §1 puts the base CoAP message codec out of scope as an
//! external collaborator: the surrounding transport layer is assumed to
//! already parse incoming bytes into an [`OuterMessage`] and to frame
//! outgoing ones. `oscore-core` only re-serializes the *inner*
//! (confidential) message itself (`inner` module). This module exists
//! only so `pipeline::prepare_message` has something to hand the
//! caller's output buffer to, and so the test suite can drive a
//! complete send → wire bytes → receive round trip without pulling in
//! an external CoAP crate. It uses the same option delta/length nibble
//! encoding as `inner`, over whatever options remain on the message
//! after the confidential subset has been cleared, plus the
//! Object-Security option.

use alloc::vec::Vec;

use crate::error::{InnerParseError, ProtectError};
use crate::inner::{decode_coap_uint, encode_coap_uint, read_extended, write_option};
use crate::message::{option_number as opt, BlockOption, OptionSet, OuterMessage};

/// Every outer-visible option in ascending option-number order,
/// including the Object-Security carrier (spec.md §6).
fn outer_entries(opts: &OptionSet, object_security: &[u8]) -> Vec<(u16, Vec<u8>)> {
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
    if let Some(v) = opts.max_age {
        entries.push((opt::MAX_AGE, encode_coap_uint(v)));
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
    // Object-Security is always present as a marker once the message has
    // been protected, even with an empty value (spec.md §6).
    entries.push((opt::OBJECT_SECURITY, object_security.to_vec()));
    if let Some(v) = opts.block2 {
        entries.push((opt::BLOCK2, encode_coap_uint(v.to_u32())));
    }
    if let Some(v) = opts.block1 {
        entries.push((opt::BLOCK1, encode_coap_uint(v.to_u32())));
    }
    if let Some(v) = opts.size2 {
        entries.push((opt::SIZE2, encode_coap_uint(v)));
    }
    if let Some(v) = &opts.proxy_uri {
        entries.push((opt::PROXY_URI, v.as_bytes().to_vec()));
    }
    if let Some(v) = &opts.proxy_scheme {
        entries.push((opt::PROXY_SCHEME, v.as_bytes().to_vec()));
    }
    if let Some(v) = opts.size1 {
        entries.push((opt::SIZE1, encode_coap_uint(v)));
    }

    entries
}

/// Serialize `message` (code, token, outer options, Object-Security,
/// payload) into `out`. Returns the number of bytes written.
///
/// This runs *after* the protect pipeline has cleared the confidential
/// options and placed the envelope, so only non-confidential options
/// plus the Object-Security marker remain.
pub fn encode(message: &impl OuterMessage, out: &mut [u8]) -> Result<usize, ProtectError> {
    let mut buf = Vec::new();
    buf.push(message.code());
    buf.push(message.token().len() as u8);
    buf.extend_from_slice(message.token());

    let entries = outer_entries(message.options(), message.object_security());
    let mut prev_number = 0u32;
    for (number, value) in &entries {
        let number = *number as u32;
        write_option(&mut buf, number - prev_number, value);
        prev_number = number;
    }

    let payload = message.payload();
    if !payload.is_empty() {
        buf.push(0xFF);
        buf.extend_from_slice(payload);
    }

    if buf.len() > out.len() {
        return Err(ProtectError::SerializationOverflow);
    }
    out[..buf.len()].copy_from_slice(&buf);
    Ok(buf.len())
}

/// Fields recovered from [`encode`]'s wire format, for tests that want
/// to simulate a full send → wire bytes → receive round trip.
#[derive(Debug, Default)]
pub struct DecodedOuter {
    pub code: u8,
    pub token: Vec<u8>,
    pub options: OptionSet,
    pub object_security: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Inverse of [`encode`].
pub fn decode(raw: &[u8]) -> Result<DecodedOuter, InnerParseError> {
    if raw.len() < 2 {
        return Err(InnerParseError::Truncated);
    }
    let code = raw[0];
    let token_len = raw[1] as usize;
    if raw.len() < 2 + token_len {
        return Err(InnerParseError::Truncated);
    }
    let token = raw[2..2 + token_len].to_vec();
    let mut rest = &raw[2 + token_len..];

    let mut options = OptionSet::default();
    let mut object_security = Vec::new();
    let mut payload = Vec::new();
    let mut option_number: u32 = 0;

    while !rest.is_empty() {
        if (rest[0] & 0xF0) == 0xF0 {
            payload = rest[1..].to_vec();
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
        apply_outer_option(&mut options, &mut object_security, option_number, value);
    }

    Ok(DecodedOuter {
        code,
        token,
        options,
        object_security,
        payload,
    })
}

fn apply_outer_option(options: &mut OptionSet, object_security: &mut Vec<u8>, number: u32, value: &[u8]) {
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
        opt::MAX_AGE => options.max_age = Some(decode_coap_uint(value)),
        opt::URI_QUERY => options.uri_query = Some(String::from_utf8_lossy(value).into_owned()),
        opt::ACCEPT => options.accept = Some(decode_coap_uint(value) as u16),
        opt::LOCATION_QUERY => {
            options.location_query = Some(String::from_utf8_lossy(value).into_owned())
        }
        opt::OBJECT_SECURITY => *object_security = value.to_vec(),
        opt::BLOCK2 => options.block2 = Some(BlockOption::from_u32(decode_coap_uint(value))),
        opt::BLOCK1 => options.block1 = Some(BlockOption::from_u32(decode_coap_uint(value))),
        opt::SIZE2 => options.size2 = Some(decode_coap_uint(value)),
        opt::PROXY_URI => options.proxy_uri = Some(String::from_utf8_lossy(value).into_owned()),
        opt::PROXY_SCHEME => {
            options.proxy_scheme = Some(String::from_utf8_lossy(value).into_owned())
        }
        opt::SIZE1 => options.size1 = Some(decode_coap_uint(value)),
        _ => {}
    }
}

use alloc::string::String;
