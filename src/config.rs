//! Compile-time constants recognized by the core (spec.md §6).
//!
//! These mirror the `wire::` constant banner convention in the teacher
//! crate: plain `pub const`s, grouped, no environment variables or
//! runtime configuration — contexts and limits are fixed at build time
//! for a constrained target.

/// Maximum number of simultaneously live security contexts.
pub const CONTEXT_NUM: usize = 8;

/// AEAD key length in bytes (AES-128 key for CCM-64-64-128).
pub const CONTEXT_KEY_LEN: usize = 16;

/// Common IV length in bytes.
pub const CONTEXT_INIT_VECT_LEN: usize = 7;

/// Maximum partial-IV (sequence number) encoding length on the wire.
pub const CONTEXT_SEQ_LEN: usize = 4;

/// Maximum context-id encoding length on the wire.
pub const CONTEXT_CID_LEN: usize = 4;

/// Maximum inner-message payload length, enforced on encode
/// (`ProtectError::SerializationOverflow`) and decode
/// (`InnerParseError::PayloadTooLarge`) so round-tripping never
/// silently drops data.
pub const REST_MAX_CHUNK_SIZE: usize = 256;

/// AEAD authentication tag length in bytes (CCM-64-64-128: 64-bit tag).
pub const TAG_LEN: usize = 8;

/// Alias kept for readers coming from spec.md's terminology.
pub const KEY_LEN: usize = CONTEXT_KEY_LEN;

/// Alias kept for readers coming from spec.md's terminology.
pub const IV_LEN: usize = CONTEXT_INIT_VECT_LEN;

/// Upper bound on the serialized inner-message header (options + token,
/// not counting payload). Exceeding it is `ProtectError::SerializationOverflow`.
pub const MAX_INNER_HEADER_BYTES: usize = 128;

/// Sequence numbers within this distance of `u32::MAX` retire the
/// context rather than risk wraparound (spec.md §9, REDESIGN FLAG 5).
pub const SEQUENCE_RETIRE_MARGIN: u32 = 1 << 16;

/// The Object-Security option number in this OSCORE draft generation
/// (spec.md §6: "number 21 in this family").
pub const OPTION_OBJECT_SECURITY: u16 = 21;
