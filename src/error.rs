//! Error taxonomy (spec.md §7).
//!
//! One small `Display`-only type per failure domain, in the teacher's
//! style: no `anyhow`/`thiserror`, just `core::fmt::Display` plus a
//! `std::error::Error` impl gated behind the `std` feature so the crate
//! stays usable in `no_std` embeddings.
//!
//! Disposition matters here: `Replay`, `AuthFail`, and
//! `InnerParseError` variants never carry plaintext or key material, so
//! a caller that accidentally logs or echoes an error back to a peer
//! cannot leak anything useful to an attacker (spec.md §7's "MUST NOT
//! leak timing or plaintext").

use core::fmt;

/// Context-store failures (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The fixed-capacity context pool is full.
    CapacityExhausted,
    /// `free`/lookup referenced a handle that is no longer live.
    InvalidHandle,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExhausted => write!(f, "context store capacity exhausted"),
            Self::InvalidHandle => write!(f, "invalid or freed context handle"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ContextError {}

/// Nonce-builder failure (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceError {
    /// `partial_iv.len() > IV_LEN`.
    PartialIvTooLong,
}

impl fmt::Display for NonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartialIvTooLong => write!(f, "partial-iv too long"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NonceError {}

/// Inner-message parse failure (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerParseError {
    /// Option buffer ended mid-option.
    Truncated,
    /// An unrecognized option with an odd (critical) number was seen.
    UnsupportedCriticalOption(u32),
    /// Decrypted payload exceeds `REST_MAX_CHUNK_SIZE`.
    PayloadTooLarge,
}

impl fmt::Display for InnerParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "inner message truncated"),
            Self::UnsupportedCriticalOption(n) => {
                write!(f, "unsupported critical option {}", n)
            }
            Self::PayloadTooLarge => write!(f, "inner payload exceeds max chunk size"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InnerParseError {}

/// Failure classes for `pipeline::prepare_message` (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectError {
    /// `message.context` is unset.
    NoContext,
    /// The sender sequence counter has reached its retirement margin.
    SequenceExhausted,
    /// The serialized inner message would not fit in the header buffer.
    SerializationOverflow,
    /// The AEAD primitive rejected the operation (e.g. bad key length).
    AeadFail,
}

impl fmt::Display for ProtectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoContext => write!(f, "no security context bound to message"),
            Self::SequenceExhausted => write!(f, "sender sequence counter exhausted"),
            Self::SerializationOverflow => write!(f, "serialized header exceeds max"),
            Self::AeadFail => write!(f, "aead seal failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtectError {}

/// Failure classes for `pipeline::decode_packet` (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnprotectError {
    /// Neither the Object-Security option nor the payload carried a
    /// decodable envelope.
    NoEnvelope,
    /// The envelope's `kid` did not resolve to a known context.
    NoContext,
    /// The received partial-IV was not strictly greater than
    /// `receiver_seq`; the message MUST be dropped silently.
    Replay,
    /// AEAD tag verification failed; the message MUST be dropped
    /// silently and MUST NOT be distinguished from `Replay` via timing.
    AuthFail,
    /// Decrypted plaintext did not parse as a valid inner message.
    InnerParseError(InnerParseError),
}

impl fmt::Display for UnprotectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnvelope => write!(f, "no decodable object-security envelope"),
            Self::NoContext => write!(f, "no security context for kid"),
            Self::Replay => write!(f, "replayed or reordered partial-iv"),
            Self::AuthFail => write!(f, "aead authentication failed"),
            Self::InnerParseError(e) => write!(f, "inner parse error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnprotectError {}

impl From<InnerParseError> for UnprotectError {
    fn from(e: InnerParseError) -> Self {
        Self::InnerParseError(e)
    }
}
