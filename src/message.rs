//! The outer-message contract (spec.md §3 "Message", §6).
//!
//! The base CoAP message codec (framing, option delta/length encoding
//! on the wire) is an external collaborator per spec.md §1 — this
//! module only declares the shape this layer needs from it: a code, a
//! token, a typed option set, a payload, and a slot for the bound
//! security context. `coap_model::CoapMessage` is a concrete, minimal
//! implementation good enough for tests and for downstream users who
//! don't already have their own message type.

use alloc::string::String;
use alloc::vec::Vec;

use crate::context::ContextHandle;

/// CoAP option numbers this layer knows about (spec.md §3).
pub mod option_number {
    pub const IF_MATCH: u16 = 1;
    pub const URI_HOST: u16 = 3;
    pub const ETAG: u16 = 4;
    pub const IF_NONE_MATCH: u16 = 5;
    pub const OBSERVE: u16 = 6;
    pub const URI_PORT: u16 = 7;
    pub const LOCATION_PATH: u16 = 8;
    pub const URI_PATH: u16 = 11;
    pub const CONTENT_FORMAT: u16 = 12;
    pub const MAX_AGE: u16 = 14;
    pub const URI_QUERY: u16 = 15;
    pub const ACCEPT: u16 = 17;
    pub const LOCATION_QUERY: u16 = 20;
    pub const OBJECT_SECURITY: u16 = 21;
    pub const BLOCK2: u16 = 23;
    pub const BLOCK1: u16 = 27;
    pub const SIZE2: u16 = 28;
    pub const PROXY_URI: u16 = 35;
    pub const PROXY_SCHEME: u16 = 39;
    pub const SIZE1: u16 = 60;
}

/// CoAP method/response codes relevant to AAD role selection.
pub mod code {
    pub const EMPTY: u8 = 0x00;
    pub const GET: u8 = 0x01;
    pub const POST: u8 = 0x02;
    pub const PUT: u8 = 0x03;
    pub const DELETE: u8 = 0x04;
    pub const CONTENT: u8 = 0x45;
}

/// Block1/Block2 option value: block number, more-blocks flag, and
/// block size exponent (`size = 16 << size_exp`), matching the
/// original's `block*_num` / `block*_more` / `block*_size` split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOption {
    pub num: u32,
    pub more: bool,
    pub size_exp: u8,
}

impl BlockOption {
    pub fn size(&self) -> u16 {
        16u16 << self.size_exp
    }

    pub fn offset(&self) -> u32 {
        self.num << (self.size_exp as u32 + 4)
    }

    /// Encode into the single CoAP integer-option value.
    pub fn to_u32(self) -> u32 {
        (self.num << 4) | ((self.more as u32) << 3) | (self.size_exp as u32 & 0x07)
    }

    /// Decode from the single CoAP integer-option value.
    pub fn from_u32(raw: u32) -> Self {
        let more = (raw & 0x08) != 0;
        let size_exp = (raw & 0x07) as u8;
        let num = raw >> 4;
        Self {
            num,
            more,
            size_exp,
        }
    }
}

/// Every option this layer reads or writes (spec.md §3).
///
/// Presence is `Option<T>` (or `bool` for the valueless If-None-Match)
/// rather than a separate bitmap + value array — the Rust-idiomatic
/// collapse of the original's "bit in a bitmap, plus a value field"
/// pair into one type per option.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    pub if_match: Option<Vec<u8>>,
    pub uri_host: Option<String>,
    pub etag: Option<Vec<u8>>,
    pub if_none_match: bool,
    pub observe: Option<u32>,
    pub uri_port: Option<u16>,
    pub location_path: Option<String>,
    pub uri_path: Option<String>,
    pub content_format: Option<u16>,
    pub uri_query: Option<String>,
    pub accept: Option<u16>,
    pub location_query: Option<String>,
    pub block1: Option<BlockOption>,
    pub block2: Option<BlockOption>,
    pub size1: Option<u32>,
    pub size2: Option<u32>,

    // Outer-only: never placed in the inner (confidential) message.
    pub max_age: Option<u32>,
    pub proxy_uri: Option<String>,
    pub proxy_scheme: Option<String>,
}

impl OptionSet {
    /// Drop every option that §4.5 places in the inner message, so
    /// they don't also leak in the outer, post-protect message
    /// (spec.md §4.8 step 11).
    pub fn clear_confidential(&mut self) {
        self.if_match = None;
        self.uri_host = None;
        self.etag = None;
        self.if_none_match = false;
        self.observe = None;
        self.uri_port = None;
        self.location_path = None;
        self.uri_path = None;
        self.content_format = None;
        self.uri_query = None;
        self.accept = None;
        self.location_query = None;
        self.block1 = None;
        self.block2 = None;
        self.size1 = None;
        self.size2 = None;
    }
}

/// What the protect/unprotect pipelines need from an outer message.
///
/// Implement this over whatever message type the surrounding transport
/// layer already has; this layer never owns the message, only mutates
/// it in place (spec.md §3 "Ownership").
pub trait OuterMessage {
    fn code(&self) -> u8;
    fn token(&self) -> &[u8];

    fn payload(&self) -> &[u8];
    fn set_payload(&mut self, data: Vec<u8>);

    fn options(&self) -> &OptionSet;
    fn options_mut(&mut self) -> &mut OptionSet;

    /// The Object-Security option value. Empty means "the envelope is
    /// in the payload instead" on both send and receive (spec.md §6).
    fn object_security(&self) -> &[u8];
    fn set_object_security(&mut self, data: Vec<u8>);

    fn context(&self) -> Option<ContextHandle>;
    fn set_context(&mut self, ctx: Option<ContextHandle>);
}
