//! A minimal, concrete `OuterMessage` (spec.md §6 "Outer-message
//! contract").
//!
//! The base CoAP message codec is an external collaborator per spec.md
//! §1 — this module does not implement wire framing or option
//! delta/length parsing for the *outer* message (that lives in
//! `inner::encode`/`inner::decode` only for the *inner*, confidential
//! subset). `CoapMessage` just holds the fields the pipelines touch, in
//! a plain struct any embedder can construct directly or convert into
//! from their own message type.

use alloc::vec::Vec;

use crate::context::ContextHandle;
use crate::message::{code, OptionSet, OuterMessage};

/// A standalone CoAP request/response, good enough to drive the
/// pipelines in tests and for downstream users who don't already have
/// their own message type plugged in via [`OuterMessage`].
#[derive(Debug, Clone, Default)]
pub struct CoapMessage {
    pub code: u8,
    pub token: Vec<u8>,
    pub options: OptionSet,
    pub payload: Vec<u8>,
    pub object_security: Vec<u8>,
    pub context: Option<ContextHandle>,
}

impl CoapMessage {
    /// An empty (code `0.00`) message — spec.md §4.5's special case.
    pub fn empty() -> Self {
        Self {
            code: code::EMPTY,
            ..Default::default()
        }
    }

    /// A bare GET request, ready for options/token to be filled in.
    pub fn get() -> Self {
        Self {
            code: code::GET,
            ..Default::default()
        }
    }

    /// A bare POST request.
    pub fn post() -> Self {
        Self {
            code: code::POST,
            ..Default::default()
        }
    }

    /// A bare 2.05 Content response.
    pub fn content() -> Self {
        Self {
            code: code::CONTENT,
            ..Default::default()
        }
    }
}

impl OuterMessage for CoapMessage {
    fn code(&self) -> u8 {
        self.code
    }

    fn token(&self) -> &[u8] {
        &self.token
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn set_payload(&mut self, data: Vec<u8>) {
        self.payload = data;
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    fn object_security(&self) -> &[u8] {
        &self.object_security
    }

    fn set_object_security(&mut self, data: Vec<u8>) {
        self.object_security = data;
    }

    fn context(&self) -> Option<ContextHandle> {
        self.context
    }

    fn set_context(&mut self, ctx: Option<ContextHandle>) {
        self.context = ctx;
    }
}
