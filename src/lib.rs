//! # oscore-core
//!
//! Object Security for Constrained RESTful Environments (OSCORE-style)
//! core: wraps and unwraps a plaintext CoAP-like request/response inside
//! an authenticated-encryption envelope so inner method code, options,
//! and payload stay confidential and integrity-protected end to end
//! across proxies that only see outer headers.
//!
//! ## Quick start
//!
//! ```
//! use oscore_core::{ContextStore, config, pipeline, coap_model::CoapMessage};
//!
//! let mut store = ContextStore::new();
//! let sender = store
//!     .new_context(2, [0x11; config::CONTEXT_KEY_LEN], [0x22; config::CONTEXT_INIT_VECT_LEN],
//!                  [0x33; config::CONTEXT_KEY_LEN], [0x44; config::CONTEXT_INIT_VECT_LEN])
//!     .unwrap();
//!
//! let mut msg = CoapMessage::get();
//! msg.options.uri_path = Some("temp".into());
//! msg.context = Some(sender);
//!
//! let mut buf = [0u8; 256];
//! let n = pipeline::prepare_message(&mut msg, &mut store, &mut buf).unwrap();
//! assert!(n > 0);
//! ```
//!
//! ## What's NOT provided
//!
//! - Key agreement or context provisioning (contexts are installed
//!   externally by the embedding application).
//! - The transport layer / base CoAP message codec (framing of outer
//!   headers, option delta/length encoding on the wire) — modeled here
//!   only where this layer re-serializes the *inner* message.
//! - A replay window (out-of-order partial-IVs are rejected outright).
//! - CLI or boot glue.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod aad;
pub mod aead;
pub mod coap_model;
pub mod codec;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod inner;
pub mod message;
pub mod nonce;
pub mod outer;
pub mod pipeline;

pub use context::{ContextHandle, ContextStore, SecurityContext};
pub use error::{ContextError, InnerParseError, NonceError, ProtectError, UnprotectError};
pub use message::OuterMessage;
