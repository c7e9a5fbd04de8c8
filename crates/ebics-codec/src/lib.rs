//! Codec utilities shared by the EBICS message layer and the payment domain.
//!
//! - [`crockford`] — Base32-Crockford, with the fixed-size 32/64-byte wrappers
//!   used for hash codes on the wire.
//! - [`b64`] — base64 newtype wrapper, used for EBICS payload chunking.
//! - [`deflate`] — raw DEFLATE compress/inflate, as EBICS applies it directly
//!   to order data before encryption.
//! - [`xml`] — a streaming, namespace-aware [`xml::Builder`] and a DOM-backed
//!   [`xml::Destructor`], standing in for schema-generated bindings.

pub mod b64;
pub mod crockford;
pub mod deflate;
pub mod xml;

pub use crockford::{CrockfordError, HashCode32, HashCode64};
