//! EBICS message construction and parsing, the whole-message authentication
//! signature, the upload/download transaction state machines, and the
//! subscriber key lifecycle (INI/HIA/HPB handshake plus sealed key files).
//!
//! Order-data payloads (pain.001 in, camt.05x out) are opaque byte slices
//! at this layer — `iso20022` owns their structure. This crate only moves
//! bytes through compress/encrypt/sign and back, in the shapes EBICS
//! requires on the wire.

pub mod auth_signature;
pub mod backoff;
pub mod canonical;
pub mod dialect;
pub mod download;
pub mod envelope;
pub mod error;
pub mod key_management;
pub mod order;
pub mod return_code;
pub mod subscriber;
pub mod upload;

pub use dialect::Dialect;
pub use error::ProtocolError;
pub use return_code::EbicsReturnCode;
pub use subscriber::{KeyManagementState, Subscriber};
