//! A minimal, schema-agnostic XML layer: a streaming [`Builder`] for
//! constructing EBICS request documents, and a DOM-backed [`Destructor`] for
//! tearing down responses and ISO 20022 documents.
//!
//! Neither side understands any particular schema — callers name elements by
//! path or local name, the way a hand-written SAX/DOM walk would, rather than
//! through schema-generated bindings (those are out of scope, see §1 of the
//! specification this crate implements).

mod builder;
mod destructor;

pub use builder::{Builder, XmlBuildError};
pub use destructor::{Destructor, DestructionError};
