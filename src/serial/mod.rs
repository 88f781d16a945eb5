//! XML serialization.
//!
//! This module serializes a `Document` tree back to XML text. The serializer
//! handles escaping, the XML declaration, indentation and the namespace
//! declarations a tree needs at each element. Canonical XML (C14N) produces
//! the deterministic byte sequences digests and signatures are computed over.

pub mod c14n;
mod scope;
pub mod xml;

pub use xml::{serialize, serialize_with_options, SerializeOptions};
