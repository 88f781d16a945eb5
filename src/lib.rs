//! # xmldom
//!
//! A DOM-style XML document model: build, mutate, query and serialize XML
//! trees with full namespace support.
//!
//! A [`Document`] owns every node in an arena. Nodes are addressed through
//! small `Copy` handles, either the raw [`NodeId`] or a typed wrapper such as
//! [`Element`] or [`Attribute`]; [`Document::wrap`] turns any handle into the
//! [`Node`] enum for `match` dispatch. Handles are checked on use, so a
//! handle from another document or from before [`Document::free`] is
//! reported instead of reading the wrong node.
//!
//! ## Quick Start
//!
//! ```
//! use xmldom::Document;
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("root").unwrap();
//! doc.set_document_element(root).unwrap();
//!
//! let child = doc.create_element_ns("http://example.com/ns", "child").unwrap();
//! doc.append_child(root, child).unwrap();
//!
//! assert_eq!(
//!     doc.to_string_fragment(true),
//!     r#"<root xmlns:ns0="http://example.com/ns"><ns0:child/></root>"#
//! );
//!
//! let found = doc.find_nodes("*").unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(doc.node_name(found[0]), "ns0:child");
//! ```
//!
//! ## Modules
//!
//! - [`tree`]: the document model, handles, namespaces and [`walk`].
//! - [`parser`]: XML 1.0 parsing into a [`Document`].
//! - [`xpath`]: `XPath` 1.0 evaluation.
//! - [`serial`]: XML output and canonical XML.
//! - [`encoding`]: byte decoding for [`Document::parse_bytes`].

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;
pub mod xpath;

// Re-export primary types at the crate root for convenience.
pub use error::{Error, Result};
pub use tree::{
    walk, AsNode, Attribute, CDataSection, Comment, Document, DocumentNode, DocumentType,
    Element, Namespace, Node, NodeId, NodeType, NsId, ProcessingInstruction, Text,
};
