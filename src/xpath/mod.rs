//! `XPath` 1.0 query language.
//!
//! An implementation of <https://www.w3.org/TR/xpath-10/>: a lexer, a
//! recursive descent parser producing an [`ast::Expr`], and an evaluator
//! running it against a [`Document`].
//!
//! # Quick Start
//!
//! ```
//! use xmldom::Document;
//! use xmldom::xpath::{evaluate, XPathValue};
//!
//! let doc = Document::parse_str("<root><a>1</a><b>2</b></root>").unwrap();
//! let root = doc.document_element().unwrap();
//! let result = evaluate(&doc, root, "count(*)").unwrap();
//! assert_eq!(result, XPathValue::Number(2.0));
//!
//! let nodes = doc.find_nodes("b").unwrap();
//! assert_eq!(doc.text_content(nodes[0]), "2");
//! ```
//!
//! # Known Limitations
//!
//! - The `namespace::` axis selects nothing; namespace declarations are not
//!   nodes of the tree.
//! - Unprefixed name tests match only nodes in no namespace, as `XPath` 1.0
//!   prescribes. Register a prefix for the default namespace to select its
//!   elements.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod types;

pub use eval::XPathContext;
pub use types::{XPathError, XPathValue};

use tracing::debug;

use crate::error::{Error, Result};
use crate::tree::{AsNode, Document, Node};

/// Compiles `expression` and evaluates it with `context` as the context
/// node.
///
/// To run one expression against many context nodes, compile it once with
/// [`parser::parse`] and reuse [`XPathContext::evaluate`].
///
/// # Errors
///
/// Returns [`XPathError`] if the expression is malformed or evaluation fails.
pub fn evaluate(
    doc: &Document,
    context: impl AsNode,
    expression: &str,
) -> std::result::Result<XPathValue, XPathError> {
    let expr = parser::parse(expression)?;
    XPathContext::new(doc, context).evaluate(&expr)
}

impl Document {
    /// Selects nodes with an `XPath` expression evaluated from the document
    /// element.
    ///
    /// # Errors
    ///
    /// - [`Error::NodeNotFound`] if the document has no document element.
    /// - See [`find_nodes_from`](Self::find_nodes_from) for the query errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::{Document, Node};
    ///
    /// let doc = Document::parse_str(r#"<r><i n="1"/><i n="2"/></r>"#).unwrap();
    /// let hits = doc.find_nodes("i[@n = 2]").unwrap();
    /// assert_eq!(hits.len(), 1);
    /// assert!(matches!(hits[0], Node::Element(_)));
    /// ```
    pub fn find_nodes(&self, expression: &str) -> Result<Vec<Node>> {
        let root = self.document_element().ok_or(Error::NodeNotFound)?;
        self.find_nodes_from(root, expression)
    }

    /// Selects nodes with an `XPath` expression evaluated from `node`.
    ///
    /// # Errors
    ///
    /// - [`Error::XPath`] wrapping [`XPathError::InvalidExpression`] for a
    ///   malformed expression, or [`XPathError::TypeError`] when the result
    ///   is not a node-set.
    /// - The handle errors for foreign or stale handles.
    pub fn find_nodes_from(&self, node: impl AsNode, expression: &str) -> Result<Vec<Node>> {
        let node = self.check(node)?;
        let value = evaluate(self, node, expression)?;
        let XPathValue::NodeSet(ids) = value else {
            return Err(XPathError::type_error("node-set", &value).into());
        };
        debug!(expression, matches = ids.len(), "find nodes");
        ids.into_iter().map(|id| self.wrap(id)).collect()
    }
}
