//! Canonical XML (C14N) serialization.
//!
//! Implements Canonical XML 1.0 <https://www.w3.org/TR/xml-c14n/> and
//! Exclusive XML Canonicalization 1.0 <https://www.w3.org/TR/xml-exc-c14n/>.
//!
//! Canonical XML produces a unique, deterministic byte sequence for logically
//! equivalent XML documents, which is what digests and signatures are
//! computed over.
//!
//! # Key C14N rules
//!
//! - No XML declaration and no DOCTYPE in output
//! - Attributes sorted by namespace URI then local name
//! - Namespace declarations sorted by prefix, emitted only where the
//!   binding changes with respect to the nearest output ancestor
//! - Empty elements always use start-end tag pairs (`<a></a>`, not `<a/>`)
//! - CDATA sections replaced with escaped text content
//! - Specific character escaping rules for text content and attribute values
//!
//! Namespace bindings are the ones the XML writer would produce, including
//! declarations it adds for nodes bound outside their scope. Canonicalizing a
//! tree and canonicalizing the reparsed [`dump`](Document::dump) of it give
//! the same bytes.
//!
//! # Examples
//!
//! ```
//! use xmldom::Document;
//! use xmldom::serial::c14n::{canonicalize, C14nOptions};
//!
//! let doc = Document::parse_str("<root><child/></root>").unwrap();
//! let c14n = canonicalize(&doc, &C14nOptions::default());
//! assert_eq!(c14n, "<root><child></child></root>");
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use super::scope::{NsScope, OpenElement};
use crate::error::{Error, Result};
use crate::tree::{AsNode, Document, NodeId, NodeKind};

/// Options for canonical XML serialization.
///
/// Controls the mode of canonicalization: inclusive or exclusive,
/// with or without comments.
///
/// # Examples
///
/// ```
/// use xmldom::serial::c14n::C14nOptions;
///
/// // Default: inclusive C14N with comments
/// let opts = C14nOptions::default();
/// assert!(opts.with_comments);
/// assert!(!opts.exclusive);
/// ```
#[derive(Debug, Clone)]
pub struct C14nOptions {
    /// If true, include comments in output (C14N with comments).
    /// If false, strip comments (plain C14N).
    pub with_comments: bool,
    /// If true, use exclusive C14N (Exclusive XML Canonicalization 1.0).
    /// If false, use inclusive C14N.
    pub exclusive: bool,
    /// For exclusive C14N, the list of additional namespace prefixes to
    /// treat as visibly utilized (the `InclusiveNamespaces PrefixList`).
    /// `#default` names the default namespace.
    pub inclusive_prefixes: Vec<String>,
}

impl Default for C14nOptions {
    fn default() -> Self {
        Self {
            with_comments: true,
            exclusive: false,
            inclusive_prefixes: Vec::new(),
        }
    }
}

impl C14nOptions {
    /// Enables or disables comments in the output.
    #[must_use]
    pub fn with_comments(mut self, with_comments: bool) -> Self {
        self.with_comments = with_comments;
        self
    }

    /// Selects exclusive canonicalization.
    #[must_use]
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Sets the `InclusiveNamespaces PrefixList` used in exclusive mode.
    #[must_use]
    pub fn inclusive_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inclusive_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }
}

/// Serializes a document to Canonical XML.
///
/// Comments and processing instructions outside the document element are
/// kept (comments only with [`C14nOptions::with_comments`]) and separated
/// from it by a newline.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
/// use xmldom::serial::c14n::{canonicalize, C14nOptions};
///
/// let doc = Document::parse_str("<root attr2=\"b\" attr1=\"a\"/>").unwrap();
/// let c14n = canonicalize(&doc, &C14nOptions::default());
/// // Attributes are sorted, empty element uses start-end tags
/// assert_eq!(c14n, "<root attr1=\"a\" attr2=\"b\"></root>");
/// ```
#[must_use]
pub fn canonicalize(doc: &Document, options: &C14nOptions) -> String {
    let mut ctx = C14nContext::new(doc, options, NsScope::default());
    ctx.process_document();
    ctx.finish()
}

/// Serializes a subtree (specific node and its descendants) to Canonical XML.
///
/// Namespace declarations made on the node's ancestors are in scope for the
/// subtree: inclusive mode renders all of them on the apex, exclusive mode
/// only those the subtree visibly uses.
///
/// # Panics
///
/// Panics if `node` does not belong to `doc` or is stale.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
/// use xmldom::serial::c14n::{canonicalize_subtree, C14nOptions};
///
/// let doc = Document::parse_str(r#"<r xmlns:p="urn:p"><p:a>text</p:a></r>"#).unwrap();
/// let a = doc.find_nodes("*").unwrap()[0];
/// let c14n = canonicalize_subtree(&doc, a, &C14nOptions::default());
/// assert_eq!(c14n, r#"<p:a xmlns:p="urn:p">text</p:a>"#);
/// ```
#[must_use]
pub fn canonicalize_subtree(doc: &Document, node: impl AsNode, options: &C14nOptions) -> String {
    let id = node.node_id();
    let mut ctx = C14nContext::new(doc, options, NsScope::inherited(doc, id));
    ctx.process_node(id);
    ctx.finish()
}

impl Document {
    /// Canonicalizes the document element subtree, without comments.
    ///
    /// `exclusive` selects Exclusive XML Canonicalization, which only
    /// renders the namespace declarations each element visibly uses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] if the document has no document
    /// element.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str(r#"<r b="2" a="1"><!--x--><e/></r>"#).unwrap();
    /// assert_eq!(doc.to_string_c14n(false).unwrap(), r#"<r a="1" b="2"><e></e></r>"#);
    /// ```
    pub fn to_string_c14n(&self, exclusive: bool) -> Result<String> {
        let root = self.document_element().ok_or(Error::NodeNotFound)?;
        let options = C14nOptions::default()
            .with_comments(false)
            .exclusive(exclusive);
        Ok(canonicalize_subtree(self, root, &options))
    }
}

/// In-scope or rendered bindings: prefix (empty string for the default
/// namespace) to URI.
type NsBinding = BTreeMap<String, String>;

/// Internal context for C14N serialization.
struct C14nContext<'a> {
    doc: &'a Document,
    options: &'a C14nOptions,
    output: String,
    /// Bindings in force, as the XML writer would declare them.
    scope: NsScope,
    /// Bindings rendered on the output ancestors of the current element.
    rendered_ns_stack: Vec<NsBinding>,
}

impl<'a> C14nContext<'a> {
    fn new(doc: &'a Document, options: &'a C14nOptions, scope: NsScope) -> Self {
        Self {
            doc,
            options,
            output: String::new(),
            scope,
            rendered_ns_stack: vec![NsBinding::new()],
        }
    }

    fn finish(self) -> String {
        debug!(
            exclusive = self.options.exclusive,
            with_comments = self.options.with_comments,
            bytes = self.output.len(),
            "canonicalized"
        );
        self.output
    }

    /// Processes the entire document node.
    fn process_document(&mut self) {
        let doc = self.doc;
        let children: Vec<NodeId> = doc.children(doc.root()).collect();
        let root_elem_index = children
            .iter()
            .position(|&id| matches!(doc.node(id).kind, NodeKind::Element { .. }));

        for (i, &child) in children.iter().enumerate() {
            match &doc.node(child).kind {
                NodeKind::Element { .. } => self.process_element(child),
                NodeKind::Comment { .. } if !self.options.with_comments => {}
                NodeKind::Comment { .. } | NodeKind::ProcessingInstruction { .. } => {
                    let after_root = root_elem_index.is_some_and(|root_idx| i > root_idx);
                    if after_root {
                        self.output.push('\n');
                    }
                    self.process_node(child);
                    if root_elem_index.is_some_and(|root_idx| i < root_idx) {
                        self.output.push('\n');
                    }
                }
                // DOCTYPE and stray character data at the document level
                // are not output.
                _ => {}
            }
        }
    }

    /// Processes a single node, dispatching by kind.
    fn process_node(&mut self, id: NodeId) {
        match &self.doc.node(id).kind {
            NodeKind::Element { .. } => self.process_element(id),
            // CDATA sections are replaced with their escaped text content.
            NodeKind::Text { content } | NodeKind::CData { content } => {
                write_c14n_text(&mut self.output, content);
            }
            NodeKind::Comment { content } => {
                if self.options.with_comments {
                    write_c14n_comment(&mut self.output, content);
                }
            }
            NodeKind::ProcessingInstruction { target, data } => {
                write_c14n_pi(&mut self.output, target, data.as_deref());
            }
            NodeKind::Document => self.process_document(),
            NodeKind::Attribute { .. } | NodeKind::DocumentType { .. } => {}
        }
    }

    /// Processes an element node according to C14N rules.
    ///
    /// 1. Resolves the element's names and the bindings in force
    /// 2. Outputs the namespace declarations that changed, sorted by prefix
    /// 3. Outputs attributes sorted by namespace URI and local name
    /// 4. Recursively processes children
    /// 5. Always uses start-end tag pairs (never self-closing)
    fn process_element(&mut self, id: NodeId) {
        let doc = self.doc;
        let mark = self.scope.mark();
        let open = self.scope.open_element(doc, id, &[]);
        let ns_to_output = self.compute_ns_declarations(&open);

        self.output.push('<');
        self.output.push_str(&open.qname);
        self.write_ns_declarations(&ns_to_output);
        self.write_sorted_attributes(&open);
        self.output.push('>');

        for child in doc.children(id) {
            self.process_node(child);
        }

        self.output.push_str("</");
        self.output.push_str(&open.qname);
        self.output.push('>');

        self.rendered_ns_stack.pop();
        self.scope.truncate(mark);
    }

    /// Computes which namespace declarations need to be output for an element,
    /// pushes a new rendered namespace scope, and returns the sorted list of
    /// (prefix, URI) pairs to emit.
    fn compute_ns_declarations(&mut self, open: &OpenElement) -> Vec<(String, String)> {
        let in_scope = self.scope.in_scope();
        let candidates: Vec<(String, String)> = if self.options.exclusive {
            visibly_utilized(open, &self.options.inclusive_prefixes)
                .into_iter()
                .filter_map(|prefix| match in_scope.get(&prefix) {
                    Some(uri) => Some((prefix, uri.clone())),
                    None if prefix.is_empty() => Some((prefix, String::new())),
                    None => None,
                })
                .collect()
        } else {
            in_scope.into_iter().collect()
        };

        let mut current_rendered = self.rendered_ns_stack.last().cloned().unwrap_or_default();
        let mut ns_to_output: Vec<(String, String)> = Vec::new();
        for (prefix, uri) in candidates {
            if prefix == "xml" {
                continue;
            }
            // An unrendered default namespace is the empty one.
            let rendered = current_rendered.get(&prefix).map_or("", String::as_str);
            if rendered != uri {
                ns_to_output.push((prefix.clone(), uri.clone()));
                current_rendered.insert(prefix, uri);
            }
        }

        ns_to_output.sort_by(|a, b| a.0.cmp(&b.0));
        self.rendered_ns_stack.push(current_rendered);
        ns_to_output
    }

    /// Writes sorted namespace declarations to the output.
    fn write_ns_declarations(&mut self, ns_to_output: &[(String, String)]) {
        for (ns_prefix, ns_uri) in ns_to_output {
            if ns_prefix.is_empty() {
                self.output.push_str(" xmlns=\"");
            } else {
                self.output.push_str(" xmlns:");
                self.output.push_str(ns_prefix);
                self.output.push_str("=\"");
            }
            write_c14n_attr_value(&mut self.output, ns_uri);
            self.output.push('"');
        }
    }

    /// Writes attributes sorted by namespace URI, then local name.
    fn write_sorted_attributes(&mut self, open: &OpenElement) {
        let doc = self.doc;
        let mut attrs: Vec<(&str, &str, &str, &str)> = open
            .attributes
            .iter()
            .map(|(attr, qname)| {
                (
                    doc.namespace_uri(*attr).unwrap_or_default(),
                    doc.local_name(*attr).unwrap_or_default(),
                    qname.as_str(),
                    doc.node_value(*attr).unwrap_or_default(),
                )
            })
            .collect();
        attrs.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        for (_, _, qname, value) in attrs {
            self.output.push(' ');
            self.output.push_str(qname);
            self.output.push_str("=\"");
            write_c14n_attr_value(&mut self.output, value);
            self.output.push('"');
        }
    }
}

/// The prefixes an element visibly utilizes in exclusive mode: its own
/// prefix (the default namespace when unprefixed), its attributes' prefixes,
/// and the `InclusiveNamespaces PrefixList`.
fn visibly_utilized(open: &OpenElement, inclusive_prefixes: &[String]) -> Vec<String> {
    let prefix_of = |qname: &str| qname.split_once(':').map(|(p, _)| p.to_string());

    let mut utilized = vec![prefix_of(&open.qname).unwrap_or_default()];
    for (_, qname) in &open.attributes {
        if let Some(prefix) = prefix_of(qname) {
            if !utilized.contains(&prefix) {
                utilized.push(prefix);
            }
        }
    }
    for prefix in inclusive_prefixes {
        let key = if prefix == "#default" {
            String::new()
        } else {
            prefix.clone()
        };
        if !utilized.contains(&key) {
            utilized.push(key);
        }
    }
    utilized
}

/// Writes a processing instruction in C14N form.
fn write_c14n_pi(out: &mut String, target: &str, data: Option<&str>) {
    out.push_str("<?");
    out.push_str(target);
    if let Some(d) = data.filter(|d| !d.is_empty()) {
        out.push(' ');
        out.push_str(d);
    }
    out.push_str("?>");
}

/// Writes a comment in C14N form.
fn write_c14n_comment(out: &mut String, content: &str) {
    out.push_str("<!--");
    out.push_str(content);
    out.push_str("-->");
}

/// Escapes text content per C14N rules.
///
/// C14N text escaping: `&` -> `&amp;`, `<` -> `&lt;`, `>` -> `&gt;`,
/// `\r` -> `&#xD;`
fn write_c14n_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value per C14N rules.
///
/// C14N attribute value escaping: `&` -> `&amp;`, `<` -> `&lt;`,
/// `"` -> `&quot;`, `\t` -> `&#x9;`, `\n` -> `&#xA;`, `\r` -> `&#xD;`
fn write_c14n_attr_value(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}
