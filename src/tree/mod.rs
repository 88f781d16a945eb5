//! Arena-based XML document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a `Copy` handle holding the arena index
//! plus a stamp naming the document and its generation. Namespace
//! declarations live in a second table addressed by [`NsId`].
//!
//! # Architecture
//!
//! Navigation links (parent, first\_child, last\_child, next\_sibling,
//! prev\_sibling) are arena indices, never references, so there are no
//! reference cycles and no per-node heap allocation. Dropping the `Document`
//! frees everything at once.
//!
//! Handles are checked on every access. A handle issued by another document
//! is reported as [`Error::ForeignNode`]; a handle issued before
//! [`Document::free`] is reported as [`Error::StaleNode`]. Fallible
//! operations return these errors, while plain accessors such as
//! [`Document::node`] panic, which keeps misuse from silently reading the
//! wrong node.

mod build;
mod namespace;
mod node;
mod walk;

pub use namespace::Namespace;
pub use node::{
    AsNode, Attribute, CDataSection, Comment, DocumentNode, DocumentType, Element, Node,
    NodeKind, NodeType, ProcessingInstruction, Text,
};
pub use walk::walk;

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, trace};

use crate::error::{Error, ParseDiagnostic, ParseError, Result};
use crate::util::qname::XML_NAMESPACE;

/// Source of document identities. Every `Document` draws a fresh one.
static NEXT_DOCUMENT: AtomicU32 = AtomicU32::new(1);

/// Identifies the document and generation a handle was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Stamp {
    document: u32,
    generation: u32,
}

impl Stamp {
    fn fresh() -> Self {
        Self {
            document: NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    fn check(self, current: Stamp) -> Result<()> {
        if self.document != current.document {
            Err(Error::ForeignNode)
        } else if self.generation != current.generation {
            Err(Error::StaleNode)
        } else {
            Ok(())
        }
    }
}

/// A handle to a node in a [`Document`].
///
/// `NodeId` is `Copy` and cheap to compare. Two ids are equal exactly when
/// they designate the same node of the same document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: NonZeroU32,
    stamp: Stamp,
}

impl NodeId {
    fn new(index: usize, stamp: Stamp) -> Option<Self> {
        let index = NonZeroU32::new(u32::try_from(index).ok()?)?;
        Some(Self { index, stamp })
    }

    fn as_index(self) -> usize {
        self.index.get() as usize
    }

    /// Returns the raw arena index of this node.
    ///
    /// Indices are stable for the lifetime of the document generation and
    /// never reused, but carry no ordering meaning.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index.get()
    }
}

/// A handle to a namespace declaration in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NsId {
    index: u32,
    stamp: Stamp,
}

impl NsId {
    fn as_index(self) -> usize {
        self.index as usize
    }
}

/// Storage for a single node in the document arena.
///
/// Access individual nodes via [`Document::node`].
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. For attributes this is the owning element.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node.
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An XML document.
///
/// The `Document` owns every node and namespace declaration it ever created.
/// Navigation goes through `&Document`, mutation through `&mut Document`.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
///
/// let mut doc = Document::new();
/// let root = doc.create_element("root").unwrap();
/// doc.set_document_element(root).unwrap();
/// assert_eq!(doc.to_string_fragment(true), "<root/>");
/// ```
#[derive(Debug)]
pub struct Document {
    /// The node arena. Index 0 is an unused placeholder.
    nodes: Vec<NodeData>,
    /// Namespace declarations. Index 0 is the implicit `xml` binding.
    namespaces: Vec<Namespace>,
    /// The document node (not the document element).
    root: NodeId,
    stamp: Stamp,
    version: String,
    encoding: Option<String>,
    standalone: Option<bool>,
    url: Option<String>,
    /// Diagnostics collected during parsing (warnings and recovered errors).
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates an empty document with version `1.0` and no encoding.
    #[must_use]
    pub fn new() -> Self {
        Self::blank(Stamp::fresh(), "1.0", None)
    }

    /// Creates an empty document with the given version and encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let doc = Document::with_version("1.0", Some("UTF-8"));
    /// assert_eq!(doc.version(), "1.0");
    /// assert_eq!(doc.encoding(), Some("UTF-8"));
    /// ```
    #[must_use]
    pub fn with_version(version: &str, encoding: Option<&str>) -> Self {
        Self::blank(Stamp::fresh(), version, encoding)
    }

    fn blank(stamp: Stamp, version: &str, encoding: Option<&str>) -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        let root = NodeId {
            index: NonZeroU32::MIN,
            stamp,
        };
        debug!(
            document = stamp.document,
            generation = stamp.generation,
            version,
            "created document"
        );
        Self {
            nodes,
            namespaces: vec![Namespace::new(
                Some("xml".to_string()),
                XML_NAMESPACE.to_string(),
                None,
            )],
            root,
            stamp,
            version: version.to_string(),
            encoding: encoding.filter(|e| !e.is_empty()).map(str::to_string),
            standalone: None,
            url: None,
            diagnostics: Vec::new(),
        }
    }

    /// Parses an XML string into a `Document`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str("<root><child/></root>").unwrap();
    /// assert!(doc.document_element().is_some());
    /// ```
    pub fn parse_str(input: &str) -> std::result::Result<Self, ParseError> {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        crate::parser::parse_str(input)
    }

    /// Parses XML from raw bytes, detecting the encoding from the byte order
    /// mark or the XML declaration.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the bytes cannot be decoded or the resulting
    /// XML is not well-formed.
    pub fn parse_bytes(input: &[u8]) -> std::result::Result<Self, ParseError> {
        crate::parser::parse_bytes(input)
    }

    /// Releases every node and namespace declaration.
    ///
    /// The document is left empty (version `1.0`, no encoding) and every
    /// handle issued before the call becomes stale.
    pub fn free(&mut self) {
        let stamp = Stamp {
            document: self.stamp.document,
            generation: self.stamp.generation.wrapping_add(1),
        };
        debug!(
            document = self.stamp.document,
            nodes = self.node_count(),
            "freeing document"
        );
        *self = Self::blank(stamp, "1.0", None);
    }

    // --- Handle checks ---

    /// Checks that `id` designates a live node of this document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] or [`Error::StaleNode`].
    pub fn check(&self, id: impl AsNode) -> Result<NodeId> {
        let id = id.node_id();
        id.stamp.check(self.stamp)?;
        if id.as_index() >= self.nodes.len() {
            return Err(Error::StaleNode);
        }
        Ok(id)
    }

    /// Returns `true` if `id` designates a live node of this document.
    #[must_use]
    pub fn is_valid(&self, id: impl AsNode) -> bool {
        self.check(id).is_ok()
    }

    pub(crate) fn check_ns(&self, ns: NsId) -> Result<NsId> {
        ns.stamp.check(self.stamp)?;
        if ns.as_index() >= self.namespaces.len() {
            return Err(Error::StaleNode);
        }
        Ok(ns)
    }

    /// Returns the `NodeData` for a node, or an error for a bad handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] or [`Error::StaleNode`].
    pub fn try_node(&self, id: impl AsNode) -> Result<&NodeData> {
        let id = self.check(id)?;
        Ok(&self.nodes[id.as_index()])
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or belongs to another document.
    #[must_use]
    pub fn node(&self, id: impl AsNode) -> &NodeData {
        match self.try_node(id) {
            Ok(data) => data,
            Err(err) => panic!("invalid node handle: {err}"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the namespace declaration behind `ns`.
    ///
    /// # Panics
    ///
    /// Panics if `ns` is stale or belongs to another document.
    #[must_use]
    pub fn namespace(&self, ns: NsId) -> &Namespace {
        match self.check_ns(ns) {
            Ok(ns) => &self.namespaces[ns.as_index()],
            Err(err) => panic!("invalid namespace handle: {err}"),
        }
    }

    // --- Allocation ---

    /// Allocates a node in the arena.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] when the arena is full.
    pub(crate) fn alloc(&mut self, kind: NodeKind) -> Result<NodeId> {
        self.reserve_nodes(1)?;
        let id = NodeId::new(self.nodes.len(), self.stamp)
            .ok_or(Error::Allocation { what: "node" })?;
        trace!(index = id.index(), kind = %kind.node_type(), "allocated node");
        self.nodes.push(NodeData::new(kind));
        Ok(id)
    }

    /// Fails unless `count` more nodes fit in the arena.
    pub(crate) fn reserve_nodes(&self, count: usize) -> Result<()> {
        match self.nodes.len().checked_add(count) {
            Some(len) if len <= u32::MAX as usize => Ok(()),
            _ => Err(Error::Allocation { what: "node" }),
        }
    }

    pub(crate) fn alloc_ns(
        &mut self,
        prefix: Option<&str>,
        uri: &str,
        owner: NodeId,
    ) -> Result<NsId> {
        let index = u32::try_from(self.namespaces.len())
            .map_err(|_| Error::Allocation {
                what: "namespace declaration",
            })?;
        self.namespaces.push(Namespace::new(
            prefix.map(str::to_string),
            uri.to_string(),
            Some(owner),
        ));
        Ok(NsId {
            index,
            stamp: self.stamp,
        })
    }

    pub(crate) fn xml_ns(&self) -> NsId {
        NsId {
            index: 0,
            stamp: self.stamp,
        }
    }

    /// Returns the total number of nodes in the arena, the document node
    /// and detached nodes included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    // --- Metadata ---

    /// Returns the XML version (`"1.0"` unless set otherwise).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the XML version written in the declaration.
    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    /// Returns the declared encoding, if any.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Sets the declared encoding. An empty string clears it.
    pub fn set_encoding(&mut self, encoding: &str) {
        self.encoding = (!encoding.is_empty()).then(|| encoding.to_string());
    }

    /// Returns the standalone flag: `Some(true)` for `yes`, `Some(false)` for
    /// `no`, `None` when unspecified.
    #[must_use]
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// Sets the standalone flag.
    pub fn set_standalone(&mut self, standalone: Option<bool>) {
        self.standalone = standalone;
    }

    /// Sets the base URI of the document. Has no effect on the tree.
    pub fn set_base_uri(&mut self, uri: &str) {
        self.url = Some(uri.to_string());
    }

    /// Returns the document URI set by [`set_base_uri`](Self::set_base_uri)
    /// or by the parser.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.url.as_deref()
    }

    // --- Wrapping ---

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a typed handle to the document node.
    #[must_use]
    pub fn document_node(&self) -> DocumentNode {
        DocumentNode(self.root)
    }

    /// Returns the document element, if there is one.
    #[must_use]
    pub fn document_element(&self) -> Option<Element> {
        self.children(self.root)
            .find(|&id| matches!(self.nodes[id.as_index()].kind, NodeKind::Element { .. }))
            .map(Element)
    }

    /// Wraps `id` in the [`Node`] variant matching its kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] or [`Error::StaleNode`] for a bad handle.
    pub fn wrap(&self, id: impl AsNode) -> Result<Node> {
        let id = id.node_id();
        let data = self.try_node(id)?;
        Ok(Node::from_kind(id, &data.kind))
    }

    /// Like [`wrap`](Self::wrap), mapping an absent handle to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] or [`Error::StaleNode`] for a bad handle.
    pub fn wrap_opt(&self, id: Option<NodeId>) -> Result<Option<Node>> {
        id.map(|id| self.wrap(id)).transpose()
    }

    /// Returns a typed element handle for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongNodeType`] if `id` is not an element.
    pub fn element(&self, id: impl AsNode) -> Result<Element> {
        match self.wrap(id)? {
            Node::Element(e) => Ok(e),
            other => Err(Error::WrongNodeType {
                expected: NodeType::Element.as_str(),
                found: other.node_type().as_str(),
            }),
        }
    }

    /// Returns a typed attribute handle for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongNodeType`] if `id` is not an attribute.
    pub fn attribute(&self, id: impl AsNode) -> Result<Attribute> {
        match self.wrap(id)? {
            Node::Attribute(a) => Ok(a),
            other => Err(Error::WrongNodeType {
                expected: NodeType::Attribute.as_str(),
                found: other.node_type().as_str(),
            }),
        }
    }

    // --- Node properties ---

    /// Returns the type tag of a node.
    #[must_use]
    pub fn node_type(&self, id: impl AsNode) -> NodeType {
        self.node(id).kind.node_type()
    }

    /// Returns the stored name of a node: the local name of elements and
    /// attributes, the PI target, the DOCTYPE name. Other nodes have none.
    #[must_use]
    pub fn name(&self, id: impl AsNode) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::Attribute { name, .. }
            | NodeKind::DocumentType { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the DOM `nodeName`: the qualified name of elements and
    /// attributes, `#text`, `#comment` and friends for the other kinds.
    #[must_use]
    pub fn node_name(&self, id: impl AsNode) -> String {
        let id = id.node_id();
        match &self.node(id).kind {
            NodeKind::Element { name, ns, .. } | NodeKind::Attribute { name, ns, .. } => {
                match ns.and_then(|ns| self.namespace(ns).prefix()) {
                    Some(prefix) => format!("{prefix}:{name}"),
                    None => name.clone(),
                }
            }
            NodeKind::ProcessingInstruction { target, .. } => target.clone(),
            NodeKind::DocumentType { name, .. } => name.clone(),
            NodeKind::Text { .. } => "#text".to_string(),
            NodeKind::CData { .. } => "#cdata-section".to_string(),
            NodeKind::Comment { .. } => "#comment".to_string(),
            NodeKind::Document => "#document".to_string(),
        }
    }

    /// Returns the local name of an element or attribute.
    #[must_use]
    pub fn local_name(&self, id: impl AsNode) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the namespace declaration an element or attribute is bound to.
    #[must_use]
    pub fn node_ns(&self, id: impl AsNode) -> Option<NsId> {
        match &self.node(id).kind {
            NodeKind::Element { ns, .. } | NodeKind::Attribute { ns, .. } => *ns,
            _ => None,
        }
    }

    /// Returns the namespace prefix of an element or attribute.
    #[must_use]
    pub fn prefix(&self, id: impl AsNode) -> Option<&str> {
        self.node_ns(id).and_then(|ns| self.namespace(ns).prefix())
    }

    /// Returns the namespace URI of an element or attribute.
    #[must_use]
    pub fn namespace_uri(&self, id: impl AsNode) -> Option<&str> {
        self.node_ns(id).map(|ns| self.namespace(ns).uri())
    }

    /// Returns the DOM `nodeValue`: character data, attribute value or PI data.
    #[must_use]
    pub fn node_value(&self, id: impl AsNode) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::Comment { content }
            | NodeKind::CData { content } => Some(content),
            NodeKind::Attribute { value, .. } => Some(value),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            _ => None,
        }
    }

    /// Returns the concatenated text of a node and all its descendants.
    ///
    /// Comments and processing instructions below the node do not
    /// contribute; for attributes this is the value.
    #[must_use]
    pub fn text_content(&self, id: impl AsNode) -> String {
        let mut result = String::new();
        self.collect_text(id.node_id(), &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => buf.push_str(content),
            NodeKind::Attribute { value, .. } => buf.push_str(value),
            NodeKind::Comment { content } => buf.push_str(content),
            NodeKind::ProcessingInstruction { data, .. } => {
                buf.push_str(data.as_deref().unwrap_or_default());
            }
            NodeKind::Element { .. } | NodeKind::Document => {
                for child in self.children(id) {
                    match self.nodes[child.as_index()].kind {
                        NodeKind::Comment { .. } | NodeKind::ProcessingInstruction { .. } => {}
                        _ => self.collect_text(child, buf),
                    }
                }
            }
            _ => {}
        }
    }

    // --- Navigation ---

    /// Returns the parent of a node. For attributes, the owning element.
    #[must_use]
    pub fn parent(&self, id: impl AsNode) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: impl AsNode) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: impl AsNode) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: impl AsNode) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: impl AsNode) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns the wrapped parent of a node.
    #[must_use]
    pub fn parent_node(&self, id: impl AsNode) -> Option<Node> {
        self.parent(id).map(|p| Node::from_kind(p, &self.nodes[p.as_index()].kind))
    }

    /// Returns the wrapped children of a node, in order.
    #[must_use]
    pub fn child_nodes(&self, id: impl AsNode) -> Vec<Node> {
        self.children(id)
            .map(|c| Node::from_kind(c, &self.nodes[c.as_index()].kind))
            .collect()
    }

    /// Returns `true` if the node has at least one child.
    #[must_use]
    pub fn has_child_nodes(&self, id: impl AsNode) -> bool {
        self.first_child(id).is_some()
    }

    /// Returns `true` if both handles designate the same node.
    #[must_use]
    pub fn is_same_node(&self, a: impl AsNode, b: impl AsNode) -> bool {
        a.node_id() == b.node_id()
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: impl AsNode) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to root).
    pub fn ancestors(&self, id: impl AsNode) -> Ancestors<'_> {
        let id = self.node_id_checked(id);
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first).
    pub fn descendants(&self, id: impl AsNode) -> Descendants<'_> {
        let id = self.node_id_checked(id);
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    fn node_id_checked(&self, id: impl AsNode) -> NodeId {
        let id = id.node_id();
        let _ = self.node(id);
        id
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: impl AsNode, node: impl AsNode) -> bool {
        let ancestor = ancestor.node_id();
        self.ancestors(node).any(|a| a == ancestor)
    }

    // --- Raw linking ---
    //
    // These assume validated, live handles and a legal tree shape. The checked
    // public operations live in `build.rs`.

    pub(crate) fn link_append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.as_index()].parent.is_none());
        self.node_mut(child).parent = Some(parent);
        if let Some(last) = self.nodes[parent.as_index()].last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    pub(crate) fn link_before(&mut self, parent: NodeId, reference: NodeId, new_child: NodeId) {
        debug_assert!(self.nodes[new_child.as_index()].parent.is_none());
        self.node_mut(new_child).parent = Some(parent);
        if let Some(prev) = self.nodes[reference.as_index()].prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }
        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Detaches a node from its parent's child list. The node stays in the
    /// arena and keeps its own subtree.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.as_index()].parent else {
            return;
        };
        let prev = self.nodes[id.as_index()].prev_sibling;
        let next = self.nodes[id.as_index()].next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.nodes[current.as_index()].next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.nodes[current.as_index()].parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.nodes[current.as_index()].first_child {
            self.next = Some(child);
            return Some(current);
        }

        let mut node = current;
        loop {
            if node == self.root {
                self.next = None;
                break;
            }
            if let Some(sibling) = self.doc.nodes[node.as_index()].next_sibling {
                self.next = Some(sibling);
                break;
            }
            match self.doc.nodes[node.as_index()].parent {
                Some(parent) => node = parent,
                None => {
                    self.next = None;
                    break;
                }
            }
        }
        Some(current)
    }
}
