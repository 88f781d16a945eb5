//! Validated node creation and tree mutation.
//!
//! Every operation here checks names, handles and the resulting tree shape
//! before the arena is touched, so an `Err` leaves the document unchanged.

use tracing::debug;

use super::{
    AsNode, Attribute, CDataSection, Comment, Document, Element, Node, NodeId, NodeKind,
    ProcessingInstruction, Text,
};
use crate::error::{Error, Result};
use crate::util::content::{validate_char_data, validate_comment, validate_pi_data};
use crate::util::qname::{validate_name, validate_qname, XMLNS_NAMESPACE, XML_NAMESPACE};

impl Document {
    // --- Creation ---

    /// Creates an element that is not attached anywhere yet.
    ///
    /// A prefix in `name` is kept as part of the name without a binding.
    /// Written out, such an element reparses only in recovery mode; use
    /// [`create_element_ns`](Self::create_element_ns) for namespaced names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is not a `QName`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::{Document, Error};
    ///
    /// let mut doc = Document::new();
    /// assert!(doc.create_element("item").is_ok());
    /// assert!(matches!(doc.create_element("1item"), Err(Error::InvalidName { .. })));
    /// ```
    pub fn create_element(&mut self, name: &str) -> Result<Element> {
        validate_qname(name)?;
        self.alloc(NodeKind::Element {
            name: name.to_string(),
            ns: None,
            attributes: Vec::new(),
            ns_defs: Vec::new(),
        })
        .map(Element)
    }

    /// Creates an element bound to the namespace `uri`.
    ///
    /// The namespace is looked up from the document element when there is
    /// one, and declared there if missing, so later creations reuse the same
    /// declaration. Without a document element the declaration goes on the
    /// new element itself. A prefix in `name` is used for a new declaration;
    /// otherwise one is invented. An empty `uri` creates a plain element.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `name` is not a `QName`.
    /// - [`Error::NamespaceCreation`] if the declaration cannot be attached.
    pub fn create_element_ns(&mut self, uri: &str, name: &str) -> Result<Element> {
        if uri.is_empty() {
            return self.create_element(name);
        }
        let (prefix, local) = validate_qname(name)?;
        check_binding(prefix, uri)?;
        self.reserve_nodes(1)?;

        let element = match self.document_element() {
            Some(root) => {
                let ns = self.resolve_or_create_namespace(root, uri, prefix)?;
                self.alloc(NodeKind::Element {
                    name: local.to_string(),
                    ns: Some(ns),
                    attributes: Vec::new(),
                    ns_defs: Vec::new(),
                })?
            }
            None => {
                let element = self.alloc(NodeKind::Element {
                    name: local.to_string(),
                    ns: None,
                    attributes: Vec::new(),
                    ns_defs: Vec::new(),
                })?;
                let ns = self.resolve_or_create_namespace(element, uri, prefix)?;
                self.set_ns(element, Some(ns))?;
                element
            }
        };
        Ok(Element(element))
    }

    /// Creates an attribute that is not attached to any element yet.
    ///
    /// An `xml:` name is bound to the XML namespace. Other prefixes stay
    /// unbound, as with [`create_element`](Self::create_element).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `name` is not a `QName`.
    /// - [`Error::InvalidContent`] if `value` holds non-XML characters.
    pub fn create_attribute(&mut self, name: &str, value: &str) -> Result<Attribute> {
        let kind = self.plain_attribute(name, value)?;
        self.alloc(kind).map(Attribute)
    }

    fn plain_attribute(&self, name: &str, value: &str) -> Result<NodeKind> {
        let (prefix, local) = validate_qname(name)?;
        validate_char_data("attribute", value)?;
        let (name, ns) = match prefix {
            Some("xml") => (local, Some(self.xml_ns())),
            _ => (name, None),
        };
        Ok(NodeKind::Attribute {
            name: name.to_string(),
            value: value.to_string(),
            ns,
        })
    }

    /// Creates an attribute bound to the namespace `uri`.
    ///
    /// The declaration is looked up, or created, on the document element.
    /// The attribute itself stays unattached. An empty `uri` creates a plain
    /// attribute.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `name` is not a `QName`.
    /// - [`Error::MissingRoot`] if the document has no document element.
    /// - [`Error::NamespaceCreation`] if the declaration cannot be attached.
    pub fn create_attribute_ns(&mut self, uri: &str, name: &str, value: &str) -> Result<Attribute> {
        if uri.is_empty() {
            return self.create_attribute(name, value);
        }
        let (prefix, local) = validate_qname(name)?;
        validate_char_data("attribute", value)?;
        let root = self.document_element().ok_or(Error::MissingRoot)?;
        check_binding(prefix, uri)?;
        self.reserve_nodes(1)?;

        let ns = self.resolve_or_create_attribute_namespace(root, uri, prefix)?;
        let attr = self.alloc(NodeKind::Attribute {
            name: local.to_string(),
            value: value.to_string(),
            ns: Some(ns),
        })?;
        Ok(Attribute(attr))
    }

    /// Creates a text node. The content is stored verbatim.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidContent`] if `text` holds non-XML characters.
    /// - [`Error::Allocation`] if the arena is full.
    pub fn create_text_node(&mut self, text: &str) -> Result<Text> {
        validate_char_data("text", text)?;
        self.alloc(NodeKind::Text {
            content: text.to_string(),
        })
        .map(Text)
    }

    /// Creates a comment node.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidContent`] if `text` contains `--`, ends in `-` or
    ///   holds non-XML characters.
    /// - [`Error::Allocation`] if the arena is full.
    pub fn create_comment_node(&mut self, text: &str) -> Result<Comment> {
        validate_comment(text)?;
        self.alloc(NodeKind::Comment {
            content: text.to_string(),
        })
        .map(Comment)
    }

    /// Creates a CDATA section. A `]]>` in `text` is split across sections
    /// on output.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidContent`] if `text` holds non-XML characters.
    /// - [`Error::Allocation`] if the arena is full.
    pub fn create_cdata_section(&mut self, text: &str) -> Result<CDataSection> {
        validate_char_data("CDATA", text)?;
        self.alloc(NodeKind::CData {
            content: text.to_string(),
        })
        .map(CDataSection)
    }

    /// Creates a processing instruction.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `target` is not a name or is a case
    ///   variant of `xml`.
    /// - [`Error::InvalidContent`] if `data` contains `?>` or non-XML
    ///   characters.
    pub fn create_processing_instruction(
        &mut self,
        target: &str,
        data: Option<&str>,
    ) -> Result<ProcessingInstruction> {
        validate_name(target)?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(Error::invalid_name(target, "the xml target is reserved"));
        }
        if let Some(data) = data {
            validate_pi_data(data)?;
        }
        self.alloc(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.map(str::to_string),
        })
        .map(ProcessingInstruction)
    }

    // --- Document element ---

    /// Makes `element` the document element.
    ///
    /// The element is detached from wherever it was. A previous document
    /// element is replaced in place and returned; it stays a valid, detached
    /// subtree of this document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongNodeType`] if `element` is not an element, and
    /// the handle errors for foreign or stale handles.
    pub fn set_document_element(&mut self, element: impl AsNode) -> Result<Option<Element>> {
        let element = self.element(element)?.id();
        let previous = self.document_element().map(Element::id);
        if previous == Some(element) {
            return Ok(None);
        }

        self.unlink(element);
        let root = self.root;
        match previous {
            Some(old) => {
                self.link_before(root, old, element);
                self.unlink(old);
            }
            None => self.link_append(root, element),
        }
        debug!(
            element = element.index(),
            replaced = previous.map(NodeId::index),
            "set document element"
        );
        Ok(previous.map(Element))
    }

    // --- Linking ---

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let child_kind = &self.node(child).kind;
        match &self.node(parent).kind {
            NodeKind::Element { .. } => {}
            NodeKind::Document => match child_kind {
                NodeKind::Element { .. } => {
                    if self
                        .document_element()
                        .is_some_and(|existing| existing.id() != child)
                    {
                        return Err(Error::hierarchy("document already has a document element"));
                    }
                }
                NodeKind::Text { .. } | NodeKind::CData { .. } => {
                    return Err(Error::hierarchy("character data cannot be a child of the document"));
                }
                NodeKind::DocumentType { .. } => {
                    if self
                        .children(parent)
                        .any(|c| c != child && matches!(self.node(c).kind, NodeKind::DocumentType { .. }))
                    {
                        return Err(Error::hierarchy("document already has a document type"));
                    }
                }
                _ => {}
            },
            _ => return Err(Error::hierarchy("parent cannot have children")),
        }
        match child_kind {
            NodeKind::Attribute { .. } => {
                return Err(Error::hierarchy("attributes are not children"));
            }
            NodeKind::Document => {
                return Err(Error::hierarchy("the document node cannot be a child"));
            }
            NodeKind::DocumentType { .. } if !matches!(self.node(parent).kind, NodeKind::Document) => {
                return Err(Error::hierarchy("a document type must be a child of the document"));
            }
            _ => {}
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::hierarchy("node would become its own ancestor"));
        }
        Ok(())
    }

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already attached somewhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HierarchyRequest`] if the tree shape would become
    /// illegal: attributes or the document as children, cycles, a second
    /// document element.
    pub fn append_child(&mut self, parent: impl AsNode, child: impl AsNode) -> Result<()> {
        let parent = self.check(parent)?;
        let child = self.check(child)?;
        self.check_insertion(parent, child)?;
        self.unlink(child);
        self.link_append(parent, child);
        Ok(())
    }

    /// Inserts `new_child` immediately before `reference`, moving it if it is
    /// already attached somewhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HierarchyRequest`] if `reference` has no parent or the
    /// tree shape would become illegal.
    pub fn insert_before(&mut self, reference: impl AsNode, new_child: impl AsNode) -> Result<()> {
        let reference = self.check(reference)?;
        let new_child = self.check(new_child)?;
        if matches!(self.node(reference).kind, NodeKind::Attribute { .. }) {
            return Err(Error::hierarchy("attributes have no siblings"));
        }
        let parent = self
            .parent(reference)
            .ok_or_else(|| Error::hierarchy("reference node has no parent"))?;
        if reference == new_child {
            return Ok(());
        }
        self.check_insertion(parent, new_child)?;
        self.unlink(new_child);
        self.link_before(parent, reference, new_child);
        Ok(())
    }

    /// Detaches a node from its parent. Attributes are removed from their
    /// element. The node and its subtree remain valid.
    ///
    /// # Errors
    ///
    /// Returns the handle errors for foreign or stale handles.
    pub fn remove_node(&mut self, node: impl AsNode) -> Result<()> {
        let node = self.check(node)?;
        if matches!(self.node(node).kind, NodeKind::Attribute { .. }) {
            self.detach_attribute(node);
        } else {
            self.unlink(node);
        }
        Ok(())
    }

    /// Appends a new text node with `text` to `parent`.
    ///
    /// # Errors
    ///
    /// See [`append_child`](Self::append_child).
    pub fn append_text(&mut self, parent: impl AsNode, text: &str) -> Result<Text> {
        let parent = self.check(parent)?;
        if !matches!(self.node(parent).kind, NodeKind::Element { .. }) {
            return Err(Error::hierarchy("text can only be appended to elements"));
        }
        let node = self.create_text_node(text)?;
        self.link_append(parent, node.id());
        Ok(node)
    }

    /// Replaces the value of a text, CDATA, comment, attribute or PI node.
    ///
    /// # Errors
    ///
    /// - [`Error::WrongNodeType`] for nodes without a value.
    /// - [`Error::InvalidContent`] if `value` breaks the content rules of
    ///   the node's kind.
    pub fn set_node_value(&mut self, node: impl AsNode, value: &str) -> Result<()> {
        let node = self.check(node)?;
        match &self.node(node).kind {
            NodeKind::Text { .. } => validate_char_data("text", value)?,
            NodeKind::CData { .. } => validate_char_data("CDATA", value)?,
            NodeKind::Attribute { .. } => validate_char_data("attribute", value)?,
            NodeKind::Comment { .. } => validate_comment(value)?,
            NodeKind::ProcessingInstruction { .. } => validate_pi_data(value)?,
            _ => {}
        }
        match &mut self.node_mut(node).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content }
            | NodeKind::Attribute { value: content, .. } => {
                *content = value.to_string();
                Ok(())
            }
            NodeKind::ProcessingInstruction { data, .. } => {
                *data = (!value.is_empty()).then(|| value.to_string());
                Ok(())
            }
            other => Err(Error::WrongNodeType {
                expected: "character data, attribute or processing instruction",
                found: other.node_type().as_str(),
            }),
        }
    }

    // --- Attributes ---

    /// Returns the attributes of an element, in order. Empty for other nodes.
    pub fn attributes(&self, element: impl AsNode) -> impl Iterator<Item = Attribute> + '_ {
        let ids: &[NodeId] = match &self.node(element).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        };
        ids.iter().copied().map(Attribute)
    }

    /// Returns the attribute whose qualified name is `name`.
    #[must_use]
    pub fn get_attribute_node(&self, element: impl AsNode, name: &str) -> Option<Attribute> {
        self.attributes(element)
            .find(|&attr| self.qualified_name_is(attr.id(), name))
    }

    /// Returns the value of the attribute whose qualified name is `name`.
    #[must_use]
    pub fn get_attribute(&self, element: impl AsNode, name: &str) -> Option<&str> {
        self.get_attribute_node(element, name)
            .and_then(|attr| self.node_value(attr))
    }

    /// Returns the attribute with the given namespace URI and local name.
    /// An empty `uri` matches attributes without a namespace.
    #[must_use]
    pub fn get_attribute_node_ns(
        &self,
        element: impl AsNode,
        uri: &str,
        local_name: &str,
    ) -> Option<Attribute> {
        self.attributes(element)
            .find(|&attr| self.expanded_name_is(attr.id(), uri, local_name))
    }

    /// Returns the value of the attribute with the given namespace URI and
    /// local name.
    #[must_use]
    pub fn get_attribute_ns(&self, element: impl AsNode, uri: &str, local_name: &str) -> Option<&str> {
        self.get_attribute_node_ns(element, uri, local_name)
            .and_then(|attr| self.node_value(attr))
    }

    /// Returns `true` if the element has an attribute with qualified name
    /// `name`.
    #[must_use]
    pub fn has_attribute(&self, element: impl AsNode, name: &str) -> bool {
        self.get_attribute_node(element, name).is_some()
    }

    /// Sets an attribute by qualified name, replacing the value of an
    /// existing one or appending a new attribute.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] for a bad name.
    /// - [`Error::InvalidContent`] if `value` holds non-XML characters.
    /// - [`Error::WrongNodeType`] if `element` is not an element.
    pub fn set_attribute(&mut self, element: impl AsNode, name: &str, value: &str) -> Result<Attribute> {
        let element = self.element(element)?;
        let kind = self.plain_attribute(name, value)?;
        if let Some(existing) = self.get_attribute_node(element, name) {
            self.set_node_value(existing, value)?;
            return Ok(existing);
        }
        let attr = self.alloc(kind)?;
        self.attach_attribute(element.id(), attr);
        Ok(Attribute(attr))
    }

    /// Sets a namespaced attribute, declaring the namespace on the element
    /// when nothing suitable is in scope.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `name` is not a `QName`.
    /// - [`Error::NamespaceCreation`] if the declaration cannot be attached.
    pub fn set_attribute_ns(
        &mut self,
        element: impl AsNode,
        uri: &str,
        name: &str,
        value: &str,
    ) -> Result<Attribute> {
        if uri.is_empty() {
            return self.set_attribute(element, name, value);
        }
        let element = self.element(element)?;
        let (prefix, local) = validate_qname(name)?;
        validate_char_data("attribute", value)?;
        check_binding(prefix, uri)?;
        if let Some(existing) = self.get_attribute_node_ns(element, uri, local) {
            self.set_node_value(existing, value)?;
            return Ok(existing);
        }
        self.reserve_nodes(1)?;
        let ns = self.resolve_or_create_attribute_namespace(element, uri, prefix)?;
        let attr = self.alloc(NodeKind::Attribute {
            name: local.to_string(),
            value: value.to_string(),
            ns: Some(ns),
        })?;
        self.attach_attribute(element.id(), attr);
        Ok(Attribute(attr))
    }

    /// Attaches an attribute node to an element, replacing an attribute with
    /// the same expanded name. Returns the replaced attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HierarchyRequest`] if the attribute belongs to
    /// another element.
    pub fn set_attribute_node(&mut self, element: impl AsNode, attr: Attribute) -> Result<Option<Attribute>> {
        let element = self.element(element)?.id();
        let attr = self.attribute(attr)?.id();
        match self.parent(attr) {
            Some(owner) if owner == element => return Ok(None),
            Some(_) => return Err(Error::hierarchy("attribute is owned by another element")),
            None => {}
        }
        let uri = self.namespace_uri(attr).unwrap_or_default().to_string();
        let local = self.local_name(attr).unwrap_or_default().to_string();
        let replaced = self.get_attribute_node_ns(element, &uri, &local);
        match replaced {
            Some(old) => {
                let old = old.id();
                if let NodeKind::Element { attributes, .. } = &mut self.node_mut(element).kind {
                    if let Some(slot) = attributes.iter_mut().find(|a| **a == old) {
                        *slot = attr;
                    }
                }
                self.node_mut(old).parent = None;
                self.node_mut(attr).parent = Some(element);
            }
            None => self.attach_attribute(element, attr),
        }
        Ok(replaced)
    }

    /// Removes the attribute whose qualified name is `name`. Returns the
    /// detached attribute, if there was one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongNodeType`] if `element` is not an element.
    pub fn remove_attribute(&mut self, element: impl AsNode, name: &str) -> Result<Option<Attribute>> {
        let element = self.element(element)?;
        let found = self.get_attribute_node(element, name);
        if let Some(attr) = found {
            self.detach_attribute(attr.id());
        }
        Ok(found)
    }

    pub(crate) fn attach_attribute(&mut self, element: NodeId, attr: NodeId) {
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(element).kind {
            attributes.push(attr);
        }
        self.node_mut(attr).parent = Some(element);
    }

    fn detach_attribute(&mut self, attr: NodeId) {
        let Some(owner) = self.node(attr).parent else {
            return;
        };
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(owner).kind {
            attributes.retain(|&a| a != attr);
        }
        self.node_mut(attr).parent = None;
    }

    fn qualified_name_is(&self, node: NodeId, name: &str) -> bool {
        let Some(local) = self.local_name(node) else {
            return false;
        };
        match self.prefix(node) {
            Some(prefix) => name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(':'))
                == Some(local),
            None => local == name,
        }
    }

    fn expanded_name_is(&self, node: NodeId, uri: &str, local_name: &str) -> bool {
        self.local_name(node) == Some(local_name)
            && self.namespace_uri(node).unwrap_or_default() == uri
    }

    /// Returns the attributes wrapped as [`Node`]s.
    #[must_use]
    pub fn attribute_nodes(&self, element: impl AsNode) -> Vec<Node> {
        self.attributes(element).map(Node::Attribute).collect()
    }
}

/// Rejects prefix/URI pairs that can never be declared.
fn check_binding(prefix: Option<&str>, uri: &str) -> Result<()> {
    match prefix {
        Some("xmlns") => Err(Error::namespace(prefix, uri, "the xmlns prefix is reserved")),
        Some("xml") if uri != XML_NAMESPACE => Err(Error::namespace(
            prefix,
            uri,
            "the xml prefix cannot be rebound",
        )),
        Some(p) if p != "xml" && uri == XML_NAMESPACE => Err(Error::namespace(
            prefix,
            uri,
            "reserved namespace URI",
        )),
        _ if uri == XMLNS_NAMESPACE => Err(Error::namespace(prefix, uri, "reserved namespace URI")),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::NodeType;
    use pretty_assertions::assert_eq;

    fn doc_with_root() -> (Document, Element) {
        let mut doc = Document::with_version("1.0", Some("utf-8"));
        let root = doc.create_element("root").unwrap();
        doc.set_document_element(root).unwrap();
        (doc, root)
    }

    #[test]
    fn test_create_element_is_unattached() {
        let mut doc = Document::new();
        let e = doc.create_element("item").unwrap();
        assert_eq!(doc.parent(e), None);
        assert_eq!(doc.node_type(e), NodeType::Element);
        assert_eq!(doc.node_name(e), "item");
        assert!(doc.document_element().is_none());
    }

    #[test]
    fn test_create_element_invalid_names_leave_tree_unchanged() {
        let (mut doc, root) = doc_with_root();
        let count = doc.node_count();
        for bad in ["", "1abc", "has space", "a\tb"] {
            assert!(matches!(doc.create_element(bad), Err(Error::InvalidName { .. })));
            assert!(matches!(doc.create_attribute(bad, "v"), Err(Error::InvalidName { .. })));
        }
        assert_eq!(doc.node_count(), count);
        assert_eq!(doc.child_nodes(doc.root()), vec![Node::Element(root)]);
    }

    #[test]
    fn test_create_element_keeps_unbound_colon_name() {
        let mut doc = Document::new();
        let e = doc.create_element("a:b").unwrap();
        assert_eq!(doc.node_name(e), "a:b");
        assert_eq!(doc.namespace_uri(e), None);
    }

    #[test]
    fn test_plain_creators_apply_qname_rule() {
        let (mut doc, root) = doc_with_root();
        let count = doc.node_count();
        for bad in ["a:b:c", ":a", "a:", "xmlns:"] {
            assert!(matches!(doc.create_element(bad), Err(Error::InvalidName { .. })));
            assert!(matches!(doc.create_attribute(bad, "v"), Err(Error::InvalidName { .. })));
            assert!(matches!(doc.set_attribute(root, bad, "v"), Err(Error::InvalidName { .. })));
        }
        assert_eq!(doc.node_count(), count);
    }

    #[test]
    fn test_xml_prefixed_attribute_is_bound() {
        let (mut doc, root) = doc_with_root();
        let lang = doc.set_attribute(root, "xml:lang", "en").unwrap();
        assert_eq!(doc.namespace_uri(lang), Some(XML_NAMESPACE));
        assert_eq!(doc.local_name(lang), Some("lang"));
        assert_eq!(doc.get_attribute(root, "xml:lang"), Some("en"));
        assert_eq!(doc.get_attribute_ns(root, XML_NAMESPACE, "lang"), Some("en"));

        let again = doc.set_attribute(root, "xml:lang", "de").unwrap();
        assert_eq!(again, lang);
        assert_eq!(doc.attributes(root).count(), 1);
        assert_eq!(doc.node_value(lang), Some("de"));
    }

    #[test]
    fn test_content_checked_before_allocation() {
        let (mut doc, root) = doc_with_root();
        let count = doc.node_count();
        assert!(matches!(
            doc.create_comment_node("x--"),
            Err(Error::InvalidContent { what: "comment", .. })
        ));
        assert!(matches!(
            doc.create_processing_instruction("pi", Some("?>")),
            Err(Error::InvalidContent { .. })
        ));
        assert!(matches!(
            doc.create_attribute_ns("urn:x", "x:a", "\u{0}"),
            Err(Error::InvalidContent { what: "attribute", .. })
        ));
        assert!(matches!(doc.append_text(root, "\u{8}"), Err(Error::InvalidContent { .. })));
        assert_eq!(doc.node_count(), count);
        assert!(doc.namespace_declarations(root).is_empty());
    }

    #[test]
    fn test_create_element_ns_declares_on_document_element() {
        let (mut doc, root) = doc_with_root();
        let child = doc.create_element_ns("http://example.com/ns", "child").unwrap();
        assert_eq!(doc.namespace_uri(child), Some("http://example.com/ns"));
        assert_eq!(doc.prefix(child), Some("ns0"));
        assert_eq!(doc.namespace_declarations(root).len(), 1);
        assert_eq!(doc.parent(child), None);
    }

    #[test]
    fn test_create_element_ns_reuses_declaration() {
        let (mut doc, root) = doc_with_root();
        let a = doc.create_element_ns("urn:x", "a").unwrap();
        let b = doc.create_element_ns("urn:x", "b").unwrap();
        let c = doc.create_element_ns("urn:x", "p:c").unwrap();
        assert_eq!(doc.node_ns(a), doc.node_ns(b));
        assert_eq!(doc.node_ns(b), doc.node_ns(c));
        assert_eq!(doc.namespace_declarations(root).len(), 1);
    }

    #[test]
    fn test_create_element_ns_without_root_declares_on_itself() {
        let mut doc = Document::new();
        let e = doc.create_element_ns("urn:x", "x:item").unwrap();
        let ns = doc.node_ns(e).unwrap();
        assert_eq!(doc.namespace(ns).owner(), Some(e.id()));
        assert_eq!(doc.node_name(e), "x:item");
    }

    #[test]
    fn test_create_element_ns_empty_uri_is_plain() {
        let mut doc = Document::new();
        let e = doc.create_element_ns("", "plain").unwrap();
        assert_eq!(doc.node_ns(e), None);
    }

    #[test]
    fn test_create_element_ns_prefix_conflict_fails_cleanly() {
        let (mut doc, root) = doc_with_root();
        doc.new_ns(root, "urn:one", Some("p")).unwrap();
        let count = doc.node_count();
        let err = doc.create_element_ns("urn:two", "p:x").unwrap_err();
        assert!(matches!(err, Error::NamespaceCreation { .. }));
        assert_eq!(doc.node_count(), count);
        assert_eq!(doc.namespace_declarations(root).len(), 1);
    }

    #[test]
    fn test_create_attribute_ns_requires_root() {
        let mut doc = Document::new();
        assert_eq!(
            doc.create_attribute_ns("urn:x", "x:a", "1"),
            Err(Error::MissingRoot)
        );
        let attr = doc.create_attribute_ns("", "plain", "1").unwrap();
        assert_eq!(doc.node_value(attr), Some("1"));
    }

    #[test]
    fn test_create_attribute_ns_binds_prefix() {
        let (mut doc, root) = doc_with_root();
        let attr = doc.create_attribute_ns("urn:x", "x:a", "1").unwrap();
        assert_eq!(doc.node_name(attr), "x:a");
        assert_eq!(doc.parent(attr), None);
        assert_eq!(doc.lookup_namespace_uri(root, Some("x")), Some("urn:x"));

        let again = doc.wrap(attr.id()).unwrap();
        assert_eq!(again, Node::Attribute(attr));
    }

    #[test]
    fn test_create_pi_rejects_xml_target() {
        let mut doc = Document::new();
        assert!(doc.create_processing_instruction("xml", None).is_err());
        let pi = doc.create_processing_instruction("style", Some("a=b")).unwrap();
        assert_eq!(doc.node_value(pi), Some("a=b"));
    }

    #[test]
    fn test_set_document_element_replaces_in_place() {
        let mut doc = Document::new();
        let comment = doc.create_comment_node("lead").unwrap();
        doc.append_child(doc.root(), comment).unwrap();
        let first = doc.create_element("first").unwrap();
        doc.set_document_element(first).unwrap();
        let trailing = doc.create_comment_node("tail").unwrap();
        doc.append_child(doc.root(), trailing).unwrap();

        let second = doc.create_element("second").unwrap();
        let replaced = doc.set_document_element(second).unwrap();
        assert_eq!(replaced, Some(first));
        assert_eq!(doc.document_element(), Some(second));
        assert_eq!(
            doc.child_nodes(doc.root()),
            vec![
                Node::Comment(comment),
                Node::Element(second),
                Node::Comment(trailing)
            ]
        );
        assert!(doc.is_valid(first));
        assert_eq!(doc.parent(first), None);
    }

    #[test]
    fn test_set_document_element_rejects_non_element() {
        let mut doc = Document::new();
        let t = doc.create_text_node("x").unwrap();
        assert!(matches!(
            doc.set_document_element(t),
            Err(Error::WrongNodeType { .. })
        ));
    }

    #[test]
    fn test_append_child_moves_node() {
        let (mut doc, root) = doc_with_root();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let t = doc.create_text_node("t").unwrap();
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        doc.append_child(a, t).unwrap();
        doc.append_child(b, t).unwrap();
        assert_eq!(doc.first_child(a), None);
        assert_eq!(doc.first_child(b), Some(t.id()));
    }

    #[test]
    fn test_append_child_rejects_illegal_shapes() {
        let (mut doc, root) = doc_with_root();
        let child = doc.create_element("child").unwrap();
        doc.append_child(root, child).unwrap();

        assert!(matches!(
            doc.append_child(child, root),
            Err(Error::HierarchyRequest { .. })
        ));
        let attr = doc.create_attribute("a", "1").unwrap();
        assert!(matches!(
            doc.append_child(root, attr),
            Err(Error::HierarchyRequest { .. })
        ));
        let other = doc.create_element("other").unwrap();
        assert!(matches!(
            doc.append_child(doc.root(), other),
            Err(Error::HierarchyRequest { .. })
        ));
        let text = doc.create_text_node("x").unwrap();
        assert!(matches!(
            doc.append_child(text, other),
            Err(Error::HierarchyRequest { .. })
        ));
        assert_eq!(doc.children(root).count(), 1);
    }

    #[test]
    fn test_insert_before() {
        let (mut doc, root) = doc_with_root();
        let a = doc.create_element("a").unwrap();
        let c = doc.create_element("c").unwrap();
        doc.append_child(root, a).unwrap();
        doc.append_child(root, c).unwrap();
        let b = doc.create_element("b").unwrap();
        doc.insert_before(c, b).unwrap();
        let names: Vec<String> = doc.children(root).map(|n| doc.node_name(n)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let orphan = doc.create_element("o").unwrap();
        assert!(doc.insert_before(orphan, b).is_err());
    }

    #[test]
    fn test_remove_node() {
        let (mut doc, root) = doc_with_root();
        let a = doc.create_element("a").unwrap();
        doc.append_child(root, a).unwrap();
        doc.remove_node(a).unwrap();
        assert_eq!(doc.first_child(root), None);
        assert!(doc.is_valid(a));
    }

    #[test]
    fn test_set_and_get_attribute() {
        let (mut doc, root) = doc_with_root();
        doc.set_attribute(root, "id", "1").unwrap();
        doc.set_attribute(root, "class", "x").unwrap();
        doc.set_attribute(root, "id", "2").unwrap();
        assert_eq!(doc.get_attribute(root, "id"), Some("2"));
        assert_eq!(doc.attributes(root).count(), 2);
        assert!(doc.has_attribute(root, "class"));
        assert!(doc.remove_attribute(root, "class").unwrap().is_some());
        assert!(!doc.has_attribute(root, "class"));
        assert!(doc.set_attribute(root, "bad name", "x").is_err());
    }

    #[test]
    fn test_set_attribute_ns() {
        let (mut doc, root) = doc_with_root();
        let attr = doc.set_attribute_ns(root, "urn:x", "x:lang", "en").unwrap();
        assert_eq!(doc.get_attribute(root, "x:lang"), Some("en"));
        assert_eq!(doc.get_attribute_ns(root, "urn:x", "lang"), Some("en"));
        let same = doc.set_attribute_ns(root, "urn:x", "y:lang", "fr").unwrap();
        assert_eq!(attr, same);
        assert_eq!(doc.get_attribute_ns(root, "urn:x", "lang"), Some("fr"));
    }

    #[test]
    fn test_set_attribute_node_replaces_same_expanded_name() {
        let (mut doc, root) = doc_with_root();
        doc.set_attribute(root, "k", "old").unwrap();
        let fresh = doc.create_attribute("k", "new").unwrap();
        let replaced = doc.set_attribute_node(root, fresh).unwrap().unwrap();
        assert_eq!(doc.node_value(replaced), Some("old"));
        assert_eq!(doc.parent(replaced), None);
        assert_eq!(doc.get_attribute(root, "k"), Some("new"));
        assert_eq!(doc.parent(fresh), Some(root.id()));

        let other = doc.create_element("other").unwrap();
        assert!(doc.set_attribute_node(other, fresh).is_err());
    }

    #[test]
    fn test_set_node_value() {
        let mut doc = Document::new();
        let t = doc.create_text_node("a").unwrap();
        doc.set_node_value(t, "b").unwrap();
        assert_eq!(doc.node_value(t), Some("b"));
        let e = doc.create_element("e").unwrap();
        assert!(doc.set_node_value(e, "x").is_err());
    }
}
