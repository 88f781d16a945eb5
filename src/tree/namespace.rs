//! Namespace declarations and scoped resolution.
//!
//! A declaration binds a prefix (or the default namespace) to a URI on one
//! element and is visible on that element and its descendants until a closer
//! declaration of the same prefix shadows it. Elements and attributes refer to
//! a declaration through an [`NsId`]; binding is always explicit, see
//! [`Document::set_ns`].
//!
//! Resolution prefers reuse: [`Document::resolve_or_create_namespace`] walks
//! the ancestor chain for a visible declaration of the URI and only declares
//! a new one when nothing usable is in scope. Invented prefixes follow the
//! `ns0`, `ns1`, ... pattern and never collide with a prefix already in scope.

use tracing::debug;

use super::{AsNode, Document, Element, NodeId, NodeKind, NsId};
use crate::error::{Error, Result};
use crate::util::qname::{validate_ncname, XMLNS_NAMESPACE, XML_NAMESPACE};

/// Upper bound on generated prefixes tried before giving up.
const MAX_GENERATED_PREFIXES: u32 = 1000;

/// A namespace declaration: prefix, URI and the element declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: Option<String>,
    uri: String,
    owner: Option<NodeId>,
}

impl Namespace {
    pub(crate) fn new(prefix: Option<String>, uri: String, owner: Option<NodeId>) -> Self {
        Self { prefix, uri, owner }
    }

    /// The declared prefix, `None` for the default namespace.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The namespace URI. Empty for an `xmlns=""` undeclaration.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The element carrying the declaration. `None` for the built-in `xml`
    /// binding.
    #[must_use]
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }
}

impl Document {
    /// Returns the element from which in-scope lookups for `node` start:
    /// the node itself for elements, the owner for attributes, the parent
    /// element otherwise.
    fn scope_start(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .find(|&n| matches!(self.node(n).kind, NodeKind::Element { .. }))
    }

    /// Returns the namespace declarations made on an element.
    #[must_use]
    pub fn namespace_declarations(&self, element: impl AsNode) -> &[NsId] {
        match &self.node(element).kind {
            NodeKind::Element { ns_defs, .. } => ns_defs,
            _ => &[],
        }
    }

    /// Finds the declaration of `prefix` visible at `node`, innermost first.
    ///
    /// `None` searches for the default namespace. The `xml` prefix always
    /// resolves to the built-in binding.
    #[must_use]
    pub fn search_ns(&self, node: impl AsNode, prefix: Option<&str>) -> Option<NsId> {
        if prefix == Some("xml") {
            return Some(self.xml_ns());
        }
        let start = self.scope_start(node.node_id())?;
        self.ancestors(start).find_map(|n| {
            self.namespace_declarations(n)
                .iter()
                .copied()
                .find(|&ns| self.namespace(ns).prefix() == prefix)
        })
    }

    /// Finds the nearest declaration of `uri` visible at `node`.
    ///
    /// A declaration whose prefix is redeclared closer to `node` is skipped.
    /// With `for_attribute`, default-namespace declarations are ignored since
    /// unprefixed attributes are never in a namespace.
    #[must_use]
    pub fn search_ns_by_href(
        &self,
        node: impl AsNode,
        uri: &str,
        for_attribute: bool,
    ) -> Option<NsId> {
        if uri == XML_NAMESPACE {
            return Some(self.xml_ns());
        }
        let node = node.node_id();
        let start = self.scope_start(node)?;
        self.ancestors(start).find_map(|n| {
            self.namespace_declarations(n).iter().copied().find(|&ns| {
                let decl = self.namespace(ns);
                decl.uri() == uri
                    && !(for_attribute && decl.prefix().is_none())
                    && self.search_ns(start, decl.prefix()) == Some(ns)
            })
        })
    }

    /// Declares a namespace on `element`.
    ///
    /// # Errors
    ///
    /// - [`Error::NamespaceCreation`] if the element already declares the
    ///   prefix, the prefix is `xmlns`, `xml` would be rebound, or a prefix is
    ///   bound to the empty URI.
    /// - [`Error::InvalidName`] if the prefix is not an `NCName`.
    /// - [`Error::WrongNodeType`] if `element` is not an element.
    pub fn new_ns(
        &mut self,
        element: impl AsNode,
        uri: &str,
        prefix: Option<&str>,
    ) -> Result<NsId> {
        let element = self.element(element)?.id();
        match prefix {
            Some("xmlns") => {
                return Err(Error::namespace(prefix, uri, "the xmlns prefix is reserved"));
            }
            Some("xml") if uri == XML_NAMESPACE => return Ok(self.xml_ns()),
            Some("xml") => {
                return Err(Error::namespace(
                    prefix,
                    uri,
                    "the xml prefix cannot be rebound",
                ));
            }
            Some(p) => {
                validate_ncname(p)?;
                if uri.is_empty() {
                    return Err(Error::namespace(
                        prefix,
                        uri,
                        "a prefixed namespace needs a non-empty URI",
                    ));
                }
            }
            None => {}
        }
        if uri == XML_NAMESPACE || uri == XMLNS_NAMESPACE {
            return Err(Error::namespace(prefix, uri, "reserved namespace URI"));
        }
        if self
            .namespace_declarations(element)
            .iter()
            .any(|&ns| self.namespace(ns).prefix() == prefix)
        {
            return Err(Error::namespace(
                prefix,
                uri,
                "prefix already declared on this element",
            ));
        }

        let ns = self.alloc_ns(prefix, uri, element)?;
        if let NodeKind::Element { ns_defs, .. } = &mut self.node_mut(element).kind {
            ns_defs.push(ns);
        }
        debug!(prefix = ?prefix, uri, element = element.index(), "declared namespace");
        Ok(ns)
    }

    /// Binds an element or attribute to a namespace declaration, or unbinds
    /// it with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongNodeType`] for other node kinds and
    /// [`Error::ForeignNode`]/[`Error::StaleNode`] for bad handles.
    pub fn set_ns(&mut self, node: impl AsNode, ns: Option<NsId>) -> Result<()> {
        let node = self.check(node)?;
        if let Some(ns) = ns {
            self.check_ns(ns)?;
        }
        match &mut self.node_mut(node).kind {
            NodeKind::Element { ns: slot, .. } | NodeKind::Attribute { ns: slot, .. } => {
                *slot = ns;
                Ok(())
            }
            other => Err(Error::WrongNodeType {
                expected: "element or attribute",
                found: other.node_type().as_str(),
            }),
        }
    }

    /// Finds a declaration of `uri` in scope at `context`, or declares one on
    /// `context`.
    ///
    /// The preferred prefix is used for a new declaration; without one a
    /// fresh `nsN` prefix is invented. The returned declaration is not bound
    /// to anything; pass it to [`set_ns`](Self::set_ns).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NamespaceCreation`] if `uri` is empty or the
    /// declaration cannot be attached (for instance the preferred prefix is
    /// already declared on `context` for another URI).
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.create_element("root").unwrap();
    /// doc.set_document_element(root).unwrap();
    ///
    /// let first = doc.resolve_or_create_namespace(root, "urn:a", None).unwrap();
    /// let again = doc.resolve_or_create_namespace(root, "urn:a", Some("a")).unwrap();
    /// assert_eq!(first, again);
    /// assert_eq!(doc.namespace(first).prefix(), Some("ns0"));
    /// ```
    pub fn resolve_or_create_namespace(
        &mut self,
        context: impl AsNode,
        uri: &str,
        preferred_prefix: Option<&str>,
    ) -> Result<NsId> {
        self.resolve_ns(context.node_id(), uri, preferred_prefix, false)
    }

    /// Like [`resolve_or_create_namespace`](Self::resolve_or_create_namespace)
    /// for attributes: default declarations are never reused and a prefix is
    /// always present on the result.
    ///
    /// # Errors
    ///
    /// See [`resolve_or_create_namespace`](Self::resolve_or_create_namespace).
    pub fn resolve_or_create_attribute_namespace(
        &mut self,
        context: impl AsNode,
        uri: &str,
        preferred_prefix: Option<&str>,
    ) -> Result<NsId> {
        self.resolve_ns(context.node_id(), uri, preferred_prefix, true)
    }

    fn resolve_ns(
        &mut self,
        context: NodeId,
        uri: &str,
        preferred_prefix: Option<&str>,
        for_attribute: bool,
    ) -> Result<NsId> {
        let context = self.element(context)?.id();
        if uri.is_empty() {
            return Err(Error::namespace(
                preferred_prefix,
                uri,
                "namespace URI is empty",
            ));
        }
        if let Some(found) = self.search_ns_by_href(context, uri, for_attribute) {
            return Ok(found);
        }
        match preferred_prefix {
            Some(prefix) => self.new_ns(context, uri, Some(prefix)),
            None => {
                let prefix = self.generate_prefix(context, uri)?;
                self.new_ns(context, uri, Some(&prefix))
            }
        }
    }

    /// Returns the first `nsN` prefix not visible at `context`.
    pub(crate) fn generate_prefix(&self, context: NodeId, uri: &str) -> Result<String> {
        (0..MAX_GENERATED_PREFIXES)
            .map(|n| format!("ns{n}"))
            .find(|candidate| self.search_ns(context, Some(candidate)).is_none())
            .ok_or_else(|| Error::namespace(None, uri, "no free prefix available"))
    }

    /// Declares a namespace on `element` and, when `activate` is set, binds
    /// the element to it.
    ///
    /// # Errors
    ///
    /// See [`new_ns`](Self::new_ns).
    pub fn declare_namespace(
        &mut self,
        element: Element,
        uri: &str,
        prefix: Option<&str>,
        activate: bool,
    ) -> Result<NsId> {
        let ns = self.new_ns(element, uri, prefix)?;
        if activate {
            self.set_ns(element, Some(ns))?;
        }
        Ok(ns)
    }

    /// Returns the URI bound to `prefix` at `node`. An undeclared default
    /// namespace (`xmlns=""`) yields `None`.
    #[must_use]
    pub fn lookup_namespace_uri(&self, node: impl AsNode, prefix: Option<&str>) -> Option<&str> {
        self.search_ns(node, prefix)
            .map(|ns| self.namespace(ns).uri())
            .filter(|uri| !uri.is_empty())
    }

    /// Returns a prefix bound to `uri` at `node`.
    #[must_use]
    pub fn lookup_namespace_prefix(&self, node: impl AsNode, uri: &str) -> Option<&str> {
        self.search_ns_by_href(node, uri, true)
            .and_then(|ns| self.namespace(ns).prefix())
    }

    /// Returns every declaration visible at `node`, innermost first, with the
    /// built-in `xml` binding last. Undeclarations and shadowed bindings are
    /// omitted.
    #[must_use]
    pub fn in_scope_namespaces(&self, node: impl AsNode) -> Vec<NsId> {
        let mut seen: Vec<Option<&str>> = Vec::new();
        let mut result = Vec::new();
        if let Some(start) = self.scope_start(node.node_id()) {
            for n in self.ancestors(start) {
                for &ns in self.namespace_declarations(n) {
                    let decl = self.namespace(ns);
                    if seen.contains(&decl.prefix()) {
                        continue;
                    }
                    seen.push(decl.prefix());
                    if !decl.uri().is_empty() {
                        result.push(ns);
                    }
                }
            }
        }
        result.push(self.xml_ns());
        result
    }
}
