//! Namespace bindings in force while writing a tree.
//!
//! Trees built through the API can bind an element or attribute to a
//! declaration that is not in scope where the node ends up, for instance
//! after moving a subtree or when serializing a subtree on its own. Writers
//! push every declaration they emit onto an [`NsScope`] and call
//! [`NsScope::open_element`], which adds whatever declarations the element
//! needs to be namespace-well-formed at its position. The XML writer and the
//! canonicalizer share this, so both see the same bindings.

use std::collections::BTreeMap;

use crate::tree::{Document, NodeId, NodeKind};
use crate::util::qname::XML_NAMESPACE;

/// One declaration as written: prefix (`None` for the default namespace)
/// and URI (empty for an undeclared default).
pub(crate) type Binding = (Option<String>, String);

/// Upper bound on generated prefixes tried before reusing the last one.
const MAX_GENERATED_PREFIXES: u32 = 1000;

/// The names and declarations an element is written with.
#[derive(Debug, Default)]
pub(crate) struct OpenElement {
    /// The element's qualified name.
    pub qname: String,
    /// Declarations to emit on the start tag, in order.
    pub declarations: Vec<Binding>,
    /// Each attribute with its qualified name, in document order.
    pub attributes: Vec<(NodeId, String)>,
}

/// Stack of emitted declarations, innermost last.
#[derive(Debug, Clone, Default)]
pub(crate) struct NsScope {
    bindings: Vec<Binding>,
}

impl NsScope {
    /// A scope holding the declarations visible at `node` in the tree,
    /// outermost first. Used when writing starts below the document element.
    pub(crate) fn inherited(doc: &Document, node: NodeId) -> Self {
        let mut scope = Self::default();
        let mut chain: Vec<NodeId> = doc.ancestors(node).skip(1).collect();
        chain.reverse();
        for ancestor in chain {
            for &ns in doc.namespace_declarations(ancestor) {
                let decl = doc.namespace(ns);
                scope.push(decl.prefix().map(str::to_string), decl.uri().to_string());
            }
        }
        scope
    }

    pub(crate) fn mark(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn truncate(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    fn push(&mut self, prefix: Option<String>, uri: String) {
        self.bindings.push((prefix, uri));
    }

    /// The URI bound to `prefix`, or the default namespace for `None`.
    pub(crate) fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// The nearest prefix bound to `uri` that is not shadowed.
    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings.iter().rev().find_map(|(p, u)| {
            let p = p.as_deref()?;
            (u == uri && self.lookup(Some(p)) == Some(uri)).then_some(p)
        })
    }

    /// Every binding in force, innermost wins, keyed by prefix with the
    /// default namespace under `""`. The `xml` binding is not listed.
    pub(crate) fn in_scope(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (prefix, uri) in &self.bindings {
            map.insert(prefix.clone().unwrap_or_default(), uri.clone());
        }
        map
    }

    /// Pushes the declarations of `element` and any it is missing, and
    /// returns the names to write it with.
    ///
    /// `adopted` bindings are declared right after the element's own unless
    /// it already declares the prefix. The caller takes a
    /// [`mark`](Self::mark) beforehand and truncates to it once the element
    /// is closed.
    pub(crate) fn open_element(
        &mut self,
        doc: &Document,
        element: NodeId,
        adopted: &[Binding],
    ) -> OpenElement {
        let NodeKind::Element {
            name,
            ns,
            attributes,
            ns_defs,
        } = &doc.node(element).kind
        else {
            return OpenElement::default();
        };

        let mut open = OpenElement::default();
        for &def in ns_defs {
            let decl = doc.namespace(def);
            self.declare(&mut open.declarations, decl.prefix(), decl.uri());
        }
        for (prefix, uri) in adopted {
            if !open.declarations.iter().any(|(p, _)| p == prefix) {
                self.declare(&mut open.declarations, prefix.as_deref(), uri);
            }
        }

        let bound = ns.map(|ns| doc.namespace(ns)).filter(|decl| !decl.uri().is_empty());
        open.qname = match bound {
            Some(decl) => {
                let prefix = self.bind(&mut open.declarations, decl.prefix(), decl.uri(), false);
                qualify(prefix.as_deref(), name)
            }
            None => {
                let needs_undeclaration = !name.contains(':')
                    && self.lookup(None).is_some_and(|uri| !uri.is_empty())
                    && !open.declarations.iter().any(|(p, _)| p.is_none());
                if needs_undeclaration {
                    self.declare(&mut open.declarations, None, "");
                }
                name.clone()
            }
        };

        for &attr in attributes {
            let NodeKind::Attribute { name, ns, .. } = &doc.node(attr).kind else {
                continue;
            };
            let bound = ns.map(|ns| doc.namespace(ns)).filter(|decl| !decl.uri().is_empty());
            let qname = match bound {
                Some(decl) => {
                    let prefix = self.bind(&mut open.declarations, decl.prefix(), decl.uri(), true);
                    qualify(prefix.as_deref(), name)
                }
                None => name.clone(),
            };
            open.attributes.push((attr, qname));
        }
        open
    }

    fn declare(&mut self, declarations: &mut Vec<Binding>, prefix: Option<&str>, uri: &str) {
        let binding = (prefix.map(str::to_string), uri.to_string());
        declarations.push(binding.clone());
        self.bindings.push(binding);
    }

    /// Returns the prefix under which `uri` is usable here, declaring it
    /// when nothing suitable is in scope. Attributes always get a prefix.
    fn bind(
        &mut self,
        declarations: &mut Vec<Binding>,
        preferred: Option<&str>,
        uri: &str,
        for_attribute: bool,
    ) -> Option<String> {
        if (!for_attribute || preferred.is_some()) && self.lookup(preferred) == Some(uri) {
            return preferred.map(str::to_string);
        }
        if for_attribute {
            if let Some(prefix) = self.prefix_for(uri) {
                return Some(prefix.to_string());
            }
        }
        let declared_here = |p: Option<&str>| declarations.iter().any(|(d, _)| d.as_deref() == p);
        let candidate = match preferred {
            Some(p) if !declared_here(Some(p)) => Some(p.to_string()),
            None if !for_attribute && !declared_here(None) => None,
            _ => Some(self.generate_prefix(declarations)),
        };
        self.declare(declarations, candidate.as_deref(), uri);
        candidate
    }

    fn generate_prefix(&self, declarations: &[Binding]) -> String {
        (0..MAX_GENERATED_PREFIXES)
            .map(|n| format!("ns{n}"))
            .find(|p| {
                self.lookup(Some(p.as_str())).is_none()
                    && !declarations.iter().any(|(d, _)| d.as_deref() == Some(p.as_str()))
            })
            .unwrap_or_else(|| format!("ns{MAX_GENERATED_PREFIXES}"))
    }
}

fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}
