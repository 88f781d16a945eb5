//! Node kinds, typed node handles and the polymorphic [`Node`] view.
//!
//! The arena stores a [`NodeKind`] per node. Callers mostly work with thin
//! typed handles ([`Element`], [`Attribute`], [`Text`], ...) which are plain
//! [`NodeId`] newtypes: copying a handle never copies the node, and two
//! handles compare equal exactly when they designate the same node.
//! [`Document::wrap`](super::Document::wrap) is the single place that turns
//! an untyped id into the matching variant of [`Node`].

use std::fmt;

use super::{NodeId, NsId};

/// The kind of a node and its associated data.
///
/// Navigation links (parent, children, siblings) live in
/// [`NodeData`](super::NodeData), not here.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node, e.g. `<p:div class="x">`.
    Element {
        /// The local name. Elements created without a namespace keep the
        /// name exactly as supplied, colons included.
        name: String,
        /// The namespace this element is bound to, if any.
        ns: Option<NsId>,
        /// Attribute nodes, in document order.
        attributes: Vec<NodeId>,
        /// Namespace declarations made on this element, in document order.
        ns_defs: Vec<NsId>,
    },

    /// An attribute node. Its parent is the owning element, but it is never
    /// part of that element's child list.
    Attribute {
        /// The local name (or the full name when not namespace-bound).
        name: String,
        /// The attribute value with references already expanded.
        value: String,
        /// The namespace this attribute is bound to, if any.
        ns: Option<NsId>,
    },

    /// A text node containing character data.
    Text {
        /// The text content, unescaped.
        content: String,
    },

    /// A CDATA section, e.g. `<![CDATA[...]]>`.
    CData {
        /// The section content.
        content: String,
    },

    /// A comment node, e.g. `<!-- ... -->`.
    Comment {
        /// The comment text without delimiters.
        content: String,
    },

    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// A document type declaration, e.g. `<!DOCTYPE html>`.
    DocumentType {
        /// The root element name declared in the DOCTYPE.
        name: String,
        /// The SYSTEM identifier, if any.
        system_id: Option<String>,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The raw internal subset between `[` and `]`, if any.
        internal_subset: Option<String>,
    },
}

impl NodeKind {
    /// Returns the type tag for this kind.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::Element { .. } => NodeType::Element,
            Self::Attribute { .. } => NodeType::Attribute,
            Self::Text { .. } => NodeType::Text,
            Self::CData { .. } => NodeType::CDataSection,
            Self::Comment { .. } => NodeType::Comment,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            Self::DocumentType { .. } => NodeType::DocumentType,
        }
    }
}

/// The type tag of a node, numbered as in the W3C DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    /// An element.
    Element = 1,
    /// An attribute.
    Attribute = 2,
    /// A text node.
    Text = 3,
    /// A CDATA section.
    CDataSection = 4,
    /// A processing instruction.
    ProcessingInstruction = 7,
    /// A comment.
    Comment = 8,
    /// The document node.
    Document = 9,
    /// A document type declaration.
    DocumentType = 10,
}

impl NodeType {
    /// Returns a lowercase human-readable name for this type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::Text => "text",
            Self::CDataSection => "cdata-section",
            Self::ProcessingInstruction => "processing-instruction",
            Self::Comment => "comment",
            Self::Document => "document",
            Self::DocumentType => "document-type",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that designates a node in a document.
///
/// Implemented by [`NodeId`], every typed handle and [`Node`], so document
/// accessors accept whichever the caller has at hand.
pub trait AsNode {
    /// Returns the untyped id of the designated node.
    fn node_id(&self) -> NodeId;
}

impl AsNode for NodeId {
    fn node_id(&self) -> NodeId {
        *self
    }
}

impl<T: AsNode + ?Sized> AsNode for &T {
    fn node_id(&self) -> NodeId {
        (**self).node_id()
    }
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident, $ty:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) NodeId);

        impl $name {
            /// The node type every handle of this kind designates.
            pub const NODE_TYPE: NodeType = $ty;

            /// Returns the untyped id of this node.
            #[must_use]
            pub fn id(self) -> NodeId {
                self.0
            }
        }

        impl AsNode for $name {
            fn node_id(&self) -> NodeId {
                self.0
            }
        }

        impl From<$name> for NodeId {
            fn from(handle: $name) -> NodeId {
                handle.0
            }
        }
    };
}

typed_handle!(
    /// Handle to the document node.
    DocumentNode,
    NodeType::Document
);
typed_handle!(
    /// Handle to an element.
    Element,
    NodeType::Element
);
typed_handle!(
    /// Handle to an attribute.
    Attribute,
    NodeType::Attribute
);
typed_handle!(
    /// Handle to a text node.
    Text,
    NodeType::Text
);
typed_handle!(
    /// Handle to a CDATA section.
    CDataSection,
    NodeType::CDataSection
);
typed_handle!(
    /// Handle to a comment.
    Comment,
    NodeType::Comment
);
typed_handle!(
    /// Handle to a processing instruction.
    ProcessingInstruction,
    NodeType::ProcessingInstruction
);
typed_handle!(
    /// Handle to a document type declaration.
    DocumentType,
    NodeType::DocumentType
);

/// A node of any kind, as returned by queries and generic navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// The document node.
    Document(DocumentNode),
    /// An element.
    Element(Element),
    /// An attribute.
    Attribute(Attribute),
    /// A text node.
    Text(Text),
    /// A CDATA section.
    CDataSection(CDataSection),
    /// A comment.
    Comment(Comment),
    /// A processing instruction.
    ProcessingInstruction(ProcessingInstruction),
    /// A document type declaration.
    DocumentType(DocumentType),
}

impl Node {
    pub(crate) fn from_kind(id: NodeId, kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Document => Self::Document(DocumentNode(id)),
            NodeKind::Element { .. } => Self::Element(Element(id)),
            NodeKind::Attribute { .. } => Self::Attribute(Attribute(id)),
            NodeKind::Text { .. } => Self::Text(Text(id)),
            NodeKind::CData { .. } => Self::CDataSection(CDataSection(id)),
            NodeKind::Comment { .. } => Self::Comment(Comment(id)),
            NodeKind::ProcessingInstruction { .. } => {
                Self::ProcessingInstruction(ProcessingInstruction(id))
            }
            NodeKind::DocumentType { .. } => Self::DocumentType(DocumentType(id)),
        }
    }

    /// Returns the type tag of the wrapped node.
    #[must_use]
    pub fn node_type(self) -> NodeType {
        match self {
            Self::Document(_) => NodeType::Document,
            Self::Element(_) => NodeType::Element,
            Self::Attribute(_) => NodeType::Attribute,
            Self::Text(_) => NodeType::Text,
            Self::CDataSection(_) => NodeType::CDataSection,
            Self::Comment(_) => NodeType::Comment,
            Self::ProcessingInstruction(_) => NodeType::ProcessingInstruction,
            Self::DocumentType(_) => NodeType::DocumentType,
        }
    }

    /// Returns the element handle if this is an element.
    #[must_use]
    pub fn as_element(self) -> Option<Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the attribute handle if this is an attribute.
    #[must_use]
    pub fn as_attribute(self) -> Option<Attribute> {
        match self {
            Self::Attribute(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the text handle if this is a text node.
    #[must_use]
    pub fn as_text(self) -> Option<Text> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl AsNode for Node {
    fn node_id(&self) -> NodeId {
        match self {
            Self::Document(n) => n.0,
            Self::Element(n) => n.0,
            Self::Attribute(n) => n.0,
            Self::Text(n) => n.0,
            Self::CDataSection(n) => n.0,
            Self::Comment(n) => n.0,
            Self::ProcessingInstruction(n) => n.0,
            Self::DocumentType(n) => n.0,
        }
    }
}

impl From<Node> for NodeId {
    fn from(node: Node) -> NodeId {
        node.node_id()
    }
}

macro_rules! node_from_handle {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Node {
                fn from(handle: $variant) -> Node {
                    Node::$variant(handle)
                }
            }
        )*
    };
}

node_from_handle!(
    Element,
    Attribute,
    Text,
    CDataSection,
    Comment,
    ProcessingInstruction,
    DocumentType
);

impl From<DocumentNode> for Node {
    fn from(handle: DocumentNode) -> Node {
        Node::Document(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_numbers() {
        assert_eq!(NodeType::Element as u8, 1);
        assert_eq!(NodeType::Attribute as u8, 2);
        assert_eq!(NodeType::Document as u8, 9);
    }

    #[test]
    fn test_node_kind_type_tag() {
        let kind = NodeKind::Comment {
            content: "c".to_string(),
        };
        assert_eq!(kind.node_type(), NodeType::Comment);
        assert_eq!(kind.node_type().to_string(), "comment");
    }
}
