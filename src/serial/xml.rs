//! XML serializer.
//!
//! Writes a [`Document`], or a single node of one, back to XML text. Elements
//! that were bound to a namespace declaration not in scope at their position
//! get the missing declaration on their start tag, so output produced from a
//! tree assembled through the API reparses with the same names.

use std::fmt;

use tracing::debug;

use super::scope::{Binding, NsScope};
use crate::encoding::is_utf8_label;
use crate::tree::{AsNode, Document, NodeId, NodeKind};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
/// use xmldom::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
/// assert!(xml.contains("  <child>"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
    /// Whether to start with the XML declaration. Defaults to `true`.
    pub declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            declaration: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented (pretty-printed) output.
    ///
    /// When enabled, child elements are placed on their own lines with
    /// indentation (two spaces per level by default). Mixed-content elements
    /// (those containing both text and element children) are not indented.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    ///
    /// Only takes effect when [`indent`](Self::indent) is enabled.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables the leading XML declaration.
    #[must_use]
    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// Serializes a document to an XML string.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
/// use xmldom::serial::serialize;
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize(&doc);
/// assert_eq!(xml, "<?xml version=\"1.0\"?>\n<root><child>Hello</child></root>\n");
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string with the given options.
///
/// Each child of the document node is followed by a newline. Unless the
/// document declares UTF-8, non-ASCII characters in text and attribute
/// values are written as character references, so the output reads the same
/// whatever encoding it is later stored in. Comments and processing
/// instructions are written verbatim.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut writer = XmlWriter::new(doc, options, needs_char_refs(doc));
    if options.declaration {
        write_declaration(&mut writer.out, doc);
        writer.out.push('\n');
    }
    for child in doc.children(doc.root()) {
        writer.write_node(child, 0, false);
        writer.out.push('\n');
    }
    debug!(
        bytes = writer.out.len(),
        indent = options.indent,
        "serialized document"
    );
    writer.out
}

impl Document {
    /// Serializes the whole document, XML declaration included. `format`
    /// turns on two-space indentation of element-only content.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str("<a><b/></a>").unwrap();
    /// assert_eq!(doc.dump(true), "<?xml version=\"1.0\"?>\n<a>\n  <b/>\n</a>\n");
    /// ```
    #[must_use]
    pub fn dump(&self, format: bool) -> String {
        serialize_with_options(self, &SerializeOptions::default().indent(format))
    }

    /// Concatenates the string form of every child of the document node,
    /// leaving out the document type declaration.
    ///
    /// Unless `skip_declaration` is set, the XML declaration comes first on
    /// a line of its own, and characters the declared encoding may not
    /// hold are written as character references as in [`dump`](Self::dump).
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str("<!DOCTYPE r><!--c--><r/>").unwrap();
    /// assert_eq!(doc.to_string_fragment(true), "<!--c--><r/>");
    /// ```
    #[must_use]
    pub fn to_string_fragment(&self, skip_declaration: bool) -> String {
        let mut out = String::new();
        if !skip_declaration {
            write_declaration(&mut out, self);
            out.push('\n');
        }
        let reencode_non_ascii = !skip_declaration && needs_char_refs(self);
        for child in self.children(self.root()) {
            if matches!(self.node(child).kind, NodeKind::DocumentType { .. }) {
                continue;
            }
            out.push_str(&self.node_text(child, reencode_non_ascii));
        }
        out
    }

    /// Returns the XML text of a single node.
    ///
    /// An element is written with its subtree and carries every namespace
    /// declaration the subtree relies on, including those made on its
    /// ancestors, so the result parses on its own. An attribute is written
    /// as `name="value"`. The document node yields [`dump`](Self::dump).
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to this document or is stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str(r#"<r xmlns:p="urn:p"><p:a p:k="v"/></r>"#).unwrap();
    /// let a = doc.find_nodes("*").unwrap()[0];
    /// assert_eq!(doc.node_to_string(a), r#"<p:a xmlns:p="urn:p" p:k="v"/>"#);
    /// ```
    #[must_use]
    pub fn node_to_string(&self, node: impl AsNode) -> String {
        self.node_text(node.node_id(), false)
    }

    fn node_text(&self, id: NodeId, reencode_non_ascii: bool) -> String {
        let options = SerializeOptions::default();
        match &self.node(id).kind {
            NodeKind::Document => self.dump(false),
            NodeKind::Attribute { value, .. } => {
                let mut out = self.node_name(id);
                out.push_str("=\"");
                write_escaped_attr(&mut out, value, reencode_non_ascii);
                out.push('"');
                out
            }
            NodeKind::Element { .. } => {
                let adopted = outside_bindings(self, id);
                let mut writer = XmlWriter::new(self, &options, reencode_non_ascii);
                writer.write_element(id, 0, false, &adopted);
                writer.out
            }
            _ => {
                let mut writer = XmlWriter::new(self, &options, reencode_non_ascii);
                writer.write_node(id, 0, false);
                writer.out
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump(false))
    }
}

/// Writes `<?xml version="..." encoding="..." standalone="..."?>`.
/// Whether non-ASCII output must be escaped: the document declares no
/// encoding or one other than UTF-8.
fn needs_char_refs(doc: &Document) -> bool {
    !doc.encoding().is_some_and(is_utf8_label)
}

fn write_declaration(out: &mut String, doc: &Document) {
    out.push_str("<?xml version=\"");
    out.push_str(doc.version());
    out.push('"');
    if let Some(encoding) = doc.encoding() {
        out.push_str(" encoding=\"");
        out.push_str(encoding);
        out.push('"');
    }
    if let Some(standalone) = doc.standalone() {
        out.push_str(" standalone=\"");
        out.push_str(if standalone { "yes" } else { "no" });
        out.push('"');
    }
    out.push_str("?>");
}

/// The bindings used inside the subtree at `root` that are declared on one
/// of its ancestors, first use per prefix. Bindings declared elsewhere, and
/// those that would change the name of `root` itself, are left to
/// per-element reconciliation.
fn outside_bindings(doc: &Document, root: NodeId) -> Vec<Binding> {
    let own: Vec<Option<&str>> = doc
        .namespace_declarations(root)
        .iter()
        .map(|&ns| doc.namespace(ns).prefix())
        .collect();
    let root_binding = doc.node_ns(root).map(|ns| doc.namespace(ns));

    let mut adopted: Vec<Binding> = Vec::new();
    for node in std::iter::once(root).chain(doc.descendants(root)) {
        let named = std::iter::once(node).chain(doc.attributes(node).map(|attr| attr.id()));
        for named in named {
            let Some(decl) = doc.node_ns(named).map(|ns| doc.namespace(ns)) else {
                continue;
            };
            let Some(owner) = decl.owner() else {
                continue;
            };
            if decl.uri().is_empty() || owner == root || !doc.is_ancestor_or_self(owner, root) {
                continue;
            }
            let prefix = decl.prefix();
            if own.contains(&prefix) || adopted.iter().any(|(p, _)| p.as_deref() == prefix) {
                continue;
            }
            let renames_root = match root_binding {
                Some(bound) => bound.prefix() == prefix && bound.uri() != decl.uri(),
                None => prefix.is_none(),
            };
            let default_unused_by_root =
                prefix.is_none() && root_binding.is_some_and(|bound| bound.prefix().is_some());
            if renames_root || default_unused_by_root {
                continue;
            }
            adopted.push((prefix.map(str::to_string), decl.uri().to_string()));
        }
    }
    adopted
}

/// Returns `true` if the element contains only other elements (and optional
/// whitespace text), meaning it's safe to add indentation.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    let mut has_element_child = false;
    for child in doc.children(id) {
        match &doc.node(child).kind {
            NodeKind::Element { .. } => has_element_child = true,
            NodeKind::Text { content } => {
                if !content.trim().is_empty() {
                    return false;
                }
            }
            NodeKind::CData { .. } => return false,
            _ => {}
        }
    }
    has_element_child
}

struct XmlWriter<'a> {
    doc: &'a Document,
    options: &'a SerializeOptions,
    reencode_non_ascii: bool,
    scope: NsScope,
    out: String,
}

impl<'a> XmlWriter<'a> {
    fn new(doc: &'a Document, options: &'a SerializeOptions, reencode_non_ascii: bool) -> Self {
        Self {
            doc,
            options,
            reencode_non_ascii,
            scope: NsScope::default(),
            out: String::new(),
        }
    }

    fn pad(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent_str);
        }
    }

    fn write_node(&mut self, id: NodeId, depth: usize, parent_is_element_only: bool) {
        let doc = self.doc;
        let pretty = self.options.indent && parent_is_element_only;
        match &doc.node(id).kind {
            NodeKind::Element { .. } => self.write_element(id, depth, parent_is_element_only, &[]),
            NodeKind::Text { content } => {
                write_escaped_text(&mut self.out, content, self.reencode_non_ascii);
            }
            // CDATA cannot carry character references.
            NodeKind::CData { content } if self.reencode_non_ascii && !content.is_ascii() => {
                write_escaped_text(&mut self.out, content, true);
            }
            NodeKind::CData { content } => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
                self.out.push_str("]]>");
            }
            NodeKind::Comment { content } => {
                if pretty {
                    self.pad(depth);
                }
                self.out.push_str("<!--");
                self.out.push_str(content);
                self.out.push_str("-->");
                if pretty {
                    self.out.push('\n');
                }
            }
            NodeKind::ProcessingInstruction { target, data } => {
                if pretty {
                    self.pad(depth);
                }
                self.out.push_str("<?");
                self.out.push_str(target);
                if let Some(data) = data.as_deref().filter(|d| !d.is_empty()) {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push_str("?>");
                if pretty {
                    self.out.push('\n');
                }
            }
            NodeKind::DocumentType {
                name,
                system_id,
                public_id,
                internal_subset,
            } => {
                let out = &mut self.out;
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                match (public_id, system_id) {
                    (Some(pub_id), Some(sys_id)) => {
                        out.push_str(" PUBLIC \"");
                        out.push_str(pub_id);
                        out.push_str("\" \"");
                        out.push_str(sys_id);
                        out.push('"');
                    }
                    (None, Some(sys_id)) => {
                        out.push_str(" SYSTEM \"");
                        out.push_str(sys_id);
                        out.push('"');
                    }
                    _ => {}
                }
                if let Some(subset) = internal_subset {
                    out.push_str(" [");
                    out.push_str(subset);
                    out.push(']');
                }
                out.push('>');
            }
            // Attributes are written by their element; the document node
            // never appears as a child.
            NodeKind::Attribute { .. } | NodeKind::Document => {}
        }
    }

    fn write_element(
        &mut self,
        id: NodeId,
        depth: usize,
        parent_is_element_only: bool,
        adopted: &[Binding],
    ) {
        let doc = self.doc;
        let pretty = self.options.indent && parent_is_element_only;
        let mark = self.scope.mark();
        let open = self.scope.open_element(doc, id, adopted);

        if pretty {
            self.pad(depth);
        }
        self.out.push('<');
        self.out.push_str(&open.qname);
        for (prefix, uri) in &open.declarations {
            self.out.push_str(" xmlns");
            if let Some(prefix) = prefix {
                self.out.push(':');
                self.out.push_str(prefix);
            }
            self.out.push_str("=\"");
            write_escaped_attr(&mut self.out, uri, self.reencode_non_ascii);
            self.out.push('"');
        }
        for (attr, qname) in &open.attributes {
            self.out.push(' ');
            self.out.push_str(qname);
            self.out.push_str("=\"");
            let value = doc.node_value(*attr).unwrap_or_default();
            write_escaped_attr(&mut self.out, value, self.reencode_non_ascii);
            self.out.push('"');
        }

        if doc.first_child(id).is_none() {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
            let element_only = self.options.indent && is_element_only(doc, id);
            if element_only {
                self.out.push('\n');
            }
            for child in doc.children(id) {
                if element_only {
                    if let NodeKind::Text { content } = &doc.node(child).kind {
                        if content.trim().is_empty() {
                            continue;
                        }
                    }
                }
                self.write_node(child, depth + 1, element_only);
            }
            if element_only {
                self.pad(depth);
            }
            self.out.push_str("</");
            self.out.push_str(&open.qname);
            self.out.push('>');
        }
        if pretty {
            self.out.push('\n');
        }
        self.scope.truncate(mark);
    }
}

/// Writes a hexadecimal character reference (`&#xHH;`) for a Unicode code point.
fn write_hex_char_ref(out: &mut String, ch: char) {
    use std::fmt::Write;
    let _ = write!(out, "&#x{:X};", ch as u32);
}

/// Escapes text content for XML output.
///
/// - `<`, `>`, `&` are escaped with named entity references
/// - `\r` is encoded as `&#13;`
/// - `\t` and `\n` are passed through
/// - Control characters below 0x20 (other than `\t`, `\n`, `\r`) are hex-encoded
/// - Non-ASCII characters are hex-encoded only when `reencode_non_ascii` is set
fn write_escaped_text(out: &mut String, text: &str, reencode_non_ascii: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            c if reencode_non_ascii && (c as u32) >= 0x80 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes attribute values for XML output.
///
/// Like [`write_escaped_text`], plus `"` and the whitespace characters
/// `\t`, `\n`, `\r` as character references so they survive attribute value
/// normalization on reparse.
fn write_escaped_attr(out: &mut String, text: &str, reencode_non_ascii: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            c if reencode_non_ascii && (c as u32) >= 0x80 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(input: &str) -> String {
        let doc = Document::parse_str(input).unwrap();
        doc.to_string_fragment(true)
    }

    #[test]
    fn test_serialize_empty_element() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        doc.set_document_element(root).unwrap();
        assert_eq!(serialize(&doc), "<?xml version=\"1.0\"?>\n<root/>\n");
    }

    #[test]
    fn test_declaration_fields() {
        let mut doc = Document::with_version("1.1", Some("UTF-8"));
        doc.set_standalone(Some(true));
        let root = doc.create_element("r").unwrap();
        doc.set_document_element(root).unwrap();
        assert_eq!(
            doc.to_string(),
            "<?xml version=\"1.1\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<r/>\n"
        );
    }

    #[test]
    fn test_without_declaration() {
        let doc = Document::parse_str("<r/>").unwrap();
        let xml = serialize_with_options(&doc, &SerializeOptions::default().declaration(false));
        assert_eq!(xml, "<r/>\n");
    }

    #[test]
    fn test_document_children_each_end_with_newline() {
        let doc = Document::parse_str("<!--a--><r/><?pi x?>").unwrap();
        assert_eq!(
            doc.dump(false),
            "<?xml version=\"1.0\"?>\n<!--a-->\n<r/>\n<?pi x?>\n"
        );
    }

    #[test]
    fn test_indent_element_only_content() {
        let doc = Document::parse_str("<a><b><c/></b><!--n--></a>").unwrap();
        assert_eq!(
            doc.dump(true),
            "<?xml version=\"1.0\"?>\n<a>\n  <b>\n    <c/>\n  </b>\n  <!--n-->\n</a>\n"
        );
    }

    #[test]
    fn test_indent_leaves_mixed_content_alone() {
        let doc = Document::parse_str("<a>text<b/></a>").unwrap();
        assert_eq!(doc.dump(true), "<?xml version=\"1.0\"?>\n<a>text<b/></a>\n");
    }

    #[test]
    fn test_custom_indent_string() {
        let doc = Document::parse_str("<a><b/></a>").unwrap();
        let options = SerializeOptions::default()
            .indent(true)
            .indent_str("\t")
            .declaration(false);
        assert_eq!(serialize_with_options(&doc, &options), "<a>\n\t<b/>\n</a>\n");
    }

    #[test]
    fn test_fragment_excludes_doctype() {
        let doc = Document::parse_str("<!DOCTYPE r SYSTEM \"r.dtd\"><r>x</r>").unwrap();
        assert_eq!(doc.to_string_fragment(true), "<r>x</r>");
        assert_eq!(
            doc.to_string_fragment(false),
            "<?xml version=\"1.0\"?>\n<r>x</r>"
        );
        assert!(doc.dump(false).contains("<!DOCTYPE r SYSTEM \"r.dtd\">"));
    }

    #[test]
    fn test_doctype_with_public_id_and_subset() {
        let doc = Document::parse_str(
            "<!DOCTYPE r PUBLIC \"-//X//EN\" \"r.dtd\" [<!ELEMENT r ANY>]><r/>",
        )
        .unwrap();
        assert!(doc
            .dump(false)
            .contains("<!DOCTYPE r PUBLIC \"-//X//EN\" \"r.dtd\" [<!ELEMENT r ANY>]>"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            roundtrip(r#"<r a="&quot;&lt;&#9;">1 &lt; 2 &amp; 3 &gt; 0</r>"#),
            r#"<r a="&quot;&lt;&#9;">1 &lt; 2 &amp; 3 &gt; 0</r>"#
        );
    }

    #[test]
    fn test_non_ascii_reencoded_unless_utf8_declared() {
        let doc = Document::parse_str("<r a=\"é\">ü</r>").unwrap();
        assert!(doc.dump(false).contains("<r a=\"&#xE9;\">&#xFC;</r>"));
        assert_eq!(doc.to_string_fragment(true), "<r a=\"é\">ü</r>");

        let doc = Document::parse_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?><r>ü</r>").unwrap();
        assert!(doc.dump(false).contains("<r>ü</r>"));

        let doc =
            Document::parse_str("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>ü</r>").unwrap();
        assert!(doc.dump(false).ends_with("<r>&#xFC;</r>\n"));
        assert!(doc.to_string_fragment(false).ends_with("<r>&#xFC;</r>"));
        assert_eq!(doc.to_string_fragment(true), "<r>ü</r>");
    }

    #[test]
    fn test_non_ascii_cdata_becomes_text_when_reencoding() {
        let mut doc = Document::with_version("1.0", Some("windows-1252"));
        let root = doc.create_element("r").unwrap();
        doc.set_document_element(root).unwrap();
        let plain = doc.create_cdata_section("<b>").unwrap();
        let accented = doc.create_cdata_section("<ü>").unwrap();
        doc.append_child(root, plain).unwrap();
        doc.append_child(root, accented).unwrap();
        assert!(doc
            .dump(false)
            .ends_with("<r><![CDATA[<b>]]>&lt;&#xFC;&gt;</r>\n"));
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let mut doc = Document::new();
        let root = doc.create_element("r").unwrap();
        doc.set_document_element(root).unwrap();
        let cdata = doc.create_cdata_section("a]]>b").unwrap();
        doc.append_child(root, cdata).unwrap();
        assert_eq!(
            doc.to_string_fragment(true),
            "<r><![CDATA[a]]]]><![CDATA[>b]]></r>"
        );
    }

    #[test]
    fn test_generated_prefix_declared_on_root() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        doc.set_document_element(root).unwrap();
        let child = doc
            .create_element_ns("http://example.com/ns", "child")
            .unwrap();
        doc.append_child(root, child).unwrap();
        assert_eq!(
            doc.to_string_fragment(true),
            r#"<root xmlns:ns0="http://example.com/ns"><ns0:child/></root>"#
        );
    }

    #[test]
    fn test_node_to_string_redeclares_ancestor_bindings() {
        let doc = Document::parse_str(
            r#"<r xmlns="urn:d" xmlns:p="urn:p"><a><p:b/><c/></a></r>"#,
        )
        .unwrap();
        let r = doc.document_element().unwrap();
        let a = doc.first_child(r).unwrap();
        assert_eq!(
            doc.node_to_string(a),
            r#"<a xmlns="urn:d" xmlns:p="urn:p"><p:b/><c/></a>"#
        );
    }

    #[test]
    fn test_node_to_string_of_other_kinds() {
        let doc = Document::parse_str(r#"<r xmlns:p="urn:p" p:k="a&amp;b"><!--c-->t</r>"#).unwrap();
        let r = doc.document_element().unwrap();
        let attr = doc.attributes(r).next().unwrap();
        assert_eq!(doc.node_to_string(attr), r#"p:k="a&amp;b""#);
        let comment = doc.first_child(r).unwrap();
        assert_eq!(doc.node_to_string(comment), "<!--c-->");
        let text = doc.last_child(r).unwrap();
        assert_eq!(doc.node_to_string(text), "t");
    }

    #[test]
    fn test_no_namespace_child_under_default_is_undeclared() {
        let mut doc = Document::parse_str(r#"<r xmlns="urn:d"/>"#).unwrap();
        let r = doc.document_element().unwrap();
        let plain = doc.create_element("plain").unwrap();
        doc.append_child(r, plain).unwrap();
        assert_eq!(
            doc.to_string_fragment(true),
            r#"<r xmlns="urn:d"><plain xmlns=""/></r>"#
        );
    }

    #[test]
    fn test_moved_subtree_keeps_its_namespace() {
        let mut doc = Document::parse_str(r#"<r><x xmlns:p="urn:p"><p:y/></x></r>"#).unwrap();
        let r = doc.document_element().unwrap();
        let x = doc.first_child(r).unwrap();
        let y = doc.first_child(x).unwrap();
        doc.append_child(r, y).unwrap();
        let xml = doc.to_string_fragment(true);
        assert_eq!(
            xml,
            r#"<r><x xmlns:p="urn:p"/><p:y xmlns:p="urn:p"/></r>"#
        );
        assert!(Document::parse_str(&xml).is_ok());
    }

    #[test]
    fn test_display_matches_dump() {
        let doc = Document::parse_str("<a><b/></a>").unwrap();
        assert_eq!(doc.to_string(), doc.dump(false));
    }
}
