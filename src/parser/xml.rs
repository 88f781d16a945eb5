//! Core XML 1.0 parser state machine.
//!
//! A recursive descent parser for XML 1.0 (Fifth Edition) with Namespaces in
//! XML 1.0. Namespace declarations become [`NsId`](crate::NsId) entries on
//! their element and every prefixed name is bound while the element is
//! open, so the finished tree answers namespace queries without a second
//! pass.

use tracing::debug;

use crate::error::ParseError;
use crate::tree::{Document, NodeId, NodeKind};
use crate::util::qname::split_qname;

use super::input::{
    parse_cdata_content, parse_comment_content, parse_pi_content, parse_xml_decl, ParserInput,
};
use super::ParseOptions;

/// An attribute as written in a start tag, before namespace processing.
struct RawAttribute {
    qname: String,
    value: String,
}

/// The tree-building XML parser.
pub(crate) struct XmlParser<'a> {
    input: ParserInput<'a>,
    doc: Document,
    options: ParseOptions,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_recover(options.recover);
        pi.set_max_depth(options.max_depth);
        pi.set_max_name_length(options.max_name_length);
        pi.set_max_entity_expansions(options.max_entity_expansions);

        let mut doc = Document::new();
        if let Some(url) = &options.base_url {
            doc.set_base_uri(url);
        }
        Self {
            input: pi,
            doc,
            options: options.clone(),
        }
    }

    /// Parses the entire document.
    pub fn parse(mut self) -> Result<Document, ParseError> {
        // The XML declaration must be the very first thing (XML 1.0 §2.8).
        if self.looking_at_xml_decl() {
            self.parse_xml_declaration()?;
        } else if self.input.skip_whitespace() && self.looking_at_xml_decl() {
            return Err(self
                .input
                .fatal("XML declaration must be at the start of the document"));
        }

        let root = self.doc.root();
        self.parse_misc(root)?;

        if self.input.looking_at("<!DOCTYPE") {
            self.parse_doctype(root)?;
            self.parse_misc(root)?;
        }

        if self.input.peek() == Some(b'<') && !self.input.looking_at("<!") {
            self.parse_element(root)?;
        } else {
            self.input.recoverable("missing root element".to_string())?;
        }

        self.parse_misc(root)?;
        if !self.input.at_end() {
            self.input
                .recoverable("content after document element".to_string())?;
        }

        self.doc.diagnostics = std::mem::take(&mut self.input.diagnostics);
        debug!(
            nodes = self.doc.node_count(),
            diagnostics = self.doc.diagnostics.len(),
            "parsed document"
        );
        Ok(self.doc)
    }

    fn looking_at_xml_decl(&self) -> bool {
        ["<?xml ", "<?xml\t", "<?xml\r", "<?xml\n"]
            .iter()
            .any(|s| self.input.looking_at(s))
    }

    /// Converts a tree error into a parse error at the current position.
    fn tree<T>(&self, result: crate::Result<T>) -> Result<T, ParseError> {
        result.map_err(|err| self.input.fatal(err.to_string()))
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, ParseError> {
        let allocated = self.doc.alloc(kind);
        let id = self.tree(allocated)?;
        self.doc.link_append(parent, id);
        Ok(id)
    }

    // --- XML Declaration ---
    // See XML 1.0 §2.8: [23] XMLDecl

    fn parse_xml_declaration(&mut self) -> Result<(), ParseError> {
        let decl = parse_xml_decl(&mut self.input)?;
        self.doc.set_version(&decl.version);
        if let Some(encoding) = &decl.encoding {
            self.doc.set_encoding(encoding);
        }
        self.doc.set_standalone(decl.standalone);
        Ok(())
    }

    // --- Misc (comments, PIs, whitespace) ---

    /// Parses comments and PIs outside the document element. Whitespace
    /// there is not content and is dropped.
    fn parse_misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at("<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at("<?") {
                self.parse_processing_instruction(parent)?;
            } else {
                return Ok(());
            }
        }
    }

    // --- DOCTYPE Declaration ---
    // See XML 1.0 §2.8: [28] doctypedecl

    fn parse_doctype(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.expect_str("<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();

        let mut system_id = None;
        let mut public_id = None;
        if self.input.looking_at("SYSTEM") {
            self.input.expect_str("SYSTEM")?;
            self.input.skip_whitespace_required()?;
            system_id = Some(self.input.parse_quoted_value()?);
            self.input.skip_whitespace();
        } else if self.input.looking_at("PUBLIC") {
            self.input.expect_str("PUBLIC")?;
            self.input.skip_whitespace_required()?;
            public_id = Some(self.input.parse_quoted_value()?);
            self.input.skip_whitespace_required()?;
            system_id = Some(self.input.parse_quoted_value()?);
            self.input.skip_whitespace();
        }

        let mut internal_subset = None;
        if self.input.peek() == Some(b'[') {
            self.input.advance(1);
            let subset = self.scan_internal_subset()?;
            for (entity, value) in internal_entities(subset) {
                self.input.entity_map.entry(entity).or_insert(value);
            }
            internal_subset = Some(subset.to_string());
            self.input.skip_whitespace();
        }
        self.input.expect_byte(b'>')?;

        self.append(
            parent,
            NodeKind::DocumentType {
                name,
                system_id,
                public_id,
                internal_subset,
            },
        )?;
        Ok(())
    }

    /// Scans to the `]` closing the internal subset and returns the text in
    /// between. Quoted literals and comments may contain brackets.
    fn scan_internal_subset(&mut self) -> Result<&'a str, ParseError> {
        let start = self.input.pos();
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in internal subset"));
            }
            if self.input.looking_at("<!--") {
                parse_comment_content(&mut self.input)?;
                continue;
            }
            match self.input.peek() {
                Some(b']') => {
                    let end = self.input.pos();
                    self.input.advance(1);
                    return Ok(self.input.slice(start, end));
                }
                Some(b'"' | b'\'') => {
                    self.input.parse_quoted_value()?;
                }
                _ => {
                    self.input.next_char()?;
                }
            }
        }
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [40] STag, [42] ETag, [44] EmptyElemTag

    fn parse_element(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let qname = self.input.parse_name()?;

        let mut attributes: Vec<RawAttribute> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at("/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let attr = self.parse_attribute()?;
            if attributes.iter().any(|a| a.qname == attr.qname) {
                self.input
                    .recoverable(format!("duplicate attribute: '{}'", attr.qname))?;
                continue;
            }
            attributes.push(attr);
            if attributes.len() > self.options.max_attributes as usize {
                return Err(self.input.fatal(format!(
                    "too many attributes on element '{qname}' (maximum {})",
                    self.options.max_attributes
                )));
            }
        }

        let element = self.append(
            parent,
            NodeKind::Element {
                name: qname.clone(),
                ns: None,
                attributes: Vec::new(),
                ns_defs: Vec::new(),
            },
        )?;
        self.declare_namespaces(element, &attributes)?;
        self.bind_element(element, &qname)?;
        self.attach_attributes(element, attributes)?;

        if self.input.looking_at("/>") {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
            self.parse_content(element)?;
            if self.input.at_end() {
                // Only reachable in recovery mode.
                self.input.recoverable(format!("unclosed element '{qname}'"))?;
            } else {
                self.input.expect_str("</")?;
                let end_name = self.input.parse_name()?;
                if end_name != qname {
                    return Err(self.input.fatal(format!(
                        "mismatched end tag: expected '</{qname}>', found '</{end_name}>'"
                    )));
                }
                self.input.skip_whitespace();
                self.input.expect_byte(b'>')?;
            }
        }

        self.input.decrement_depth();
        Ok(())
    }

    fn parse_attribute(&mut self) -> Result<RawAttribute, ParseError> {
        let qname = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'=')?;
        self.input.skip_whitespace();
        let value = self
            .input
            .parse_attribute_value(self.options.max_attribute_length)?;
        Ok(RawAttribute { qname, value })
    }

    /// Records the `xmlns` and `xmlns:p` attributes as namespace
    /// declarations on `element`.
    fn declare_namespaces(
        &mut self,
        element: NodeId,
        attributes: &[RawAttribute],
    ) -> Result<(), ParseError> {
        for attr in attributes {
            let prefix = match attr.qname.as_str() {
                "xmlns" => None,
                name => match name.strip_prefix("xmlns:") {
                    Some(prefix) => Some(prefix),
                    None => continue,
                },
            };
            if let Err(err) = self.doc.new_ns(element, &attr.value, prefix) {
                self.input
                    .recoverable(format!("invalid namespace declaration: {err}"))?;
            }
        }
        Ok(())
    }

    /// Splits a prefixed element name and binds it to the declaration in
    /// scope. Unprefixed elements take the default namespace, if any.
    fn bind_element(&mut self, element: NodeId, qname: &str) -> Result<(), ParseError> {
        let (prefix, local) = split_qname(qname);
        let Some(ns) = self.doc.search_ns(element, prefix) else {
            if let Some(prefix) = prefix {
                self.input.recoverable(format!(
                    "namespace prefix '{prefix}' on element '{qname}' is not bound"
                ))?;
            }
            return Ok(());
        };
        if self.doc.namespace(ns).uri().is_empty() {
            return Ok(());
        }
        if let NodeKind::Element { name, ns: slot, .. } = &mut self.doc.node_mut(element).kind {
            *name = local.to_string();
            *slot = Some(ns);
        }
        Ok(())
    }

    /// Creates attribute nodes for every non-declaration attribute and
    /// binds the prefixed ones.
    fn attach_attributes(
        &mut self,
        element: NodeId,
        attributes: Vec<RawAttribute>,
    ) -> Result<(), ParseError> {
        for RawAttribute { qname, value } in attributes {
            if qname == "xmlns" || qname.starts_with("xmlns:") {
                continue;
            }
            let (prefix, local) = split_qname(&qname);
            let mut name = qname.clone();
            let mut ns = None;
            if let Some(prefix) = prefix {
                match self.doc.search_ns(element, Some(prefix)) {
                    Some(found) if !self.doc.namespace(found).uri().is_empty() => {
                        name = local.to_string();
                        ns = Some(found);
                    }
                    _ => self.input.recoverable(format!(
                        "namespace prefix '{prefix}' on attribute '{qname}' is not bound"
                    ))?,
                }
            }

            // Namespaces in XML 1.0 §6.3: no two attributes may share an
            // expanded name.
            if let Some(ns) = ns {
                let uri = self.doc.namespace(ns).uri();
                if self.doc.get_attribute_node_ns(element, uri, &name).is_some() {
                    self.input.recoverable(format!(
                        "duplicate attribute: '{{{uri}}}{name}'"
                    ))?;
                    continue;
                }
            }

            let allocated = self.doc.alloc(NodeKind::Attribute { name, value, ns });
            let attr = self.tree(allocated)?;
            self.doc.attach_attribute(element, attr);
        }
        Ok(())
    }

    // --- Content ---
    // See XML 1.0 §3.1: [43] content

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                if self.options.recover {
                    return Ok(());
                }
                return Err(self
                    .input
                    .fatal("unexpected end of input in element content"));
            }
            if self.input.looking_at("</") {
                return Ok(());
            }

            if self.input.looking_at("<![CDATA[") {
                self.parse_cdata(parent)?;
            } else if self.input.looking_at("<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at("<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element(parent)?;
            } else {
                self.parse_char_data(parent)?;
            }
        }
    }

    // --- Character Data ---
    // See XML 1.0 §2.4: [14] CharData

    fn parse_char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();
        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => {
                    let resolved = self.input.parse_reference()?;
                    text.push_str(&resolved);
                }
                b']' if self.input.looking_at("]]>") => {
                    self.input
                        .recoverable("']]>' not allowed in character data".to_string())?;
                    text.push_str("]]>");
                    self.input.advance(3);
                }
                _ => text.push(self.input.next_char()?),
            }
            if text.len() > self.options.max_text_length {
                return Err(self.input.fatal(format!(
                    "text node length exceeds maximum ({})",
                    self.options.max_text_length
                )));
            }
        }

        if self.options.no_blanks && text.chars().all(|c| matches!(c, ' ' | '\t' | '\n')) {
            return Ok(());
        }
        if !text.is_empty() {
            self.append(parent, NodeKind::Text { content: text })?;
        }
        Ok(())
    }

    // --- Comments ---
    // See XML 1.0 §2.5: [15] Comment

    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = parse_comment_content(&mut self.input)?;
        self.append(parent, NodeKind::Comment { content })?;
        Ok(())
    }

    // --- CDATA Sections ---
    // See XML 1.0 §2.7: [18] CDSect

    fn parse_cdata(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = parse_cdata_content(&mut self.input)?;
        self.append(parent, NodeKind::CData { content })?;
        Ok(())
    }

    // --- Processing Instructions ---
    // See XML 1.0 §2.6: [16] PI

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let (target, data) = parse_pi_content(&mut self.input)?;
        self.append(parent, NodeKind::ProcessingInstruction { target, data })?;
        Ok(())
    }
}

/// Extracts internal general entity declarations
/// (`<!ENTITY name "value">`) from an internal subset. Parameter entities
/// and external entities are skipped.
fn internal_entities(subset: &str) -> Vec<(String, String)> {
    let mut entities = Vec::new();
    let mut rest = subset;
    while let Some(at) = rest.find("<!ENTITY") {
        rest = &rest[at + "<!ENTITY".len()..];
        let mut decl = ParserInput::new(rest);
        if !decl.skip_whitespace() || decl.peek() == Some(b'%') {
            continue;
        }
        let Ok(name) = decl.parse_name() else {
            continue;
        };
        decl.skip_whitespace();
        if !matches!(decl.peek(), Some(b'"' | b'\'')) {
            continue;
        }
        if let Ok(value) = decl.parse_quoted_value() {
            entities.push((name, value));
        }
    }
    entities
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{parse_str_with_options, ParseOptions};
    use crate::tree::NodeType;
    use crate::util::qname::XML_NAMESPACE;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        Document::parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_parse_empty_element() {
        let doc = parse("<root/>");
        let root = doc.document_element().unwrap();
        assert_eq!(doc.node_name(root), "root");
        assert!(!doc.has_child_nodes(root));
    }

    #[test]
    fn test_parse_nested_elements_and_text() {
        let doc = parse("<a><b>one</b><c>two</c></a>");
        let a = doc.document_element().unwrap();
        let names: Vec<_> = doc.children(a).map(|c| doc.node_name(c)).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(doc.text_content(a), "onetwo");
    }

    #[test]
    fn test_parse_attributes_in_order() {
        let doc = parse(r#"<r b="2" a='1'/>"#);
        let r = doc.document_element().unwrap();
        let attrs: Vec<_> = doc
            .attributes(r)
            .map(|a| (doc.node_name(a), doc.node_value(a).unwrap().to_string()))
            .collect();
        assert_eq!(
            attrs,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_xml_declaration_metadata() {
        let doc = parse(r#"<?xml version="1.1" encoding="ISO-8859-1" standalone="no"?><r/>"#);
        assert_eq!(doc.version(), "1.1");
        assert_eq!(doc.encoding(), Some("ISO-8859-1"));
        assert_eq!(doc.standalone(), Some(false));
    }

    #[test]
    fn test_xml_declaration_must_come_first() {
        assert!(Document::parse_str("  <?xml version=\"1.0\"?><r/>").is_err());
    }

    #[test]
    fn test_parse_comment_cdata_pi() {
        let doc = parse("<r><!--c--><![CDATA[<x>]]><?pi data?></r>");
        let r = doc.document_element().unwrap();
        let kinds: Vec<_> = doc.children(r).map(|c| doc.node_type(c)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeType::Comment,
                NodeType::CDataSection,
                NodeType::ProcessingInstruction
            ]
        );
        let cdata = doc.children(r).nth(1).unwrap();
        assert_eq!(doc.node_value(cdata), Some("<x>"));
    }

    #[test]
    fn test_parse_references_in_text() {
        let doc = parse("<r>&lt;&#65;&#x42;&amp;</r>");
        let r = doc.document_element().unwrap();
        assert_eq!(doc.text_content(r), "<AB&");
    }

    #[test]
    fn test_prolog_whitespace_is_dropped() {
        let doc = parse("<?xml version=\"1.0\"?>\n\n<!--c-->\n<r/>\n");
        let kinds: Vec<_> = doc
            .children(doc.root())
            .map(|c| doc.node_type(c))
            .collect();
        assert_eq!(kinds, vec![NodeType::Comment, NodeType::Element]);
    }

    #[test]
    fn test_parse_doctype_with_internal_entity() {
        let doc = parse(
            "<!DOCTYPE r SYSTEM \"r.dtd\" [<!ENTITY who \"world\"><!ENTITY % p \"x\">]><r>hello &who;</r>",
        );
        let doctype = doc.first_child(doc.root()).unwrap();
        match &doc.node(doctype).kind {
            NodeKind::DocumentType {
                name,
                system_id,
                internal_subset,
                ..
            } => {
                assert_eq!(name, "r");
                assert_eq!(system_id.as_deref(), Some("r.dtd"));
                assert!(internal_subset.as_deref().unwrap().contains("ENTITY who"));
            }
            other => panic!("expected doctype, got {other:?}"),
        }
        let r = doc.document_element().unwrap();
        assert_eq!(doc.text_content(r), "hello world");
    }

    #[test]
    fn test_parse_default_namespace_is_inherited() {
        let doc = parse(r#"<root xmlns="http://example.com"><child/></root>"#);
        let root = doc.document_element().unwrap();
        let child = doc.first_child(root).unwrap();
        assert_eq!(doc.namespace_uri(root), Some("http://example.com"));
        assert_eq!(doc.namespace_uri(child), Some("http://example.com"));
        assert_eq!(doc.namespace_declarations(root).len(), 1);
        assert!(doc.namespace_declarations(child).is_empty());
    }

    #[test]
    fn test_parse_prefixed_element_and_attribute() {
        let doc = parse(r#"<p:root xmlns:p="urn:p" p:a="1" xml:lang="en"/>"#);
        let root = doc.document_element().unwrap();
        assert_eq!(doc.local_name(root), Some("root"));
        assert_eq!(doc.prefix(root), Some("p"));
        assert_eq!(doc.node_name(root), "p:root");
        assert_eq!(doc.get_attribute_ns(root, "urn:p", "a"), Some("1"));
        assert_eq!(doc.get_attribute_ns(root, XML_NAMESPACE, "lang"), Some("en"));
        // Declarations are not attributes.
        assert_eq!(doc.attributes(root).count(), 2);
    }

    #[test]
    fn test_default_namespace_undeclaration() {
        let doc = parse(r#"<a xmlns="urn:a"><b xmlns=""/></a>"#);
        let a = doc.document_element().unwrap();
        let b = doc.first_child(a).unwrap();
        assert_eq!(doc.namespace_uri(b), None);
    }

    #[test]
    fn test_unbound_prefix() {
        assert!(Document::parse_str("<p:r/>").is_err());

        let opts = ParseOptions::default().recover(true);
        let doc = parse_str_with_options("<p:r/>", &opts).unwrap();
        let r = doc.document_element().unwrap();
        assert_eq!(doc.node_name(r), "p:r");
        assert_eq!(doc.namespace_uri(r), None);
        assert_eq!(doc.diagnostics.len(), 1);
    }

    #[test]
    fn test_duplicate_expanded_attribute_name() {
        let src = r#"<r xmlns:a="urn:x" xmlns:b="urn:x" a:k="1" b:k="2"/>"#;
        assert!(Document::parse_str(src).is_err());
    }

    #[test]
    fn test_duplicate_attribute() {
        assert!(Document::parse_str(r#"<r a="1" a="2"/>"#).is_err());
    }

    #[test]
    fn test_parse_error_mismatched_tags() {
        let err = Document::parse_str("<a></b>").unwrap_err();
        assert!(err.message.contains("mismatched end tag"));
    }

    #[test]
    fn test_parse_error_unexpected_eof() {
        assert!(Document::parse_str("<a>").is_err());
    }

    #[test]
    fn test_parse_error_no_root() {
        let err = Document::parse_str("").unwrap_err();
        assert_eq!(err.message, "missing root element");
    }

    #[test]
    fn test_content_after_document_element() {
        assert!(Document::parse_str("<a/><b/>").is_err());
    }

    #[test]
    fn test_no_blanks_strips_whitespace_text() {
        let opts = ParseOptions::default().no_blanks(true);
        let doc = parse_str_with_options("<a>\n  <b/>\n</a>", &opts).unwrap();
        let a = doc.document_element().unwrap();
        assert_eq!(doc.children(a).count(), 1);
    }

    #[test]
    fn test_max_attributes() {
        let opts = ParseOptions::default().max_attributes(1);
        assert!(parse_str_with_options(r#"<a x="1" y="2"/>"#, &opts).is_err());
    }

    #[test]
    fn test_base_url_is_recorded() {
        let opts = ParseOptions::default().base_url("file:///tmp/a.xml");
        let doc = parse_str_with_options("<a/>", &opts).unwrap();
        assert_eq!(doc.uri(), Some("file:///tmp/a.xml"));
    }
}
