//! Integration tests for XML output and canonicalization.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use xmldom::parser::{parse_bytes, parse_str_with_options, ParseOptions};
use xmldom::serial::c14n::{canonicalize, canonicalize_subtree, C14nOptions};
use xmldom::serial::{serialize, serialize_with_options, SerializeOptions};
use xmldom::{Document, Error};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE feed [
  <!ENTITY author "John Doe">
]>
<!-- generated -->
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <title type="text">Example &amp; Feed</title>
  <entry xml:lang="en">
    <dc:creator>&author;</dc:creator>
    <summary><![CDATA[<b>bold</b>]]></summary>
  </entry>
</feed>
"#;

/// Canonical form is stable under a dump and reparse.
fn assert_c14n_roundtrip(doc: &Document) {
    let dumped = doc.dump(false);
    let reparsed = Document::parse_str(&dumped)
        .unwrap_or_else(|e| panic!("reparse failed: {e}\n{dumped}"));
    for exclusive in [false, true] {
        assert_eq!(
            reparsed.to_string_c14n(exclusive).unwrap(),
            doc.to_string_c14n(exclusive).unwrap()
        );
    }
}

#[test]
fn test_c14n_roundtrip_parsed_document() {
    let doc = Document::parse_str(FEED).unwrap();
    assert_c14n_roundtrip(&doc);
}

#[test]
fn test_c14n_roundtrip_built_document() {
    let mut doc = Document::with_version("1.0", Some("utf-8"));
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    let child = doc
        .create_element_ns("http://example.com/ns", "child")
        .unwrap();
    doc.append_child(root, child).unwrap();
    let attr = doc
        .create_attribute_ns("urn:meta", "m:id", "c1 \"quoted\"\n")
        .unwrap();
    doc.set_attribute_node(child, attr).unwrap();
    doc.append_text(child, "text\r\nwith <markup> & \u{00FC}nicode").unwrap();

    let holder = doc.create_element("holder").unwrap();
    let detached = doc.new_ns(holder, "urn:detached", Some("m")).unwrap();
    let stray = doc.create_element("stray").unwrap();
    doc.set_ns(stray, Some(detached)).unwrap();
    doc.append_child(child, stray).unwrap();

    assert_c14n_roundtrip(&doc);
}

#[test]
fn test_fragment_never_contains_doctype() {
    let doc = Document::parse_str(FEED).unwrap();
    let fragment = doc.to_string_fragment(true);
    assert!(!fragment.contains("DOCTYPE"));
    assert!(!fragment.contains("ENTITY"));
    assert!(fragment.starts_with("<!-- generated --><feed"));

    let with_declaration = doc.to_string_fragment(false);
    assert!(with_declaration.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(!with_declaration.contains("DOCTYPE"));

    // The full dump keeps it.
    assert!(doc.dump(false).contains("<!DOCTYPE feed ["));
}

#[test]
fn test_entities_are_expanded_in_output() {
    let doc = Document::parse_str(FEED).unwrap();
    let xml = doc.to_string_fragment(true);
    assert!(xml.contains("<dc:creator>John Doe</dc:creator>"));
    assert!(xml.contains("<title type=\"text\">Example &amp; Feed</title>"));
    assert!(xml.contains("<summary><![CDATA[<b>bold</b>]]></summary>"));
}

#[test]
fn test_pretty_print_reparses_to_same_structure() {
    let opts = ParseOptions::default().no_blanks(true);
    let doc = parse_str_with_options(FEED, &opts).unwrap();
    let pretty = doc.dump(true);
    assert!(pretty.contains("\n  <title type=\"text\">"));
    assert!(pretty.contains("\n    <dc:creator>John Doe</dc:creator>\n"));

    let reparsed = parse_str_with_options(&pretty, &opts).unwrap();
    assert_eq!(
        reparsed.to_string_c14n(false).unwrap(),
        doc.to_string_c14n(false).unwrap()
    );
}

#[test]
fn test_serialize_free_functions() {
    let doc = Document::parse_str("<a><b/></a>").unwrap();
    assert_eq!(serialize(&doc), doc.dump(false));
    let options = SerializeOptions::default()
        .declaration(false)
        .indent(true)
        .indent_str("    ");
    assert_eq!(serialize_with_options(&doc, &options), "<a>\n    <b/>\n</a>\n");
}

#[test]
fn test_c14n_subtree_modes() {
    let doc = Document::parse_str(FEED).unwrap();
    let entry = doc
        .find_nodes("//*[local-name() = 'entry']")
        .unwrap()[0];

    let inclusive = canonicalize_subtree(&doc, entry, &C14nOptions::default());
    assert!(inclusive.starts_with(
        "<entry xmlns=\"http://www.w3.org/2005/Atom\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xml:lang=\"en\">"
    ));

    let exclusive = canonicalize_subtree(&doc, entry, &C14nOptions::default().exclusive(true));
    assert!(exclusive.starts_with("<entry xmlns=\"http://www.w3.org/2005/Atom\" xml:lang=\"en\">"));
    assert!(exclusive.contains("<dc:creator xmlns:dc=\"http://purl.org/dc/elements/1.1/\">"));
}

#[test]
fn test_canonicalize_whole_document() {
    let doc = Document::parse_str(FEED).unwrap();
    let with_comments = canonicalize(&doc, &C14nOptions::default());
    assert!(with_comments.starts_with("<!-- generated -->\n<feed"));
    let without = canonicalize(&doc, &C14nOptions::default().with_comments(false));
    assert!(without.starts_with("<feed"));
    assert!(without.contains("<summary>&lt;b&gt;bold&lt;/b&gt;</summary>"));
}

#[test]
fn test_c14n_requires_document_element() {
    let doc = Document::new();
    assert_eq!(doc.to_string_c14n(false).unwrap_err(), Error::NodeNotFound);
    assert_eq!(canonicalize(&doc, &C14nOptions::default()), "");
}

#[test]
fn test_latin1_declaration_roundtrips_through_bytes() {
    let mut doc = Document::with_version("1.0", Some("ISO-8859-1"));
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    doc.append_text(root, "caf\u{00E9}").unwrap();
    doc.set_attribute(root, "city", "Z\u{00FC}rich \u{20AC}").unwrap();
    let note = doc.create_cdata_section("na\u{00EF}ve").unwrap();
    doc.append_child(root, note).unwrap();

    let dumped = doc.dump(false);
    assert!(dumped.is_ascii(), "{dumped}");
    let reparsed = parse_bytes(dumped.as_bytes()).unwrap();
    assert_eq!(reparsed.encoding(), Some("ISO-8859-1"));
    assert_eq!(
        reparsed.to_string_c14n(false).unwrap(),
        doc.to_string_c14n(false).unwrap()
    );
}

#[test]
fn test_utf8_declaration_keeps_characters() {
    let mut doc = Document::with_version("1.0", Some("UTF-8"));
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    doc.append_text(root, "caf\u{00E9}").unwrap();

    let dumped = doc.dump(false);
    assert!(dumped.contains("<root>caf\u{00E9}</root>"));
    let reparsed = parse_bytes(dumped.as_bytes()).unwrap();
    assert_eq!(
        reparsed.to_string_c14n(true).unwrap(),
        doc.to_string_c14n(true).unwrap()
    );
}

#[test]
fn test_unwritable_content_is_refused() {
    let mut doc = Document::with_version("1.0", Some("utf-8"));
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    let before = doc.dump(false);
    let nodes = doc.node_count();

    let refused = [
        doc.create_processing_instruction("t", Some("x?>y")).map(drop),
        doc.create_comment_node("a--b").map(drop),
        doc.create_comment_node("trailing-").map(drop),
        doc.append_text(root, "a\u{1}b").map(drop),
        doc.create_cdata_section("\u{FFFF}").map(drop),
        doc.set_attribute(root, "k", "bell\u{7}").map(drop),
    ];
    for result in refused {
        assert!(matches!(result, Err(Error::InvalidContent { .. })), "{result:?}");
    }
    assert_eq!(doc.dump(false), before);
    assert_eq!(doc.node_count(), nodes);
}

#[test]
fn test_set_node_value_keeps_output_reparseable() {
    let mut doc = Document::with_version("1.0", Some("utf-8"));
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    let pi = doc.create_processing_instruction("t", Some("x")).unwrap();
    let comment = doc.create_comment_node("c").unwrap();
    doc.append_child(root, pi).unwrap();
    doc.append_child(root, comment).unwrap();
    let text = doc.append_text(root, "t").unwrap();

    assert!(matches!(
        doc.set_node_value(pi, "x?>y"),
        Err(Error::InvalidContent { .. })
    ));
    assert!(matches!(
        doc.set_node_value(comment, "a--b"),
        Err(Error::InvalidContent { .. })
    ));
    assert!(matches!(
        doc.set_node_value(text, "a\u{1}b"),
        Err(Error::InvalidContent { .. })
    ));
    assert_eq!(doc.node_value(pi), Some("x"));

    doc.set_node_value(pi, "x? >y").unwrap();
    doc.set_node_value(comment, "a - b").unwrap();
    doc.set_node_value(text, "a\tb").unwrap();
    assert_c14n_roundtrip(&doc);
}
