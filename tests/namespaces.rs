//! Integration tests for namespace resolution, declaration reuse and the
//! declarations serialization adds for nodes bound outside their scope.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use xmldom::parser::{parse_str_with_options, ParseOptions};
use xmldom::{Document, Error};

const NS: &str = "http://example.com/ns";

fn rooted() -> Document {
    let mut doc = Document::with_version("1.0", Some("utf-8"));
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    doc
}

#[test]
fn test_generated_prefix_scenario() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    let child = doc.create_element_ns(NS, "child").unwrap();
    doc.append_child(root, child).unwrap();

    assert_eq!(
        doc.dump(true),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <root xmlns:ns0=\"http://example.com/ns\">\n  <ns0:child/>\n</root>\n"
    );
    assert_eq!(doc.namespace_uri(child), Some(NS));
    assert_eq!(doc.prefix(child), Some("ns0"));
    assert_eq!(doc.local_name(child), Some("child"));
}

#[test]
fn test_declaration_reused_across_creations() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    for name in ["a", "b", "p:c"] {
        let element = doc.create_element_ns(NS, name).unwrap();
        doc.append_child(root, element).unwrap();
    }
    let attr = doc.create_attribute_ns(NS, "k", "v").unwrap();
    let last = doc.last_child(root).unwrap();
    doc.set_attribute_node(last, attr).unwrap();

    assert_eq!(doc.namespace_declarations(root).len(), 1);
    let xml = doc.to_string_fragment(true);
    assert_eq!(xml.matches("http://example.com/ns").count(), 1);
    assert_eq!(
        xml,
        r#"<root xmlns:ns0="http://example.com/ns"><ns0:a/><ns0:b/><ns0:c ns0:k="v"/></root>"#
    );
}

#[test]
fn test_explicit_prefix_used_for_first_declaration() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    let item = doc.create_element_ns("urn:items", "it:item").unwrap();
    doc.append_child(root, item).unwrap();
    assert_eq!(
        doc.to_string_fragment(true),
        r#"<root xmlns:it="urn:items"><it:item/></root>"#
    );
}

#[test]
fn test_create_attribute_ns_needs_document_element() {
    let mut doc = Document::new();
    assert_eq!(
        doc.create_attribute_ns(NS, "a:k", "v").unwrap_err(),
        Error::MissingRoot
    );
    assert_eq!(doc.node_count(), 1);

    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    let attr = doc.create_attribute_ns(NS, "a:k", "v").unwrap();
    doc.set_attribute_node(root, attr).unwrap();
    assert_eq!(
        doc.to_string_fragment(true),
        r#"<root xmlns:a="http://example.com/ns" a:k="v"/>"#
    );
    assert_eq!(doc.get_attribute_ns(root, NS, "k"), Some("v"));
}

#[test]
fn test_element_ns_without_root_declares_on_itself() {
    let mut doc = Document::new();
    let element = doc.create_element_ns(NS, "doc").unwrap();
    doc.set_document_element(element).unwrap();
    assert_eq!(
        doc.to_string_fragment(true),
        r#"<ns0:doc xmlns:ns0="http://example.com/ns"/>"#
    );
}

#[test]
fn test_prefix_conflict_fails_without_mutation() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    doc.new_ns(root, "urn:one", Some("p")).unwrap();
    let before = doc.to_string_fragment(true);
    let nodes = doc.node_count();

    let err = doc.new_ns(root, "urn:two", Some("p")).unwrap_err();
    assert!(matches!(err, Error::NamespaceCreation { .. }));
    assert_eq!(doc.to_string_fragment(true), before);
    assert_eq!(doc.node_count(), nodes);
}

#[test]
fn test_reserved_bindings_rejected() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    for (uri, prefix) in [
        ("urn:x", Some("xmlns")),
        ("urn:x", Some("xml")),
        ("http://www.w3.org/2000/xmlns/", Some("q")),
        ("", Some("q")),
    ] {
        assert!(matches!(
            doc.new_ns(root, uri, prefix),
            Err(Error::NamespaceCreation { .. })
        ));
    }
    assert!(doc.namespace_declarations(root).is_empty());
}

#[test]
fn test_lookup_through_ancestors() {
    let doc = Document::parse_str(
        r#"<r xmlns="urn:d" xmlns:p="urn:p"><a xmlns:p="urn:inner"><b xmlns=""/></a></r>"#,
    )
    .unwrap();
    let b = doc.find_nodes("//b").unwrap()[0];
    assert_eq!(doc.lookup_namespace_uri(b, Some("p")), Some("urn:inner"));
    assert_eq!(doc.lookup_namespace_uri(b, None), None);
    assert_eq!(
        doc.lookup_namespace_uri(b, Some("xml")),
        Some("http://www.w3.org/XML/1998/namespace")
    );
    assert_eq!(doc.lookup_namespace_prefix(b, "urn:inner"), Some("p"));
    assert_eq!(doc.lookup_namespace_prefix(b, "urn:p"), None);
}

#[test]
fn test_detached_binding_is_declared_where_used() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    let holder = doc.create_element("holder").unwrap();
    let ns = doc.new_ns(holder, "urn:detached", Some("d")).unwrap();
    let item = doc.create_element("item").unwrap();
    doc.set_ns(item, Some(ns)).unwrap();
    doc.append_child(root, item).unwrap();

    let xml = doc.to_string_fragment(true);
    assert_eq!(xml, r#"<root><d:item xmlns:d="urn:detached"/></root>"#);

    let reparsed = Document::parse_str(&xml).unwrap();
    let item = reparsed.find_nodes("*").unwrap()[0];
    assert_eq!(reparsed.namespace_uri(item), Some("urn:detached"));
}

#[test]
fn test_moved_subtree_reparses_with_same_names() {
    let mut doc = Document::parse_str(
        r#"<r><src xmlns:a="urn:a" xmlns="urn:d"><a:x><y a:k="1"/></a:x></src><dst/></r>"#,
    )
    .unwrap();
    let r = doc.document_element().unwrap();
    let src = doc.first_child(r).unwrap();
    let x = doc.first_child(src).unwrap();
    let dst = doc.last_child(r).unwrap();
    doc.append_child(dst, x).unwrap();

    let xml = doc.to_string_fragment(true);
    assert!(xml.ends_with(
        r#"<dst><a:x xmlns:a="urn:a"><y xmlns="urn:d" a:k="1"/></a:x></dst></r>"#
    ));
    let reparsed = Document::parse_str(&xml).unwrap();
    let x = reparsed.find_nodes("dst/*").unwrap()[0];
    let y = reparsed.first_child(x).unwrap();
    assert_eq!(reparsed.namespace_uri(x), Some("urn:a"));
    assert_eq!(reparsed.namespace_uri(y), Some("urn:d"));
    assert_eq!(reparsed.get_attribute_ns(y, "urn:a", "k"), Some("1"));
}

#[test]
fn test_node_to_string_is_self_contained() {
    let doc = Document::parse_str(
        r#"<r xmlns:a="urn:a" xmlns:b="urn:b"><a:x b:k="v"><a:y/></a:x></r>"#,
    )
    .unwrap();
    let x = doc.find_nodes("*").unwrap()[0];
    let xml = doc.node_to_string(x);
    assert_eq!(xml, r#"<a:x xmlns:a="urn:a" xmlns:b="urn:b" b:k="v"><a:y/></a:x>"#);
    assert!(Document::parse_str(&xml).is_ok());
}

#[test]
fn test_unbound_prefix_reparses_only_when_recovering() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    let item = doc.create_element("a:item").unwrap();
    doc.append_child(root, item).unwrap();
    let xml = doc.to_string_fragment(true);
    assert_eq!(xml, "<root><a:item/></root>");

    assert!(Document::parse_str(&xml).is_err());
    let opts = ParseOptions::default().recover(true);
    let recovered = parse_str_with_options(&xml, &opts).unwrap();
    assert_eq!(recovered.diagnostics.len(), 1);
    assert_eq!(
        recovered.to_string_c14n(false).unwrap(),
        doc.to_string_c14n(false).unwrap()
    );
}

#[test]
fn test_xml_lang_set_without_namespace_call_roundtrips() {
    let mut doc = rooted();
    let root = doc.document_element().unwrap();
    doc.set_attribute(root, "z", "1").unwrap();
    doc.set_attribute(root, "xml:lang", "en").unwrap();

    let xml = doc.to_string_fragment(true);
    assert_eq!(xml, r#"<root z="1" xml:lang="en"/>"#);
    let reparsed = Document::parse_str(&xml).unwrap();
    assert_eq!(
        reparsed.to_string_c14n(false).unwrap(),
        doc.to_string_c14n(false).unwrap()
    );
}
