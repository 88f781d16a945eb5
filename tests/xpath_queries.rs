//! Integration tests for `XPath` queries over parsed and built documents.

#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use pretty_assertions::assert_eq;
use xmldom::parser::parse_str;
use xmldom::xpath::{evaluate, parser, XPathContext, XPathError, XPathValue};
use xmldom::{Document, Error, Node};

const LIBRARY: &str = r#"<library xmlns:m="urn:meta">
  <book id="b1" year="1999"><title>Alpha</title><price>10</price></book>
  <book id="b2" year="2005"><title>Beta</title><price>25.5</price><m:tag>new</m:tag></book>
  <book id="b3" year="2012"><title>Gamma</title><price>7</price></book>
  <!-- shelf end -->
</library>"#;

fn titles(doc: &Document, nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|&n| doc.text_content(n)).collect()
}

#[test]
fn test_find_nodes_relative_to_document_element() {
    let doc = parse_str(LIBRARY).unwrap();
    let found = doc.find_nodes("book[price > 8]/title").unwrap();
    assert_eq!(titles(&doc, &found), ["Alpha", "Beta"]);

    let found = doc.find_nodes("//book[@year >= 2005][last()]/title").unwrap();
    assert_eq!(titles(&doc, &found), ["Gamma"]);
}

#[test]
fn test_find_nodes_returns_document_order() {
    let doc = parse_str(LIBRARY).unwrap();
    let found = doc.find_nodes("book[3]/title | book[1]/title").unwrap();
    assert_eq!(titles(&doc, &found), ["Alpha", "Gamma"]);
}

#[test]
fn test_find_nodes_wraps_each_kind() {
    let doc = parse_str(LIBRARY).unwrap();
    let found = doc
        .find_nodes("book[1]/@id | book[1]/title/text() | comment()")
        .unwrap();
    assert!(matches!(found[0], Node::Attribute(_)));
    assert!(matches!(found[1], Node::Text(_)));
    assert!(matches!(found[2], Node::Comment(_)));
    assert_eq!(doc.node_value(found[0]), Some("b1"));
}

#[test]
fn test_prefixed_name_tests_use_document_bindings() {
    let doc = parse_str(LIBRARY).unwrap();
    let found = doc.find_nodes("book/m:tag").unwrap();
    assert_eq!(titles(&doc, &found), ["new"]);

    let err = doc.find_nodes("book/x:tag").unwrap_err();
    assert_eq!(
        err,
        Error::XPath(XPathError::UnboundPrefix {
            prefix: "x".to_string()
        })
    );
}

#[test]
fn test_registered_prefix_selects_default_namespace() {
    let doc = parse_str(r#"<feed xmlns="urn:atom"><entry/><entry/></feed>"#).unwrap();
    assert!(doc.find_nodes("entry").unwrap().is_empty());

    let root = doc.document_element().unwrap();
    let expr = parser::parse("count(a:entry)").unwrap();
    let mut ctx = XPathContext::new(&doc, root);
    ctx.register_namespace("a", "urn:atom");
    assert_eq!(ctx.evaluate(&expr).unwrap(), XPathValue::Number(2.0));
}

#[test]
fn test_find_nodes_from_other_context() {
    let doc = parse_str(LIBRARY).unwrap();
    let second = doc.find_nodes("book[2]").unwrap()[0];
    let found = doc.find_nodes_from(second, "following-sibling::book/title").unwrap();
    assert_eq!(titles(&doc, &found), ["Gamma"]);
    let found = doc.find_nodes_from(second, "preceding::title").unwrap();
    assert_eq!(titles(&doc, &found), ["Alpha"]);
}

#[test]
fn test_scalar_evaluation() {
    let doc = parse_str(LIBRARY).unwrap();
    let root = doc.document_element().unwrap();
    assert_eq!(
        evaluate(&doc, root, "sum(book/price)").unwrap(),
        XPathValue::Number(42.5)
    );
    assert_eq!(
        evaluate(&doc, root, "concat(book[2]/title, '-', string(count(book)))").unwrap(),
        XPathValue::String("Beta-3".to_string())
    );
    assert_eq!(
        evaluate(&doc, root, "boolean(book[@id = 'b4'])").unwrap(),
        XPathValue::Boolean(false)
    );
}

#[test]
fn test_queries_see_api_built_nodes() {
    let mut doc = Document::new();
    let root = doc.create_element("root").unwrap();
    doc.set_document_element(root).unwrap();
    let child = doc
        .create_element_ns("http://example.com/ns", "child")
        .unwrap();
    doc.append_child(root, child).unwrap();
    doc.set_attribute(child, "n", "1").unwrap();

    let found = doc.find_nodes("ns0:child[@n = 1]").unwrap();
    assert_eq!(found, [Node::Element(child)]);
}

#[test]
fn test_query_errors() {
    let doc = parse_str(LIBRARY).unwrap();
    assert!(matches!(
        doc.find_nodes("book[").unwrap_err(),
        Error::XPath(XPathError::InvalidExpression { .. })
    ));
    assert!(matches!(
        doc.find_nodes("count(book)").unwrap_err(),
        Error::XPath(XPathError::TypeError { .. })
    ));
    assert!(matches!(
        doc.find_nodes("nosuch()").unwrap_err(),
        Error::XPath(XPathError::UndefinedFunction { .. })
    ));
    assert_eq!(Document::new().find_nodes("*").unwrap_err(), Error::NodeNotFound);
}
