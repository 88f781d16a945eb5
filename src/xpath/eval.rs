//! `XPath` 1.0 expression evaluator.
//!
//! Walks an [`Expr`] (produced by [`super::parser::parse`]) against a
//! [`Document`] and produces an [`XPathValue`].
//!
//! # Data model
//!
//! Attributes are full nodes on the `attribute` axis: `@id` yields the
//! attribute node, whose string-value is its value. The `namespace` axis is
//! always empty. Node-sets are kept in document order, with an element's
//! attributes ordered after the element and before its children.
//!
//! # Evaluation context
//!
//! Per `XPath` 1.0 section 1, every expression is evaluated with respect to a
//! context node, a context position and size, variable bindings and
//! namespace declarations. [`XPathContext`] holds the bindings; position
//! and size travel with each sub-evaluation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::iter;

use tracing::debug;

use super::ast::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};
use super::types::{parse_number, XPathError, XPathValue};
use crate::tree::{AsNode, Document, NodeId, NodeKind};
use crate::util::qname::XML_NAMESPACE;

/// Evaluation context for `XPath` 1.0 expressions.
///
/// # Examples
///
/// ```
/// use xmldom::xpath::{parser::parse, XPathContext, XPathValue};
/// use xmldom::Document;
///
/// let doc = Document::parse_str("<root><a/><b/></root>").unwrap();
/// let root = doc.document_element().unwrap();
/// let ctx = XPathContext::new(&doc, root);
/// let count = ctx.evaluate(&parse("count(*)").unwrap()).unwrap();
/// assert_eq!(count, XPathValue::Number(2.0));
/// ```
pub struct XPathContext<'a> {
    doc: &'a Document,
    node: NodeId,
    variables: HashMap<String, XPathValue>,
    namespaces: HashMap<String, String>,
    /// Document-order positions, filled one tree at a time on demand.
    order: RefCell<HashMap<NodeId, usize>>,
}

/// The context node, position and size of one sub-evaluation.
#[derive(Clone, Copy)]
struct Focus {
    node: NodeId,
    position: usize,
    size: usize,
}

impl<'a> XPathContext<'a> {
    /// Creates a context whose context node is `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `doc`.
    #[must_use]
    pub fn new(doc: &'a Document, node: impl AsNode) -> Self {
        let node = node.node_id();
        let _ = doc.node(node);
        Self {
            doc,
            node,
            variables: HashMap::new(),
            namespaces: HashMap::new(),
            order: RefCell::new(HashMap::new()),
        }
    }

    /// Binds `$name` to a value.
    pub fn set_variable(&mut self, name: &str, value: XPathValue) {
        self.variables.insert(name.to_string(), value);
    }

    /// Binds a prefix for use in name tests. Registered prefixes take
    /// precedence over declarations in scope at the context node.
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.insert(prefix.to_string(), uri.to_string());
    }

    /// Evaluates a compiled expression.
    ///
    /// # Errors
    ///
    /// Returns an [`XPathError`] for type errors, unbound variables or
    /// prefixes, and unknown functions or wrong argument counts.
    pub fn evaluate(&self, expr: &Expr) -> Result<XPathValue, XPathError> {
        let focus = Focus {
            node: self.node,
            position: 1,
            size: 1,
        };
        let value = self.eval(expr, focus)?;
        match &value {
            XPathValue::NodeSet(nodes) => debug!(count = nodes.len(), "xpath node-set result"),
            other => debug!(kind = other.type_name(), "xpath scalar result"),
        }
        Ok(value)
    }

    // --- Expressions ---

    fn eval(&self, expr: &Expr, focus: Focus) -> Result<XPathValue, XPathError> {
        match expr {
            Expr::Number(n) => Ok(XPathValue::Number(*n)),
            Expr::Literal(s) => Ok(XPathValue::String(s.clone())),
            Expr::Variable(name) => {
                self.variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| XPathError::UndefinedVariable {
                        name: name.clone(),
                    })
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, focus),
            Expr::Negate(inner) => {
                let value = self.eval(inner, focus)?;
                Ok(XPathValue::Number(-self.number(&value)))
            }
            Expr::Call { name, args } => self.call(name, args, focus),
            Expr::Path(path) => self.eval_location_path(path, focus),
            Expr::Filter {
                primary,
                predicates,
            } => {
                let mut nodes = self.node_set(primary, focus)?;
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::PathFrom { start, steps } => {
                let nodes = self.node_set(start, focus)?;
                self.apply_steps(nodes, steps).map(XPathValue::NodeSet)
            }
            Expr::Union(lhs, rhs) => {
                let mut nodes = self.node_set(lhs, focus)?;
                nodes.extend(self.node_set(rhs, focus)?);
                self.sort_document_order(&mut nodes);
                Ok(XPathValue::NodeSet(nodes))
            }
        }
    }

    /// Evaluates an expression that must produce a node-set.
    fn node_set(&self, expr: &Expr, focus: Focus) -> Result<Vec<NodeId>, XPathError> {
        match self.eval(expr, focus)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::type_error("node-set", &other)),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        focus: Focus,
    ) -> Result<XPathValue, XPathError> {
        match op {
            BinaryOp::Or => {
                let value = self.eval(lhs, focus)?.to_boolean() || self.eval(rhs, focus)?.to_boolean();
                Ok(XPathValue::Boolean(value))
            }
            BinaryOp::And => {
                let value = self.eval(lhs, focus)?.to_boolean() && self.eval(rhs, focus)?.to_boolean();
                Ok(XPathValue::Boolean(value))
            }
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                let lv = self.eval(lhs, focus)?;
                let rv = self.eval(rhs, focus)?;
                Ok(XPathValue::Boolean(self.compare(op, &lv, &rv)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let ln = self.number(&self.eval(lhs, focus)?);
                let rn = self.number(&self.eval(rhs, focus)?);
                let result = match op {
                    BinaryOp::Add => ln + rn,
                    BinaryOp::Sub => ln - rn,
                    BinaryOp::Mul => ln * rn,
                    BinaryOp::Div => ln / rn,
                    _ => ln % rn,
                };
                Ok(XPathValue::Number(result))
            }
        }
    }

    // --- Location paths ---

    fn eval_location_path(
        &self,
        path: &LocationPath,
        focus: Focus,
    ) -> Result<XPathValue, XPathError> {
        let start = if path.absolute {
            self.tree_root(focus.node)
        } else {
            focus.node
        };
        self.apply_steps(vec![start], &path.steps)
            .map(XPathValue::NodeSet)
    }

    /// The root of the tree containing `node`: the document node, or the top
    /// of a detached subtree.
    fn tree_root(&self, node: NodeId) -> NodeId {
        self.doc.ancestors(node).last().unwrap_or(node)
    }

    fn apply_steps(&self, mut nodes: Vec<NodeId>, steps: &[Step]) -> Result<Vec<NodeId>, XPathError> {
        for step in steps {
            nodes = self.apply_step(&nodes, step)?;
        }
        Ok(nodes)
    }

    /// Applies one step to every node of `input`. Predicates see proximity
    /// positions along the axis; the combined result is in document order.
    fn apply_step(&self, input: &[NodeId], step: &Step) -> Result<Vec<NodeId>, XPathError> {
        let uri = self.test_namespace(&step.test)?;
        let mut result = Vec::new();
        for &node in input {
            let mut selected: Vec<NodeId> = self
                .axis_nodes(node, step.axis)
                .into_iter()
                .filter(|&n| self.matches(n, &step.test, step.axis, uri.as_deref()))
                .collect();
            for predicate in &step.predicates {
                selected = self.filter(selected, predicate)?;
            }
            result.extend(selected);
        }
        self.sort_document_order(&mut result);
        Ok(result)
    }

    /// Keeps the nodes for which `predicate` holds. A numeric predicate
    /// selects by position.
    fn filter(&self, nodes: Vec<NodeId>, predicate: &Expr) -> Result<Vec<NodeId>, XPathError> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let focus = Focus {
                node,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, focus)? {
                #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Returns the nodes on `axis` from `node`, in proximity order: document
    /// order for forward axes, reverse document order for reverse axes.
    fn axis_nodes(&self, node: NodeId, axis: Axis) -> Vec<NodeId> {
        let doc = self.doc;
        match axis {
            Axis::SelfAxis => vec![node],
            Axis::Child => doc.children(node).collect(),
            Axis::Descendant => doc.descendants(node).collect(),
            Axis::DescendantOrSelf => iter::once(node).chain(doc.descendants(node)).collect(),
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(node).skip(1).collect(),
            Axis::AncestorOrSelf => doc.ancestors(node).collect(),
            Axis::Attribute => doc.attributes(node).map(|a| a.id()).collect(),
            Axis::Namespace => Vec::new(),
            Axis::FollowingSibling => {
                iter::successors(doc.next_sibling(node), |&n| doc.next_sibling(n)).collect()
            }
            Axis::PrecedingSibling => {
                iter::successors(doc.prev_sibling(node), |&n| doc.prev_sibling(n)).collect()
            }
            Axis::Following => {
                let mut result = Vec::new();
                let mut anchor = node;
                if self.is_attribute(node) {
                    if let Some(owner) = doc.parent(node) {
                        result.extend(doc.descendants(owner));
                        anchor = owner;
                    }
                }
                for ancestor in doc.ancestors(anchor) {
                    for sibling in iter::successors(doc.next_sibling(ancestor), |&n| doc.next_sibling(n)) {
                        result.push(sibling);
                        result.extend(doc.descendants(sibling));
                    }
                }
                result
            }
            Axis::Preceding => {
                let mut result = Vec::new();
                let anchor = if self.is_attribute(node) {
                    doc.parent(node).unwrap_or(node)
                } else {
                    node
                };
                for ancestor in doc.ancestors(anchor) {
                    for sibling in iter::successors(doc.prev_sibling(ancestor), |&n| doc.prev_sibling(n)) {
                        let subtree: Vec<NodeId> =
                            iter::once(sibling).chain(doc.descendants(sibling)).collect();
                        result.extend(subtree.into_iter().rev());
                    }
                }
                result
            }
        }
    }

    fn is_attribute(&self, node: NodeId) -> bool {
        matches!(self.doc.node(node).kind, NodeKind::Attribute { .. })
    }

    /// Resolves the prefix of a name test to a namespace URI.
    fn test_namespace(&self, test: &NodeTest) -> Result<Option<String>, XPathError> {
        let prefix = match test {
            NodeTest::AnyLocalName(prefix) => prefix,
            NodeTest::Name {
                prefix: Some(prefix),
                ..
            } => prefix,
            _ => return Ok(None),
        };
        self.resolve_prefix(prefix).map(Some)
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String, XPathError> {
        if let Some(uri) = self.namespaces.get(prefix) {
            return Ok(uri.clone());
        }
        self.doc
            .lookup_namespace_uri(self.node, Some(prefix))
            .map(str::to_string)
            .ok_or_else(|| XPathError::UnboundPrefix {
                prefix: prefix.to_string(),
            })
    }

    fn matches(&self, node: NodeId, test: &NodeTest, axis: Axis, uri: Option<&str>) -> bool {
        let kind = &self.doc.node(node).kind;
        let principal = if axis == Axis::Attribute {
            matches!(kind, NodeKind::Attribute { .. })
        } else {
            matches!(kind, NodeKind::Element { .. })
        };
        let node_uri = self.doc.namespace_uri(node).filter(|u| !u.is_empty());
        match test {
            NodeTest::AnyName => principal,
            NodeTest::AnyLocalName(_) => principal && node_uri == uri,
            NodeTest::Name { local, .. } => {
                principal && self.doc.local_name(node) == Some(local.as_str()) && node_uri == uri
            }
            NodeTest::Node => true,
            NodeTest::Text => matches!(kind, NodeKind::Text { .. } | NodeKind::CData { .. }),
            NodeTest::Comment => matches!(kind, NodeKind::Comment { .. }),
            NodeTest::ProcessingInstruction(target) => match kind {
                NodeKind::ProcessingInstruction { target: t, .. } => {
                    target.as_ref().map_or(true, |target| target == t)
                }
                _ => false,
            },
        }
    }

    // --- Document order ---

    /// Sorts nodes into document order and drops duplicates.
    fn sort_document_order(&self, nodes: &mut Vec<NodeId>) {
        if nodes.len() < 2 {
            return;
        }
        nodes.sort_by_cached_key(|&n| self.order_of(n));
        nodes.dedup();
    }

    fn order_of(&self, node: NodeId) -> usize {
        if let Some(&position) = self.order.borrow().get(&node) {
            return position;
        }
        self.index_tree(self.tree_root(node));
        self.order.borrow().get(&node).copied().unwrap_or(usize::MAX)
    }

    /// Numbers every node of the tree under `root` in document order,
    /// continuing after trees indexed earlier.
    fn index_tree(&self, root: NodeId) {
        let mut order = self.order.borrow_mut();
        let mut next = order.len();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.insert(id, next);
            next += 1;
            for attr in self.doc.attributes(id) {
                order.insert(attr.id(), next);
                next += 1;
            }
            let start = stack.len();
            stack.extend(self.doc.children(id));
            stack[start..].reverse();
        }
    }

    // --- Conversions ---

    /// The string-value of a node per `XPath` 1.0 section 5.
    fn string_value(&self, node: NodeId) -> String {
        match &self.doc.node(node).kind {
            NodeKind::Document | NodeKind::Element { .. } => self.doc.text_content(node),
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Text { content } | NodeKind::CData { content } | NodeKind::Comment { content } => {
                content.clone()
            }
            NodeKind::ProcessingInstruction { data, .. } => data.clone().unwrap_or_default(),
            NodeKind::DocumentType { .. } => String::new(),
        }
    }

    fn string(&self, value: &XPathValue) -> String {
        match value {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map_or_else(String::new, |&n| self.string_value(n)),
            other => other.to_xpath_string(),
        }
    }

    fn number(&self, value: &XPathValue) -> f64 {
        match value {
            XPathValue::NodeSet(_) => parse_number(&self.string(value)),
            other => other.to_number(),
        }
    }

    /// Compares two values per `XPath` 1.0 section 3.4.
    #[allow(clippy::float_cmp)]
    fn compare(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        use XPathValue::{Boolean, NodeSet, Number, String as Str};

        let numbers = |a: f64, b: f64| match op {
            BinaryOp::Eq => a == b,
            BinaryOp::Neq => a != b,
            BinaryOp::Lt => a < b,
            BinaryOp::Lte => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
        let equality = matches!(op, BinaryOp::Eq | BinaryOp::Neq);

        match (lhs, rhs) {
            (NodeSet(ls), NodeSet(rs)) => {
                let right: Vec<String> = rs.iter().map(|&n| self.string_value(n)).collect();
                ls.iter().any(|&l| {
                    let left = self.string_value(l);
                    right.iter().any(|r| {
                        if equality {
                            (left == *r) == (op == BinaryOp::Eq)
                        } else {
                            numbers(parse_number(&left), parse_number(r))
                        }
                    })
                })
            }
            (NodeSet(_), Boolean(b)) => numbers_or_bools(op, lhs.to_boolean(), *b),
            (Boolean(b), NodeSet(_)) => numbers_or_bools(op, *b, rhs.to_boolean()),
            (NodeSet(ns), Number(n)) => ns
                .iter()
                .any(|&node| numbers(parse_number(&self.string_value(node)), *n)),
            (Number(n), NodeSet(ns)) => ns
                .iter()
                .any(|&node| numbers(*n, parse_number(&self.string_value(node)))),
            (NodeSet(ns), Str(s)) => ns.iter().any(|&node| {
                let value = self.string_value(node);
                if equality {
                    (value == *s) == (op == BinaryOp::Eq)
                } else {
                    numbers(parse_number(&value), parse_number(s))
                }
            }),
            (Str(s), NodeSet(ns)) => ns.iter().any(|&node| {
                let value = self.string_value(node);
                if equality {
                    (*s == value) == (op == BinaryOp::Eq)
                } else {
                    numbers(parse_number(s), parse_number(&value))
                }
            }),
            _ if equality && (matches!(lhs, Boolean(_)) || matches!(rhs, Boolean(_))) => {
                numbers_or_bools(op, lhs.to_boolean(), rhs.to_boolean())
            }
            _ if equality && !matches!(lhs, Number(_)) && !matches!(rhs, Number(_)) => {
                (lhs.to_xpath_string() == rhs.to_xpath_string()) == (op == BinaryOp::Eq)
            }
            _ => numbers(lhs.to_number(), rhs.to_number()),
        }
    }

    // --- Core function library ---

    fn call(&self, name: &str, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        match name {
            // Node-set functions
            "last" => {
                check_args(name, args, 0, Some(0))?;
                Ok(XPathValue::Number(to_f64(focus.size)))
            }
            "position" => {
                check_args(name, args, 0, Some(0))?;
                Ok(XPathValue::Number(to_f64(focus.position)))
            }
            "count" => {
                check_args(name, args, 1, Some(1))?;
                let nodes = self.node_set(&args[0], focus)?;
                Ok(XPathValue::Number(to_f64(nodes.len())))
            }
            "id" => self.fn_id(args, focus),
            "local-name" | "namespace-uri" | "name" => self.fn_name(name, args, focus),

            // String functions
            "string" => {
                check_args(name, args, 0, Some(1))?;
                Ok(XPathValue::String(self.string_arg(args.first(), focus)?))
            }
            "concat" => {
                check_args(name, args, 2, None)?;
                let mut result = String::new();
                for arg in args {
                    result.push_str(&self.string(&self.eval(arg, focus)?));
                }
                Ok(XPathValue::String(result))
            }
            "starts-with" | "contains" | "substring-before" | "substring-after" => {
                check_args(name, args, 2, Some(2))?;
                let s = self.string(&self.eval(&args[0], focus)?);
                let pattern = self.string(&self.eval(&args[1], focus)?);
                Ok(match name {
                    "starts-with" => XPathValue::Boolean(s.starts_with(&pattern)),
                    "contains" => XPathValue::Boolean(s.contains(&pattern)),
                    "substring-before" => XPathValue::String(
                        s.find(&pattern)
                            .map_or_else(String::new, |i| s[..i].to_string()),
                    ),
                    _ => XPathValue::String(
                        s.find(&pattern)
                            .map_or_else(String::new, |i| s[i + pattern.len()..].to_string()),
                    ),
                })
            }
            "substring" => self.fn_substring(args, focus),
            "string-length" => {
                check_args(name, args, 0, Some(1))?;
                let s = self.string_arg(args.first(), focus)?;
                Ok(XPathValue::Number(to_f64(s.chars().count())))
            }
            "normalize-space" => {
                check_args(name, args, 0, Some(1))?;
                let s = self.string_arg(args.first(), focus)?;
                let words: Vec<&str> = s.split([' ', '\t', '\r', '\n']).filter(|w| !w.is_empty()).collect();
                Ok(XPathValue::String(words.join(" ")))
            }
            "translate" => {
                check_args(name, args, 3, Some(3))?;
                let s = self.string(&self.eval(&args[0], focus)?);
                let from: Vec<char> = self.string(&self.eval(&args[1], focus)?).chars().collect();
                let to: Vec<char> = self.string(&self.eval(&args[2], focus)?).chars().collect();
                let translated = s
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect();
                Ok(XPathValue::String(translated))
            }

            // Boolean functions
            "boolean" => {
                check_args(name, args, 1, Some(1))?;
                Ok(XPathValue::Boolean(self.eval(&args[0], focus)?.to_boolean()))
            }
            "not" => {
                check_args(name, args, 1, Some(1))?;
                Ok(XPathValue::Boolean(!self.eval(&args[0], focus)?.to_boolean()))
            }
            "true" | "false" => {
                check_args(name, args, 0, Some(0))?;
                Ok(XPathValue::Boolean(name == "true"))
            }
            "lang" => self.fn_lang(args, focus),

            // Number functions
            "number" => {
                check_args(name, args, 0, Some(1))?;
                let value = match args.first() {
                    Some(arg) => self.number(&self.eval(arg, focus)?),
                    None => parse_number(&self.string_value(focus.node)),
                };
                Ok(XPathValue::Number(value))
            }
            "sum" => {
                check_args(name, args, 1, Some(1))?;
                let nodes = self.node_set(&args[0], focus)?;
                let total = nodes
                    .iter()
                    .map(|&n| parse_number(&self.string_value(n)))
                    .sum();
                Ok(XPathValue::Number(total))
            }
            "floor" | "ceiling" | "round" => {
                check_args(name, args, 1, Some(1))?;
                let n = self.number(&self.eval(&args[0], focus)?);
                Ok(XPathValue::Number(match name {
                    "floor" => n.floor(),
                    "ceiling" => n.ceil(),
                    _ => xpath_round(n),
                }))
            }
            _ => Err(XPathError::UndefinedFunction {
                name: name.to_string(),
            }),
        }
    }

    /// Evaluates an optional string argument, defaulting to the string-value
    /// of the context node.
    fn string_arg(&self, arg: Option<&Expr>, focus: Focus) -> Result<String, XPathError> {
        match arg {
            Some(arg) => Ok(self.string(&self.eval(arg, focus)?)),
            None => Ok(self.string_value(focus.node)),
        }
    }

    /// `local-name()`, `namespace-uri()` and `name()`, which all look at the
    /// first node of their argument.
    fn fn_name(&self, name: &str, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        check_args(name, args, 0, Some(1))?;
        let node = match args.first() {
            Some(arg) => match self.node_set(arg, focus)?.first() {
                Some(&n) => n,
                None => return Ok(XPathValue::String(String::new())),
            },
            None => focus.node,
        };
        let doc = self.doc;
        let value = match &doc.node(node).kind {
            NodeKind::Element { .. } | NodeKind::Attribute { .. } => match name {
                "local-name" => doc.local_name(node).unwrap_or_default().to_string(),
                "namespace-uri" => doc.namespace_uri(node).unwrap_or_default().to_string(),
                _ => doc.node_name(node),
            },
            NodeKind::ProcessingInstruction { target, .. } if name != "namespace-uri" => {
                target.clone()
            }
            _ => String::new(),
        };
        Ok(XPathValue::String(value))
    }

    fn fn_substring(&self, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        check_args("substring", args, 2, Some(3))?;
        let s = self.string(&self.eval(&args[0], focus)?);
        let start = xpath_round(self.number(&self.eval(&args[1], focus)?));
        let end = match args.get(2) {
            Some(len) => start + xpath_round(self.number(&self.eval(len, focus)?)),
            None => f64::INFINITY,
        };
        let result = s
            .chars()
            .enumerate()
            .filter(|&(i, _)| {
                let position = to_f64(i + 1);
                position >= start && position < end
            })
            .map(|(_, c)| c)
            .collect();
        Ok(XPathValue::String(result))
    }

    /// `id()`: elements whose `id` or `xml:id` attribute matches one of the
    /// whitespace-separated tokens of the argument.
    fn fn_id(&self, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        check_args("id", args, 1, Some(1))?;
        let tokens: Vec<String> = match self.eval(&args[0], focus)? {
            XPathValue::NodeSet(nodes) => nodes
                .iter()
                .flat_map(|&n| {
                    self.string_value(n)
                        .split_ascii_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect(),
            other => other
                .to_xpath_string()
                .split_ascii_whitespace()
                .map(str::to_string)
                .collect(),
        };
        let doc = self.doc;
        let root = self.tree_root(focus.node);
        let nodes = iter::once(root)
            .chain(doc.descendants(root))
            .filter(|&n| {
                let id = doc
                    .get_attribute_ns(n, XML_NAMESPACE, "id")
                    .or_else(|| doc.get_attribute(n, "id"));
                id.is_some_and(|id| tokens.iter().any(|t| t == id))
            })
            .collect();
        Ok(XPathValue::NodeSet(nodes))
    }

    /// `lang()`: whether the nearest `xml:lang` matches the argument or is a
    /// sublanguage of it, ignoring case.
    fn fn_lang(&self, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        check_args("lang", args, 1, Some(1))?;
        let wanted = self.string(&self.eval(&args[0], focus)?).to_ascii_lowercase();
        let doc = self.doc;
        let declared = doc.ancestors(focus.node).find_map(|n| {
            doc.get_attribute_ns(n, XML_NAMESPACE, "lang")
                .or_else(|| doc.get_attribute(n, "xml:lang"))
        });
        let matched = declared.is_some_and(|lang| {
            let lang = lang.to_ascii_lowercase();
            lang == wanted
                || lang
                    .strip_prefix(&wanted)
                    .is_some_and(|rest| rest.starts_with('-'))
        });
        Ok(XPathValue::Boolean(matched))
    }
}

/// Equality and relational comparison of two booleans, via numbers for the
/// relational operators.
fn numbers_or_bools(op: BinaryOp, a: bool, b: bool) -> bool {
    let (x, y) = (f64::from(u8::from(a)), f64::from(u8::from(b)));
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Neq => a != b,
        BinaryOp::Lt => x < y,
        BinaryOp::Lte => x <= y,
        BinaryOp::Gt => x > y,
        _ => x >= y,
    }
}

/// Rounds half toward positive infinity, keeping NaN, the infinities and
/// negative zero.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    if (-0.5..0.0).contains(&n) {
        return -0.0;
    }
    (n + 0.5).floor()
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: usize) -> f64 {
    n as f64
}

fn check_args(name: &str, args: &[Expr], min: usize, max: Option<usize>) -> Result<(), XPathError> {
    if args.len() >= min && max.map_or(true, |max| args.len() <= max) {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(XPathError::InvalidArgCount {
        function: name.to_string(),
        expected,
        found: args.len(),
    })
}
