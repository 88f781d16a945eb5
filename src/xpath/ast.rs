//! Syntax tree for compiled `XPath` 1.0 expressions.

use std::fmt;

/// A compiled `XPath` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal such as `3.5`.
    Number(f64),
    /// A string literal such as `'abc'`.
    Literal(String),
    /// A variable reference `$name`, stored without the `$`.
    Variable(String),
    /// A binary operator application.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Unary minus.
    Negate(Box<Expr>),
    /// A function call.
    Call { name: String, args: Vec<Expr> },
    /// A location path, relative or absolute.
    Path(LocationPath),
    /// A primary expression filtered by predicates, e.g. `$nodes[1]`.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
    },
    /// A filter expression continued by a relative path, e.g. `(a|b)/c`.
    PathFrom { start: Box<Expr>, steps: Vec<Step> },
    /// The union `lhs | rhs` of two node-sets.
    Union(Box<Expr>, Box<Expr>),
}

/// A sequence of steps, optionally anchored at the root of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

/// A binary operator, in the order of increasing precedence groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One location step: `axis::node-test[predicate]...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// The step `descendant-or-self::node()` that `//` abbreviates.
    #[must_use]
    pub fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// The thirteen `XPath` 1.0 axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
}

impl Axis {
    const ALL: [Self; 13] = [
        Self::Ancestor,
        Self::AncestorOrSelf,
        Self::Attribute,
        Self::Child,
        Self::Descendant,
        Self::DescendantOrSelf,
        Self::Following,
        Self::FollowingSibling,
        Self::Namespace,
        Self::Parent,
        Self::Preceding,
        Self::PrecedingSibling,
        Self::SelfAxis,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ancestor => "ancestor",
            Self::AncestorOrSelf => "ancestor-or-self",
            Self::Attribute => "attribute",
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::DescendantOrSelf => "descendant-or-self",
            Self::Following => "following",
            Self::FollowingSibling => "following-sibling",
            Self::Namespace => "namespace",
            Self::Parent => "parent",
            Self::Preceding => "preceding",
            Self::PrecedingSibling => "preceding-sibling",
            Self::SelfAxis => "self",
        }
    }

    /// Looks up an axis by its name in an expression.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.as_str() == name)
    }

    /// Reverse axes number their proximity positions backwards from the
    /// context node.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Ancestor
                | Self::AncestorOrSelf
                | Self::Preceding
                | Self::PrecedingSibling
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node test of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    AnyName,
    /// `prefix:*`
    AnyLocalName(String),
    /// `name` or `prefix:name`.
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// `node()`
    Node,
    /// `text()`, which also matches CDATA sections.
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()` with an optional target literal.
    ProcessingInstruction(Option<String>),
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyName => f.write_str("*"),
            Self::AnyLocalName(prefix) => write!(f, "{prefix}:*"),
            Self::Name {
                prefix: Some(prefix),
                local,
            } => write!(f, "{prefix}:{local}"),
            Self::Name { prefix: None, local } => f.write_str(local),
            Self::Node => f.write_str("node()"),
            Self::Text => f.write_str("text()"),
            Self::Comment => f.write_str("comment()"),
            Self::ProcessingInstruction(None) => f.write_str("processing-instruction()"),
            Self::ProcessingInstruction(Some(target)) => {
                write!(f, "processing-instruction('{target}')")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_axis_names_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_name(axis.as_str()), Some(axis));
        }
        assert_eq!(Axis::from_name("children"), None);
    }

    #[test]
    fn test_reverse_axes() {
        assert!(Axis::Ancestor.is_reverse());
        assert!(Axis::PrecedingSibling.is_reverse());
        assert!(!Axis::Following.is_reverse());
        assert!(!Axis::Child.is_reverse());
    }

    #[test]
    fn test_node_test_display() {
        let qualified = NodeTest::Name {
            prefix: Some("svg".to_string()),
            local: "rect".to_string(),
        };
        assert_eq!(qualified.to_string(), "svg:rect");
        assert_eq!(NodeTest::AnyLocalName("svg".to_string()).to_string(), "svg:*");
        assert_eq!(
            NodeTest::ProcessingInstruction(Some("php".to_string())).to_string(),
            "processing-instruction('php')"
        );
    }
}
