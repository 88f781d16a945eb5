//! `XPath` 1.0 value types and errors.
//!
//! The four data types of <https://www.w3.org/TR/xpath-10/#section-Data-Model>
//! plus the conversions of sections 4.2 to 4.4 that do not need the
//! document. Conversions of node-sets go through the evaluator, which can
//! compute string-values.

use std::fmt;

use crate::tree::NodeId;

/// An `XPath` 1.0 value.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue {
    Boolean(bool),
    /// An IEEE 754 double, including NaN and the infinities.
    Number(f64),
    String(String),
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<NodeId>),
}

impl XPathValue {
    /// Converts to a boolean per `XPath` 1.0 section 4.3.
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// Converts a non-node-set value to a number per `XPath` 1.0 section
    /// 4.4. Node-sets yield NaN here; the evaluator converts them through
    /// the string-value of their first node.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Boolean(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => parse_number(s),
            Self::NodeSet(_) => f64::NAN,
        }
    }

    /// Converts a non-node-set value to a string per `XPath` 1.0 section
    /// 4.2. Node-sets yield the empty string here.
    #[must_use]
    pub fn to_xpath_string(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::NodeSet(_) => String::new(),
        }
    }

    /// Returns the nodes of a node-set value.
    #[must_use]
    pub fn as_node_set(&self) -> Option<&[NodeId]> {
        match self {
            Self::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// The `XPath` name of the value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NodeSet(_) => "node-set",
        }
    }
}

impl fmt::Display for XPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeSet(nodes) => write!(f, "node-set({})", nodes.len()),
            other => f.write_str(&other.to_xpath_string()),
        }
    }
}

/// Formats a number the way `string()` does.
///
/// NaN, `Infinity` and `-Infinity` are spelled out, negative zero prints as
/// `0`, and integral values print without a decimal point.
///
/// # Examples
///
/// ```
/// use xmldom::xpath::types::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(0.25), "0.25");
/// assert_eq!(format_number(f64::NAN), "NaN");
/// ```
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    #[allow(clippy::cast_possible_truncation)]
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return (n as i64).to_string();
    }
    n.to_string()
}

/// Parses a string per the `number()` conversion: optional whitespace, an
/// optional minus sign, digits with an optional decimal point, optional
/// whitespace. Anything else is NaN.
#[must_use]
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches([' ', '\t', '\r', '\n']);
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut parts = unsigned.splitn(2, '.');
    let integer = parts.next().unwrap_or_default();
    let fraction = parts.next();
    let digits_ok = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    let well_formed = digits_ok(integer)
        && fraction.map_or(true, digits_ok)
        && (!integer.is_empty() || fraction.is_some_and(|f| !f.is_empty()));
    if !well_formed {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// An error raised while compiling or evaluating an `XPath` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathError {
    /// The expression could not be tokenized or parsed.
    InvalidExpression {
        /// What went wrong and where.
        message: String,
    },

    /// An operand had the wrong type, e.g. a path step applied to a number.
    TypeError {
        expected: String,
        found: String,
    },

    /// A `$name` reference with no binding in the context.
    UndefinedVariable { name: String },

    /// A call to a function outside the core library.
    UndefinedFunction { name: String },

    /// A core function called with the wrong number of arguments.
    InvalidArgCount {
        function: String,
        expected: String,
        found: usize,
    },

    /// A name test or function used a prefix with no namespace binding.
    UnboundPrefix { prefix: String },
}

impl XPathError {
    pub(crate) fn type_error(expected: &str, found: &XPathValue) -> Self {
        Self::TypeError {
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }
}

impl fmt::Display for XPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidExpression { message } => {
                write!(f, "invalid XPath expression: {message}")
            }
            Self::TypeError { expected, found } => {
                write!(f, "type error: expected {expected}, found {found}")
            }
            Self::UndefinedVariable { name } => write!(f, "undefined variable: ${name}"),
            Self::UndefinedFunction { name } => write!(f, "undefined function: {name}()"),
            Self::InvalidArgCount {
                function,
                expected,
                found,
            } => write!(
                f,
                "invalid argument count for {function}(): expected {expected}, found {found}"
            ),
            Self::UnboundPrefix { prefix } => {
                write!(f, "namespace prefix '{prefix}' is not bound")
            }
        }
    }
}

impl std::error::Error for XPathError {}
