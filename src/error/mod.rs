//! Error types for document operations and parsing.
//!
//! [`Error`] is returned by every fallible tree operation: node creation,
//! namespace declaration, linking, queries and canonicalization. Parsing keeps
//! its own structured [`ParseError`] with source locations and the
//! diagnostics collected in recovery mode; it converts into [`Error::Parse`].
//!
//! Every mutation validates its inputs before touching the document, so an
//! `Err` always means the tree was left exactly as it was.

use std::fmt;

use crate::encoding::EncodingError;
use crate::xpath::XPathError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the document model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A supplied element or attribute name is not a legal XML name.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which rule the name violates.
        reason: &'static str,
    },

    /// Character data, comment text or PI data that cannot be written as
    /// XML and read back unchanged.
    #[error("invalid {what} content: {reason}")]
    InvalidContent {
        /// The kind of content being set.
        what: &'static str,
        /// Which rule the content violates.
        reason: &'static str,
    },

    /// The operation needs a document element and the document has none.
    #[error("document has no root element")]
    MissingRoot,

    /// A namespace declaration could not be created.
    #[error("failed to create namespace {uri:?} with prefix {prefix:?}: {reason}")]
    NamespaceCreation {
        /// The requested prefix, `None` for the default namespace.
        prefix: Option<String>,
        /// The namespace URI.
        uri: String,
        /// Why the declaration was refused.
        reason: &'static str,
    },

    /// A query needed a starting node and there was none.
    #[error("node not found")]
    NodeNotFound,

    /// XPath compilation or evaluation failed.
    #[error(transparent)]
    XPath(#[from] XPathError),

    /// The node arena cannot hold another entry.
    #[error("failed to allocate {what}")]
    Allocation {
        /// What was being allocated.
        what: &'static str,
    },

    /// The handle refers to a node that no longer exists.
    #[error("stale node handle")]
    StaleNode,

    /// The handle was issued by a different document.
    #[error("node belongs to another document")]
    ForeignNode,

    /// A typed view was requested for a node of another kind.
    #[error("expected {expected} node, found {found}")]
    WrongNodeType {
        /// The kind the caller asked for.
        expected: &'static str,
        /// The kind the node actually has.
        found: &'static str,
    },

    /// The mutation would produce an illegal tree.
    #[error("hierarchy request error: {reason}")]
    HierarchyRequest {
        /// The violated structural rule.
        reason: &'static str,
    },

    /// Input could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    pub(crate) fn invalid_name(name: &str, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason,
        }
    }

    pub(crate) fn invalid_content(what: &'static str, reason: &'static str) -> Self {
        Self::InvalidContent { what, reason }
    }

    pub(crate) fn namespace(prefix: Option<&str>, uri: &str, reason: &'static str) -> Self {
        Self::NamespaceCreation {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
            reason,
        }
    }

    pub(crate) fn hierarchy(reason: &'static str) -> Self {
        Self::HierarchyRequest { reason }
    }
}

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// A non-fatal issue that doesn't prevent parsing.
    Warning,
    /// A recoverable error: the parser continues but the document is malformed.
    Error,
    /// An unrecoverable error.
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal error"),
        }
    }
}

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, counted in characters.
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single diagnostic emitted during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: ErrorSeverity,
    /// Human-readable message.
    pub message: String,
    /// Where in the source this occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.location)
    }
}

/// The error returned when XML parsing fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where the fatal error occurred.
    pub location: SourceLocation,
    /// Diagnostics collected before the fatal error.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<EncodingError> for ParseError {
    fn from(err: EncodingError) -> Self {
        Self {
            message: err.message,
            location: SourceLocation::default(),
            diagnostics: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "unexpected end of input".to_string(),
            location: SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
            diagnostics: vec![],
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_parse_diagnostic_display() {
        let diag = ParseDiagnostic {
            severity: ErrorSeverity::Warning,
            message: "undeclared entity".to_string(),
            location: SourceLocation {
                line: 3,
                column: 10,
                byte_offset: 50,
            },
        };
        assert_eq!(diag.to_string(), "warning: undeclared entity at 3:10");
    }

    #[test]
    fn test_invalid_name_display() {
        let err = Error::invalid_name("1abc", "must not start with a digit");
        assert_eq!(
            err.to_string(),
            "invalid name \"1abc\": must not start with a digit"
        );
    }

    #[test]
    fn test_namespace_error_display() {
        let err = Error::namespace(Some("a"), "urn:x", "prefix already declared");
        assert_eq!(
            err.to_string(),
            "failed to create namespace \"urn:x\" with prefix Some(\"a\"): prefix already declared"
        );
    }

    #[test]
    fn test_parse_error_converts() {
        let err: Error = ParseError {
            message: "boom".to_string(),
            location: SourceLocation::default(),
            diagnostics: vec![],
        }
        .into();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "parse error at 0:0: boom");
    }

    #[test]
    fn test_xpath_error_converts() {
        let err: Error = XPathError::InvalidExpression {
            message: "unexpected token".to_string(),
        }
        .into();
        assert!(matches!(err, Error::XPath(_)));
    }
}
