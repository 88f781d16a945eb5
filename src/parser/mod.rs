//! XML 1.0 parser.
//!
//! A hand-rolled recursive descent parser for XML 1.0 (Fifth Edition) with
//! Namespaces in XML 1.0. The parser builds a [`Document`] tree and supports
//! a recovery mode that records diagnostics instead of failing on
//! recoverable errors.
//!
//! Input is held as UTF-8. [`parse_bytes`] decodes other encodings first,
//! using the byte order mark or the encoding named in the XML declaration.

pub(crate) mod input;
mod xml;

use crate::encoding::decode_to_utf8;
use crate::error::ParseError;
use crate::tree::Document;

use input::{
    DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_ATTRIBUTE_LENGTH, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_ENTITY_EXPANSIONS, DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_TEXT_LENGTH,
};

/// Parse options controlling parser behavior and resource limits.
///
/// Use the builder methods to configure options:
///
/// ```
/// use xmldom::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .recover(true)
///     .no_blanks(true)
///     .max_depth(128);
/// assert!(opts.recover);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// If true, attempt to recover from errors and produce a partial tree.
    pub recover: bool,
    /// If true, drop whitespace-only text nodes.
    pub no_blanks: bool,
    /// URI recorded on the parsed document.
    pub base_url: Option<String>,

    // -- Security limits --
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: 256).
    pub max_attributes: u32,
    /// Maximum length in bytes of a single attribute value (default: 10 MB).
    pub max_attribute_length: usize,
    /// Maximum length in bytes of a single text node (default: 10 MB).
    pub max_text_length: usize,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
    /// Maximum number of entity reference expansions per document (default: 10,000).
    pub max_entity_expansions: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recover: false,
            no_blanks: false,
            base_url: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_attribute_length: DEFAULT_MAX_ATTRIBUTE_LENGTH,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
        }
    }
}

impl ParseOptions {
    /// Enables or disables error recovery mode.
    #[must_use]
    pub fn recover(mut self, yes: bool) -> Self {
        self.recover = yes;
        self
    }

    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Sets the URI recorded on the parsed document.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum attribute value length in bytes.
    #[must_use]
    pub fn max_attribute_length(mut self, max: usize) -> Self {
        self.max_attribute_length = max;
        self
    }

    /// Sets the maximum text node length in bytes.
    #[must_use]
    pub fn max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    /// Sets the maximum number of entity reference expansions.
    #[must_use]
    pub fn max_entity_expansions(mut self, max: u32) -> Self {
        self.max_entity_expansions = max;
        self
    }
}

/// Parses an XML string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses an XML string with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML and recovery
/// mode is not enabled, or if a resource limit is exceeded.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    xml::XmlParser::new(input, options).parse()
}

/// Parses raw bytes with default options, detecting the encoding.
///
/// # Errors
///
/// Returns `ParseError` if the bytes cannot be decoded or are not
/// well-formed XML.
///
/// # Examples
///
/// ```
/// use xmldom::parser::parse_bytes;
///
/// let doc = parse_bytes(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>\xE9</a>").unwrap();
/// let root = doc.document_element().unwrap();
/// assert_eq!(doc.text_content(root), "é");
/// assert_eq!(doc.encoding(), Some("ISO-8859-1"));
/// ```
pub fn parse_bytes(input: &[u8]) -> Result<Document, ParseError> {
    parse_bytes_with_options(input, &ParseOptions::default())
}

/// Parses raw bytes with the given options, detecting the encoding.
///
/// # Errors
///
/// Returns `ParseError` if the bytes cannot be decoded or are not
/// well-formed XML.
pub fn parse_bytes_with_options(
    input: &[u8],
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let decoded = decode_to_utf8(input)?;
    let mut doc = parse_str_with_options(&decoded.text, options)?;
    if doc.encoding().is_none() && decoded.encoding != "UTF-8" {
        doc.set_encoding(decoded.encoding);
    }
    Ok(doc)
}
