//! Low-level input handling for the XML parser.
//!
//! [`ParserInput`] owns the cursor over the source text, position tracking
//! (line, column, byte offset) and the primitives shared by every
//! production: peeking, advancing, name parsing and reference resolution.
//!
//! # Security
//!
//! `ParserInput` tracks nesting depth and entity expansion count to guard
//! against denial-of-service input:
//!
//! - **Depth limit**: prevents stack overflow from deeply nested elements.
//! - **Entity expansion limit**: bounds the total number of references
//!   expanded, including references nested in internal entity values.
//! - **Name length limit**: prevents memory exhaustion from huge names.
//!
//! No external entity loading is performed.

use std::collections::HashMap;

use crate::error::{ErrorSeverity, ParseDiagnostic, ParseError, SourceLocation};
use crate::util::qname::{is_name_char, is_name_start_char, is_xml_char};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum number of attributes on a single element.
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Default maximum attribute value length in bytes.
pub(crate) const DEFAULT_MAX_ATTRIBUTE_LENGTH: usize = 10 * 1024 * 1024;

/// Default maximum text node length in bytes.
pub(crate) const DEFAULT_MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024;

/// Default maximum name length in bytes.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum number of entity reference expansions per document.
pub(crate) const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 10_000;

/// Entity values may reference other entities this deep.
const MAX_ENTITY_NESTING: u32 = 16;

/// Cursor over the source text plus the parse-wide limits and diagnostics.
pub(crate) struct ParserInput<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
    entity_expansions: u32,
    max_entity_expansions: u32,
    recover: bool,
    /// Warnings and recovered errors, moved onto the document at the end.
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
    /// Internal general entities declared in the DOCTYPE internal subset.
    pub(crate) entity_map: HashMap<String, String>,
}

impl<'a> ParserInput<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            entity_expansions: 0,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
            recover: false,
            diagnostics: Vec::new(),
            entity_map: HashMap::new(),
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    pub fn set_max_entity_expansions(&mut self, max: u32) {
        self.max_entity_expansions = max;
    }

    pub fn set_recover(&mut self, recover: bool) {
        self.recover = recover;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the source text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    // -- Peek operations --

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    // -- Advance operations --

    /// Advances the position by `count` bytes, updating line/column.
    ///
    /// Callers only skip over ASCII they have already matched, so the
    /// position stays on a character boundary.
    pub fn advance(&mut self, count: usize) {
        let bytes = self.input.as_bytes();
        for _ in 0..count {
            if let Some(&b) = bytes.get(self.pos) {
                if b == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        let b = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance(1);
        Ok(b)
    }

    /// Consumes the next character with line-end normalization (XML 1.0
    /// §2.11) and `Char` validation (XML 1.0 §2.2).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        if !is_xml_char(ch) {
            self.recoverable(format!("invalid XML character: U+{:04X}", ch as u32))?;
        }
        Ok(ch)
    }

    // -- Expect operations --

    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        let b = self.next_byte()?;
        if b != expected {
            return Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            )));
        }
        Ok(())
    }

    pub fn expect_str(&mut self, expected: &str) -> Result<(), ParseError> {
        if !self.looking_at(expected) {
            return Err(self.fatal(format!("expected '{expected}'")));
        }
        self.advance(expected.len());
        Ok(())
    }

    pub fn looking_at(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.advance(1);
        }
        self.pos > start
    }

    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if !self.skip_whitespace() {
            return Err(self.fatal("whitespace required"));
        }
        Ok(())
    }

    /// Consumes ASCII bytes while `pred` holds and returns them.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii() && pred(b)) {
            self.advance(1);
        }
        &self.input[start..self.pos]
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses an XML `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);
        while let Some(ch) = self.peek_char().filter(|&c| is_name_char(c)) {
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    // -- Reference parsing (XML 1.0 §4.1) --

    /// Parses an entity or character reference (`&...;`) and returns its
    /// replacement text.
    ///
    /// Handles the five predefined entities, decimal and hexadecimal
    /// character references, and internal entities declared in the DOCTYPE.
    pub fn parse_reference(&mut self) -> Result<String, ParseError> {
        self.count_expansion()?;
        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let (digits, radix) = if self.peek() == Some(b'x') {
                self.advance(1);
                (self.take_while(|b| b.is_ascii_hexdigit()), 16)
            } else {
                (self.take_while(|b| b.is_ascii_digit()), 10)
            };
            self.expect_byte(b';')?;
            let ch = self.char_reference(digits, radix)?;
            return Ok(ch.to_string());
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;
        self.resolve_entity(&name, 0)
    }

    fn count_expansion(&mut self) -> Result<(), ParseError> {
        self.entity_expansions += 1;
        if self.entity_expansions > self.max_entity_expansions {
            return Err(self.fatal(format!(
                "entity expansion limit exceeded ({})",
                self.max_entity_expansions
            )));
        }
        Ok(())
    }

    fn char_reference(&self, digits: &str, radix: u32) -> Result<char, ParseError> {
        if digits.is_empty() {
            return Err(self.fatal("empty character reference"));
        }
        let value = u32::from_str_radix(digits, radix)
            .map_err(|_| self.fatal("invalid character reference"))?;
        char::from_u32(value).filter(|&c| is_xml_char(c)).ok_or_else(|| {
            self.fatal(format!(
                "character reference &#x{value:X}; does not refer to a valid XML character"
            ))
        })
    }

    fn resolve_entity(&mut self, name: &str, nesting: u32) -> Result<String, ParseError> {
        let builtin = match name {
            "amp" => Some("&"),
            "lt" => Some("<"),
            "gt" => Some(">"),
            "apos" => Some("'"),
            "quot" => Some("\""),
            _ => None,
        };
        if let Some(text) = builtin {
            return Ok(text.to_string());
        }
        match self.entity_map.get(name).cloned() {
            Some(value) => self.expand_entity_text(&value, nesting + 1),
            None => {
                self.recoverable(format!("unknown entity reference: &{name};"))?;
                Ok(String::new())
            }
        }
    }

    /// Expands references inside an entity's replacement text (XML 1.0 §4.4).
    fn expand_entity_text(&mut self, text: &str, nesting: u32) -> Result<String, ParseError> {
        if nesting > MAX_ENTITY_NESTING {
            return Err(self.fatal("entity references nest too deeply"));
        }
        if !text.contains('&') {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(amp) = rest.find('&') {
            result.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let semi = after
                .find(';')
                .ok_or_else(|| self.fatal("unterminated reference in entity value"))?;
            let reference = &after[..semi];
            self.count_expansion()?;
            if let Some(num) = reference.strip_prefix('#') {
                let ch = match num.strip_prefix('x') {
                    Some(hex) => self.char_reference(hex, 16)?,
                    None => self.char_reference(num, 10)?,
                };
                result.push(ch);
            } else {
                result.push_str(&self.resolve_entity(reference, nesting)?);
            }
            rest = &after[semi + 1..];
        }
        result.push_str(rest);
        Ok(result)
    }

    // -- Attribute value parsing (XML 1.0 §3.3.3) --

    /// Parses a quoted attribute value with reference resolution and
    /// whitespace normalization.
    pub fn parse_attribute_value(&mut self, max_length: usize) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("attribute value must be quoted"));
        }

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    break;
                }
                Some(b'&') => {
                    let builtin_lt = self.looking_at("&lt;") || self.looking_at("&#");
                    let resolved = self.parse_reference()?;
                    if !builtin_lt && resolved.contains('<') {
                        return Err(self
                            .fatal("'<' not allowed in attribute values (from entity expansion)"));
                    }
                    value.push_str(&resolved);
                }
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(_) => match self.next_char()? {
                    '\n' | '\t' => value.push(' '),
                    ch => value.push(ch),
                },
            }
            if value.len() > max_length {
                return Err(self.fatal(format!(
                    "attribute value length exceeds maximum ({max_length})"
                )));
            }
        }
        Ok(value)
    }

    /// Parses a quoted literal without reference resolution.
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted value"));
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| b != quote) {
            let Some(ch) = self.peek_char() else { break };
            self.advance_char(ch);
        }
        let value = self.input[start..self.pos].to_string();
        self.expect_byte(quote)?;
        Ok(value)
    }

    // -- Error helpers --

    /// Creates a fatal `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    pub fn push_diagnostic(&mut self, severity: ErrorSeverity, message: String) {
        self.diagnostics.push(ParseDiagnostic {
            severity,
            message,
            location: self.location(),
        });
    }

    /// Records an error diagnostic in recovery mode; fails otherwise.
    pub fn recoverable(&mut self, message: String) -> Result<(), ParseError> {
        if self.recover {
            self.push_diagnostic(ErrorSeverity::Error, message);
            Ok(())
        } else {
            Err(self.fatal(message))
        }
    }
}

// -------------------------------------------------------------------------
// Common XML parsing helpers
// -------------------------------------------------------------------------

/// Parses a comment (`<!-- ... -->`), returning its content.
///
/// See XML 1.0 §2.5 production `[15]`.
pub(crate) fn parse_comment_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str("<!--")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in comment"));
        }
        if input.looking_at("-->") {
            input.advance(3);
            return Ok(content);
        }
        if input.looking_at("--") {
            input.recoverable("'--' not allowed inside comments".to_string())?;
            content.push_str("--");
            input.advance(2);
        } else {
            content.push(input.next_char()?);
        }
    }
}

/// Parses a CDATA section (`<![CDATA[ ... ]]>`), returning its content.
///
/// See XML 1.0 §2.7 production `[18]`.
pub(crate) fn parse_cdata_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str("<![CDATA[")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in CDATA section"));
        }
        if input.looking_at("]]>") {
            input.advance(3);
            return Ok(content);
        }
        content.push(input.next_char()?);
    }
}

/// Parses a processing instruction (`<?target data?>`), returning
/// `(target, data)`.
///
/// See XML 1.0 §2.6 production `[16]`.
pub(crate) fn parse_pi_content(
    input: &mut ParserInput<'_>,
) -> Result<(String, Option<String>), ParseError> {
    input.expect_str("<?")?;
    let target = input.parse_name()?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("PI target 'xml' is reserved"));
    }
    if target.contains(':') {
        return Err(input.fatal("PI target must not contain a colon"));
    }

    if !input.skip_whitespace() {
        input.expect_str("?>")?;
        return Ok((target, None));
    }
    let mut data = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in processing instruction"));
        }
        if input.looking_at("?>") {
            input.advance(2);
            break;
        }
        data.push(input.next_char()?);
    }
    Ok((target, (!data.is_empty()).then_some(data)))
}

/// The pseudo-attributes of an XML declaration.
#[derive(Debug, Clone)]
pub(crate) struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// Parses an XML declaration (`<?xml version="1.0" ...?>`).
///
/// See XML 1.0 §2.8 production `[23]`.
pub(crate) fn parse_xml_decl(input: &mut ParserInput<'_>) -> Result<XmlDeclaration, ParseError> {
    input.expect_str("<?xml")?;
    input.skip_whitespace_required()?;

    input.expect_str("version")?;
    let version = parse_pseudo_attribute_value(input)?;
    if !is_valid_version_num(&version) {
        return Err(input.fatal(format!("invalid version number: '{version}'")));
    }

    let mut had_ws = input.skip_whitespace();
    let encoding = if input.looking_at("encoding") {
        if !had_ws {
            return Err(input.fatal("whitespace required before encoding"));
        }
        input.expect_str("encoding")?;
        let enc = parse_pseudo_attribute_value(input)?;
        if !is_valid_encoding_name(&enc) {
            return Err(input.fatal(format!("invalid encoding name: '{enc}'")));
        }
        had_ws = input.skip_whitespace();
        Some(enc)
    } else {
        None
    };

    let standalone = if input.looking_at("standalone") {
        if !had_ws {
            return Err(input.fatal("whitespace required before standalone"));
        }
        input.expect_str("standalone")?;
        let value = parse_pseudo_attribute_value(input)?;
        input.skip_whitespace();
        match value.as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => return Err(input.fatal("standalone must be 'yes' or 'no'")),
        }
    } else {
        None
    };

    input.expect_str("?>")?;
    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

fn parse_pseudo_attribute_value(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.skip_whitespace();
    input.expect_byte(b'=')?;
    input.skip_whitespace();
    input.parse_quoted_value()
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_valid_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_valid_encoding_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
